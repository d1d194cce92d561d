use axum::extract::FromRef;
use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    api::required,
    auth::{
        dto::{ProfileChanges, RegisterForm},
        jwt::JwtKeys,
        otp::{check_otp, generate_otp, OTP_TTL_MINUTES},
        password::{hash_password, verify_password},
        repo_types::{NewUser, Role, UniqueField, User},
        validation::{
            check_password, normalize_aadhaar, normalize_email, normalize_fullname,
            normalize_pan, normalize_phone, split_list,
        },
    },
    db::StoreError,
    error::{
        AppResult, AuthorizationError, ConflictError, InternalError, NotFoundError,
        ValidationError,
    },
    mail,
    state::AppState,
    uploads::{check_upload, discard_upload, put_upload, store_upload, upload_key, UploadKind},
};

#[derive(Debug)]
pub struct Registered {
    pub user: User,
    pub email_sent: bool,
}

/// Creates an unverified account and emails its OTP. A failed send does
/// not undo the account; it is reported through `email_sent`.
#[instrument(skip(st, form))]
pub async fn register(st: &AppState, form: RegisterForm) -> AppResult<Registered> {
    let fullname = required(form.fullname.as_deref(), "fullname")?;
    let email = required(form.email.as_deref(), "email")?;
    let phone = required(form.phone_number.as_deref(), "phoneNumber")?;
    let password = form
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or(ValidationError::MissingField("password"))?;
    let pan = required(form.pan_card.as_deref(), "pancard")?;
    let aadhaar = required(form.aadhaar_card.as_deref(), "adharcard")?;
    let role = required(form.role.as_deref(), "role")?;

    let fullname = normalize_fullname(fullname)?;
    let email = normalize_email(email)?;
    let phone_number = normalize_phone(phone)?;
    let pan_card = normalize_pan(pan)?;
    let aadhaar_card = normalize_aadhaar(aadhaar)?;
    check_password(password)?;
    let role: Role = role.parse().map_err(|_| ValidationError::InvalidRole)?;

    for field in UniqueField::ALL {
        let value = match field {
            UniqueField::Email => &email,
            UniqueField::PanCard => &pan_card,
            UniqueField::AadhaarCard => &aadhaar_card,
            UniqueField::PhoneNumber => &phone_number,
        };
        if st.users.exists_with(field, value).await? {
            warn!(field = field.column(), "registration collides with existing user");
            return Err(ConflictError::DuplicateField(field.label()).into());
        }
    }

    let photo = form
        .profile_photo
        .ok_or(ValidationError::MissingFile("Profile image"))?;
    check_upload(UploadKind::ProfilePhoto, &photo)?;

    let password_hash = hash_password(password).await?;
    // the photo is keyed by a fresh id since the user row does not exist yet
    let photo_key = upload_key(Uuid::new_v4(), UploadKind::ProfilePhoto, &photo);
    let profile_photo = put_upload(st, &photo_key, photo).await?;
    let otp = generate_otp(OffsetDateTime::now_utc());

    let new_user = NewUser {
        fullname,
        email,
        phone_number,
        password_hash,
        pan_card,
        aadhaar_card,
        role,
        profile_photo,
        otp: otp.clone(),
    };
    let user = match st.users.insert(new_user).await {
        Ok(u) => u,
        Err(StoreError::Conflict(constraint)) => {
            let label = UniqueField::from_constraint(&constraint)
                .map(UniqueField::label)
                .unwrap_or("Account");
            warn!(%constraint, "registration lost a uniqueness race");
            discard_upload(st, &photo_key).await;
            return Err(ConflictError::DuplicateField(label).into());
        }
        Err(e) => {
            discard_upload(st, &photo_key).await;
            return Err(e.into());
        }
    };
    info!(user_id = %user.id, role = %user.role, "user registered");

    let email_sent = match st
        .mailer
        .send_html(
            &user.email,
            mail::OTP_SUBJECT,
            &mail::otp_email(&user.fullname, &otp.code, OTP_TTL_MINUTES),
        )
        .await
    {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, user_id = %user.id, "failed to send OTP email after registration");
            false
        }
    };

    Ok(Registered { user, email_sent })
}

#[instrument(skip(st, otp))]
pub async fn verify_email(st: &AppState, email: Option<&str>, otp: Option<&str>) -> AppResult<()> {
    let email = normalize_email_lookup(required(email, "email")?);
    let otp = required(otp, "otp")?;

    let user = st
        .users
        .find_by_email(&email)
        .await?
        .ok_or(NotFoundError::User)?;
    if user.is_email_verified {
        return Err(ConflictError::AlreadyVerified.into());
    }
    if let Err(e) = check_otp(user.email_verification.as_ref(), otp, OffsetDateTime::now_utc()) {
        warn!(user_id = %user.id, reason = %e, "email verification rejected");
        return Err(e.into());
    }

    st.users.mark_email_verified(user.id).await?;
    info!(user_id = %user.id, "email verified");

    if let Err(e) = st
        .mailer
        .send_html(&user.email, mail::WELCOME_SUBJECT, &mail::welcome_email(&user.fullname))
        .await
    {
        warn!(error = %e, user_id = %user.id, "welcome email not sent");
    }
    Ok(())
}

/// Replaces any pending code. Unlike registration, a failed send is an error.
#[instrument(skip(st))]
pub async fn resend_otp(st: &AppState, email: Option<&str>) -> AppResult<()> {
    let email = normalize_email_lookup(required(email, "email")?);
    let user = st
        .users
        .find_by_email(&email)
        .await?
        .ok_or(NotFoundError::User)?;
    if user.is_email_verified {
        return Err(ConflictError::AlreadyVerified.into());
    }

    let otp = generate_otp(OffsetDateTime::now_utc());
    st.users.set_otp(user.id, &otp).await?;

    st.mailer
        .send_html(
            &user.email,
            mail::OTP_SUBJECT,
            &mail::otp_email(&user.fullname, &otp.code, OTP_TTL_MINUTES),
        )
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %user.id, "failed to resend OTP email");
            InternalError::EmailDeliveryFailed
        })?;
    info!(user_id = %user.id, "verification code reissued");
    Ok(())
}

/// Unknown email and wrong password produce the same error.
#[instrument(skip(st, password))]
pub async fn login(
    st: &AppState,
    email: Option<&str>,
    password: Option<&str>,
    role: Option<&str>,
) -> AppResult<(User, String)> {
    let email = normalize_email_lookup(required(email, "email")?);
    let password = password
        .filter(|p| !p.is_empty())
        .ok_or(ValidationError::MissingField("password"))?;
    let role = required(role, "role")?;

    let Some(user) = st.users.find_by_email(&email).await? else {
        warn!("login for unknown email");
        return Err(NotFoundError::Credentials.into());
    };
    if !verify_password(password, &user.password_hash).await? {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(NotFoundError::Credentials.into());
    }
    if role.parse::<Role>().ok() != Some(user.role) {
        warn!(user_id = %user.id, "login role mismatch");
        return Err(AuthorizationError::RoleMismatch.into());
    }
    if !user.is_email_verified {
        warn!(user_id = %user.id, "login before email verification");
        return Err(AuthorizationError::EmailNotVerified.into());
    }

    let token = JwtKeys::from_ref(st).sign(user.id, user.role)?;
    info!(user_id = %user.id, role = %user.role, "user logged in");
    Ok((user, token))
}

pub async fn get_me(st: &AppState, user_id: Uuid) -> AppResult<User> {
    Ok(st.users.find_by_id(user_id).await?.ok_or(NotFoundError::User)?)
}

#[instrument(skip(st, changes))]
pub async fn update_profile(st: &AppState, user_id: Uuid, changes: ProfileChanges) -> AppResult<User> {
    let user = st
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(NotFoundError::User)?;
    let mut profile = user.profile.clone();

    if let Some(photo) = &changes.profile_photo {
        check_upload(UploadKind::ProfilePhoto, photo)?;
    }
    if let Some(resume) = changes.resume {
        if user.role == Role::Student {
            let original_name = resume.file_name.clone();
            profile.resume = Some(store_upload(st, user.id, UploadKind::Resume, resume).await?);
            profile.resume_original_name = original_name;
        } else {
            debug!(user_id = %user.id, "ignoring resume upload from non-student");
        }
    }
    if let Some(photo) = changes.profile_photo {
        profile.profile_photo = store_upload(st, user.id, UploadKind::ProfilePhoto, photo).await?;
    }
    if let Some(bio) = changes.bio {
        profile.bio = Some(bio.trim().to_string());
    }
    if let Some(skills) = changes.skills {
        profile.skills = split_list(&skills);
    }

    let updated = st
        .users
        .update_profile(user.id, &profile)
        .await?
        .ok_or(NotFoundError::User)?;
    info!(user_id = %user.id, "profile updated");
    Ok(updated)
}

fn normalize_email_lookup(raw: &str) -> String {
    raw.trim().to_lowercase()
}
