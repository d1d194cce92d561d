//! In-memory collaborators and fixtures for service tests.

use std::{
    collections::BTreeSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    applications::repo::{Application, ApplicationRepo, ApplicationStatus},
    auth::{
        dto::RegisterForm,
        jwt::AuthUser,
        repo::UserRepo,
        repo_types::{NewUser, OtpCode, Profile, Role, UniqueField, User},
        services as auth_services,
    },
    companies::{
        repo::{Company, CompanyRepo},
        services as company_services,
    },
    db::{StoreError, StoreResult},
    jobs::{
        dto::JobInput,
        repo::{Job, JobDraft, JobRepo},
        services as job_services,
    },
    mail::{MailError, Mailer},
    state::AppState,
    storage::StorageClient,
    uploads::UploadItem,
};

pub const PASSWORD: &str = "secret123";

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    companies: Vec<Company>,
    jobs: Vec<Job>,
    applications: Vec<Application>,
}

/// Implements every repository over plain vectors, enforcing the same
/// unique keys as the Postgres schema.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Newest first; ties keep the later insert first.
fn newest_first<T: Clone>(items: impl DoubleEndedIterator<Item = T>, at: fn(&T) -> OffsetDateTime) -> Vec<T> {
    let mut out: Vec<T> = items.rev().collect();
    out.sort_by(|a, b| at(b).cmp(&at(a)));
    out
}

fn unique_value(user: &User, field: UniqueField) -> &str {
    match field {
        UniqueField::Email => &user.email,
        UniqueField::PanCard => &user.pan_card,
        UniqueField::AadhaarCard => &user.aadhaar_card,
        UniqueField::PhoneNumber => &user.phone_number,
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn exists_with(&self, field: UniqueField, value: &str) -> StoreResult<bool> {
        Ok(self.lock().users.iter().any(|u| unique_value(u, field) == value))
    }

    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        let now = OffsetDateTime::now_utc();
        let record = User {
            id: Uuid::new_v4(),
            fullname: user.fullname,
            email: user.email,
            phone_number: user.phone_number,
            password_hash: user.password_hash,
            pan_card: user.pan_card,
            aadhaar_card: user.aadhaar_card,
            role: user.role,
            profile: Profile {
                profile_photo: user.profile_photo,
                ..Default::default()
            },
            is_email_verified: false,
            email_verification: Some(user.otp),
            created_at: now,
            updated_at: now,
        };
        let mut t = self.lock();
        for field in UniqueField::ALL {
            if t.users.iter().any(|u| unique_value(u, field) == unique_value(&record, field)) {
                return Err(StoreError::Conflict(format!("users_{}_key", field.column())));
            }
        }
        t.users.push(record.clone());
        Ok(record)
    }

    async fn set_otp(&self, id: Uuid, otp: &OtpCode) -> StoreResult<()> {
        if let Some(u) = self.lock().users.iter_mut().find(|u| u.id == id) {
            u.email_verification = Some(otp.clone());
            u.updated_at = OffsetDateTime::now_utc();
        }
        Ok(())
    }

    async fn mark_email_verified(&self, id: Uuid) -> StoreResult<()> {
        if let Some(u) = self.lock().users.iter_mut().find(|u| u.id == id) {
            u.is_email_verified = true;
            u.email_verification = None;
            u.updated_at = OffsetDateTime::now_utc();
        }
        Ok(())
    }

    async fn update_profile(&self, id: Uuid, profile: &Profile) -> StoreResult<Option<User>> {
        let mut t = self.lock();
        let Some(u) = t.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        u.profile = profile.clone();
        u.updated_at = OffsetDateTime::now_utc();
        Ok(Some(u.clone()))
    }
}

fn name_clash(t: &Tables, name: &str, except: Option<Uuid>) -> bool {
    let lower = name.to_lowercase();
    t.companies
        .iter()
        .any(|c| Some(c.id) != except && c.name.to_lowercase() == lower)
}

#[async_trait]
impl CompanyRepo for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Company>> {
        Ok(self.lock().companies.iter().find(|c| c.id == id).cloned())
    }

    async fn name_taken(&self, name: &str, except: Option<Uuid>) -> StoreResult<bool> {
        Ok(name_clash(&self.lock(), name, except))
    }

    async fn count_owned_by(&self, user_id: Uuid) -> StoreResult<i64> {
        Ok(self.lock().companies.iter().filter(|c| c.user_id == user_id).count() as i64)
    }

    async fn list_all(&self) -> StoreResult<Vec<Company>> {
        let t = self.lock();
        Ok(newest_first(t.companies.iter().cloned(), |c| c.created_at))
    }

    async fn insert(&self, name: &str, user_id: Uuid) -> StoreResult<Company> {
        let mut t = self.lock();
        if name_clash(&t, name, None) {
            return Err(StoreError::Conflict("companies_name_lower_key".into()));
        }
        let now = OffsetDateTime::now_utc();
        let company = Company {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            website: None,
            location: None,
            logo: None,
            user_id,
            created_at: now,
            updated_at: now,
        };
        t.companies.push(company.clone());
        Ok(company)
    }

    async fn update(&self, company: &Company) -> StoreResult<Option<Company>> {
        let mut t = self.lock();
        if name_clash(&t, &company.name, Some(company.id)) {
            return Err(StoreError::Conflict("companies_name_lower_key".into()));
        }
        let Some(stored) = t.companies.iter_mut().find(|c| c.id == company.id) else {
            return Ok(None);
        };
        *stored = Company {
            user_id: stored.user_id,
            created_at: stored.created_at,
            updated_at: OffsetDateTime::now_utc(),
            ..company.clone()
        };
        Ok(Some(stored.clone()))
    }
}

fn apply_draft(job: &mut Job, draft: &JobDraft) {
    job.title = draft.title.clone();
    job.description = draft.description.clone();
    job.requirements = draft.requirements.clone();
    job.salary = draft.salary.clone();
    job.experience_level = draft.experience_level;
    job.location = draft.location.clone();
    job.job_type = draft.job_type.clone();
    job.position = draft.position;
    job.company_id = draft.company_id;
}

#[async_trait]
impl JobRepo for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Job>> {
        Ok(self.lock().jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn list_all(&self) -> StoreResult<Vec<Job>> {
        let t = self.lock();
        Ok(newest_first(t.jobs.iter().cloned(), |j| j.created_at))
    }

    async fn list_by_creator(&self, user_id: Uuid) -> StoreResult<Vec<Job>> {
        let t = self.lock();
        let own: Vec<Job> = t.jobs.iter().filter(|j| j.created_by == user_id).cloned().collect();
        Ok(newest_first(own.into_iter(), |j| j.created_at))
    }

    async fn insert(&self, draft: &JobDraft, created_by: Uuid) -> StoreResult<Job> {
        let now = OffsetDateTime::now_utc();
        let mut job = Job {
            id: Uuid::new_v4(),
            title: String::new(),
            description: String::new(),
            requirements: Vec::new(),
            salary: String::new(),
            experience_level: 0,
            location: String::new(),
            job_type: String::new(),
            position: 0,
            company_id: draft.company_id,
            created_by,
            created_at: now,
            updated_at: now,
        };
        apply_draft(&mut job, draft);
        self.lock().jobs.push(job.clone());
        Ok(job)
    }

    async fn update(&self, id: Uuid, draft: &JobDraft) -> StoreResult<Option<Job>> {
        let mut t = self.lock();
        let Some(job) = t.jobs.iter_mut().find(|j| j.id == id) else {
            return Ok(None);
        };
        apply_draft(job, draft);
        job.updated_at = OffsetDateTime::now_utc();
        Ok(Some(job.clone()))
    }
}

#[async_trait]
impl ApplicationRepo for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Application>> {
        Ok(self.lock().applications.iter().find(|a| a.id == id).cloned())
    }

    async fn find_for(&self, job_id: Uuid, applicant_id: Uuid) -> StoreResult<Option<Application>> {
        Ok(self
            .lock()
            .applications
            .iter()
            .find(|a| a.job_id == job_id && a.applicant_id == applicant_id)
            .cloned())
    }

    async fn insert(&self, job_id: Uuid, applicant_id: Uuid) -> StoreResult<Application> {
        let mut t = self.lock();
        if t
            .applications
            .iter()
            .any(|a| a.job_id == job_id && a.applicant_id == applicant_id)
        {
            return Err(StoreError::Conflict("applications_job_applicant_key".into()));
        }
        let now = OffsetDateTime::now_utc();
        let app = Application {
            id: Uuid::new_v4(),
            job_id,
            applicant_id,
            status: ApplicationStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        t.applications.push(app.clone());
        Ok(app)
    }

    async fn list_by_applicant(&self, applicant_id: Uuid) -> StoreResult<Vec<Application>> {
        let t = self.lock();
        let mine: Vec<Application> = t
            .applications
            .iter()
            .filter(|a| a.applicant_id == applicant_id)
            .cloned()
            .collect();
        Ok(newest_first(mine.into_iter(), |a| a.created_at))
    }

    async fn list_by_job(&self, job_id: Uuid) -> StoreResult<Vec<Application>> {
        let t = self.lock();
        let for_job: Vec<Application> = t
            .applications
            .iter()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect();
        Ok(newest_first(for_job.into_iter(), |a| a.created_at))
    }

    async fn set_status(&self, id: Uuid, status: ApplicationStatus) -> StoreResult<Option<Application>> {
        let mut t = self.lock();
        let Some(app) = t.applications.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        app.status = status;
        app.updated_at = OffsetDateTime::now_utc();
        Ok(Some(app.clone()))
    }
}

/// Accepts every upload, hands back a predictable URL and remembers which
/// keys are still stored.
#[derive(Default)]
pub struct FakeStorage {
    objects: Mutex<BTreeSet<String>>,
}

impl FakeStorage {
    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl StorageClient for FakeStorage {
    async fn put_object(&self, key: &str, _body: Bytes, _content_type: &str) -> anyhow::Result<String> {
        self.objects
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key.to_string());
        Ok(format!("https://fake.local/{key}"))
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.objects
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(key);
        Ok(())
    }
}

/// Repository whose existence probes always miss, as if a concurrent
/// request committed between the check and the insert.
pub struct StaleReads<R: ?Sized>(pub Arc<R>);

#[async_trait]
impl UserRepo for StaleReads<dyn UserRepo> {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.0.find_by_id(id).await
    }
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.0.find_by_email(email).await
    }
    async fn exists_with(&self, _field: UniqueField, _value: &str) -> StoreResult<bool> {
        Ok(false)
    }
    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        self.0.insert(user).await
    }
    async fn set_otp(&self, id: Uuid, otp: &OtpCode) -> StoreResult<()> {
        self.0.set_otp(id, otp).await
    }
    async fn mark_email_verified(&self, id: Uuid) -> StoreResult<()> {
        self.0.mark_email_verified(id).await
    }
    async fn update_profile(&self, id: Uuid, profile: &Profile) -> StoreResult<Option<User>> {
        self.0.update_profile(id, profile).await
    }
}

#[async_trait]
impl ApplicationRepo for StaleReads<dyn ApplicationRepo> {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Application>> {
        self.0.find_by_id(id).await
    }
    async fn find_for(&self, _job_id: Uuid, _applicant_id: Uuid) -> StoreResult<Option<Application>> {
        Ok(None)
    }
    async fn insert(&self, job_id: Uuid, applicant_id: Uuid) -> StoreResult<Application> {
        self.0.insert(job_id, applicant_id).await
    }
    async fn list_by_applicant(&self, applicant_id: Uuid) -> StoreResult<Vec<Application>> {
        self.0.list_by_applicant(applicant_id).await
    }
    async fn list_by_job(&self, job_id: Uuid) -> StoreResult<Vec<Application>> {
        self.0.list_by_job(job_id).await
    }
    async fn set_status(&self, id: Uuid, status: ApplicationStatus) -> StoreResult<Option<Application>> {
        self.0.set_status(id, status).await
    }
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Keeps every message it is asked to send. Can be switched to fail.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        let mailer = Self::default();
        mailer.set_failing(true);
        mailer
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_html(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Transport("simulated outage".into()));
        }
        self.sent
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(SentMail {
                to: to.to_string(),
                subject: subject.to_string(),
                html: html.to_string(),
            });
        Ok(())
    }
}

pub fn image() -> UploadItem {
    UploadItem {
        body: Bytes::from_static(b"\x89PNG\r\n\x1a\n"),
        content_type: "image/png".into(),
        file_name: Some("photo.png".into()),
    }
}

pub fn pdf() -> UploadItem {
    UploadItem {
        body: Bytes::from_static(b"%PDF-1.4"),
        content_type: "application/pdf".into(),
        file_name: Some("resume.pdf".into()),
    }
}

/// Valid registration whose unique fields are derived from `seed`.
pub fn registration(role: Role, seed: u32) -> RegisterForm {
    RegisterForm {
        fullname: Some("asha rao".into()),
        email: Some(format!("User{seed}@Example.com")),
        phone_number: Some(format!("9{seed:09}")),
        password: Some(PASSWORD.into()),
        pan_card: Some(format!("abcde{seed:04}f")),
        aadhaar_card: Some(format!("{seed:012}")),
        role: Some(role.as_str().into()),
        profile_photo: Some(image()),
    }
}

/// Registers and verifies a user through the real services.
pub async fn verified_user(st: &AppState, role: Role, seed: u32) -> User {
    let registered = auth_services::register(st, registration(role, seed))
        .await
        .expect("registration succeeds");
    let code = registered
        .user
        .email_verification
        .as_ref()
        .expect("pending otp")
        .code
        .clone();
    auth_services::verify_email(st, Some(&registered.user.email), Some(&code))
        .await
        .expect("verification succeeds");
    st.users
        .find_by_id(registered.user.id)
        .await
        .expect("store")
        .expect("user exists")
}

pub fn as_auth(user: &User) -> AuthUser {
    AuthUser {
        id: user.id,
        role: user.role,
    }
}

pub async fn company_of(st: &AppState, owner: &User, name: &str) -> Company {
    company_services::register(st, as_auth(owner), Some(name))
        .await
        .expect("company registered")
}

pub fn job_input(company_id: Uuid) -> JobInput {
    JobInput {
        title: Some("Backend Engineer".into()),
        description: Some("Build and run the hiring platform".into()),
        requirements: Some("Rust,PostgreSQL".into()),
        salary: Some(json!("1200000")),
        location: Some("Bengaluru".into()),
        job_type: Some("Full-time".into()),
        experience: Some(json!("2")),
        position: Some(json!(3)),
        company_id: Some(company_id.to_string()),
    }
}

pub async fn job_of(st: &AppState, owner: &User, company: &Company) -> Job {
    job_services::post(st, as_auth(owner), &job_input(company.id))
        .await
        .expect("job posted")
}
