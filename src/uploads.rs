use std::collections::HashMap;

use axum::{
    extract::{multipart::MultipartError, Multipart},
    http::StatusCode,
};
use bytes::Bytes;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, InternalError, ValidationError},
    state::AppState,
};

const MB: usize = 1024 * 1024;

/// Request body cap for multipart routes: one resume and one image at their
/// own limits, plus room for the text fields and part headers.
pub const FORM_BODY_LIMIT: usize = 16 * MB;

const RESUME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    ProfilePhoto,
    Resume,
    CompanyLogo,
}

impl UploadKind {
    fn folder(self) -> &'static str {
        match self {
            UploadKind::ProfilePhoto => "profile-photos",
            UploadKind::Resume => "resumes",
            UploadKind::CompanyLogo => "company-logos",
        }
    }

    fn max_bytes(self) -> usize {
        match self {
            UploadKind::Resume => 10 * MB,
            UploadKind::ProfilePhoto | UploadKind::CompanyLogo => 5 * MB,
        }
    }

    fn accepts(self, content_type: &str) -> bool {
        match self {
            UploadKind::Resume => RESUME_TYPES.contains(&content_type),
            UploadKind::ProfilePhoto | UploadKind::CompanyLogo => content_type.starts_with("image/"),
        }
    }

    fn rejection(self) -> ValidationError {
        match self {
            UploadKind::Resume => {
                ValidationError::InvalidFileType("Only PDF, DOC, DOCX, and TXT files are allowed")
            }
            UploadKind::ProfilePhoto => ValidationError::InvalidFileType(
                "Profile photo must be an image file (JPG, PNG, GIF, etc.)",
            ),
            UploadKind::CompanyLogo => {
                ValidationError::InvalidFileType("Only image files are allowed for company logo")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
    pub file_name: Option<String>,
}

/// Text fields and files of a multipart request, keyed by field name.
#[derive(Debug, Default)]
pub struct FormData {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, UploadItem>,
}

impl FormData {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadItem> {
        self.files.remove(name)
    }
}

pub async fn read_form(mut mp: Multipart) -> AppResult<FormData> {
    let mut form = FormData::default();
    loop {
        let field = match mp.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => return Err(multipart_rejection(e, "malformed multipart body")),
        };
        let Some(name) = field.name().map(|s| s.trim_end_matches("[]").to_string()) else {
            continue;
        };
        let file_name = field.file_name().map(|s| s.to_string());
        let content_type = field.content_type().map(|s| s.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_rejection(e, "failed to read multipart field"))?;

        if file_name.is_some() {
            if data.is_empty() {
                continue;
            }
            form.files.insert(
                name,
                UploadItem {
                    body: data,
                    content_type: content_type.unwrap_or_else(|| "application/octet-stream".into()),
                    file_name,
                },
            );
        } else {
            let text = String::from_utf8(data.to_vec())
                .map_err(|_| AppError::from(ValidationError::MalformedForm))?;
            form.fields.insert(name, text);
        }
    }
    Ok(form)
}

/// A body cut off by [`FORM_BODY_LIMIT`] is a size error, anything else a malformed form.
fn multipart_rejection(e: MultipartError, context: &'static str) -> AppError {
    warn!(error = %e, status = %e.status(), "{context}");
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ValidationError::FileTooLarge(FORM_BODY_LIMIT / MB).into()
    } else {
        ValidationError::MalformedForm.into()
    }
}

/// Checks the file against the kind's type and size rules, without storing it.
pub fn check_upload(kind: UploadKind, item: &UploadItem) -> Result<(), ValidationError> {
    if !kind.accepts(&item.content_type) {
        return Err(kind.rejection());
    }
    if item.body.len() > kind.max_bytes() {
        return Err(ValidationError::FileTooLarge(kind.max_bytes() / MB));
    }
    Ok(())
}

/// Validates and stores an upload, returning the reference URL.
pub async fn store_upload(
    st: &AppState,
    owner: Uuid,
    kind: UploadKind,
    item: UploadItem,
) -> AppResult<String> {
    check_upload(kind, &item)?;
    let key = upload_key(owner, kind, &item);
    put_upload(st, &key, item).await
}

/// `<folder>/<owner>/<uuid>.<ext>`
pub fn upload_key(owner: Uuid, kind: UploadKind, item: &UploadItem) -> String {
    let ext = ext_from_mime(&item.content_type)
        .or_else(|| item.file_name.as_deref().and_then(ext_from_name))
        .unwrap_or("bin");
    format!("{}/{}/{}.{}", kind.folder(), owner, Uuid::new_v4(), ext)
}

/// Stores an already checked upload under `key`.
pub async fn put_upload(st: &AppState, key: &str, item: UploadItem) -> AppResult<String> {
    st.storage
        .put_object(key, item.body, &item.content_type)
        .await
        .map_err(|e| {
            error!(error = %e, key = %key, "upload failed");
            AppError::from(InternalError::Storage(e))
        })
}

/// Removes an object whose owning row was never written. Failures are logged only.
pub async fn discard_upload(st: &AppState, key: &str) {
    match st.storage.delete_object(key).await {
        Ok(()) => debug!(key, "discarded unreferenced upload"),
        Err(e) => warn!(error = %e, key, "unreferenced upload left in storage"),
    }
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        "application/pdf" => Some("pdf"),
        "application/msword" => Some("doc"),
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => Some("docx"),
        "text/plain" => Some("txt"),
        _ => None,
    }
}

fn ext_from_name(name: &str) -> Option<&'static str> {
    let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
    ["jpg", "jpeg", "png", "gif", "webp", "pdf", "doc", "docx", "txt"]
        .into_iter()
        .find(|known| *known == ext)
}
