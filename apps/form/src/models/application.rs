use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A résumé file picked by the applicant. Holds the full content so a failed
/// submission can be retried without re-uploading.
#[derive(Debug, Clone, PartialEq)]
pub struct CvFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl CvFile {
    /// Builds a file from its name and content. When the browser did not send a
    /// content type, one is guessed from the extension.
    pub fn new(file_name: impl Into<String>, content_type: Option<&str>, bytes: Bytes) -> Self {
        let file_name = file_name.into();
        let content_type = match content_type {
            Some(ct) if !ct.trim().is_empty() => ct.to_string(),
            _ => mime_guess::from_path(&file_name)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
        };
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// The inputs of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Phone,
    Cv,
}

impl Field {
    /// Multipart part name, shared by the page inputs and the remote API.
    pub fn part_name(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::Cv => "cv",
        }
    }

    pub fn from_part_name(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Field::Name),
            "email" => Some(Field::Email),
            "phone" => Some(Field::Phone),
            "cv" => Some(Field::Cv),
            _ => None,
        }
    }
}

/// In-progress, not yet submitted application.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub cv: Option<CvFile>,
}

impl ApplicationDraft {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.email.is_empty() && self.phone.is_empty() && self.cv.is_none()
    }

    /// Fields that still need a value before the draft may be dispatched.
    /// Whitespace-only text counts as missing, as it would for a `required` input.
    pub fn missing_fields(&self) -> Vec<Field> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push(Field::Name);
        }
        if self.email.trim().is_empty() {
            missing.push(Field::Email);
        }
        if self.phone.trim().is_empty() {
            missing.push(Field::Phone);
        }
        if self.cv.is_none() {
            missing.push(Field::Cv);
        }
        missing
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// What the remote API handed back for a successful submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadResult {
    pub cv_link: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
}

/// Dismissible banner shown above the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}
