pub mod application;

pub use application::{
    ApplicationDraft, CvFile, Field, Notice, NoticeKind, SubmissionStatus, UploadResult,
};
