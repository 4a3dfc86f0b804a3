//! Feedback presenter: pure mapping from form state to what the page shows.

use crate::form::FormSnapshot;
use crate::models::{Notice, NoticeKind, SubmissionStatus};

pub const SUBMIT_LABEL: &str = "Submit Application";
pub const SUBMITTING_LABEL: &str = "Submitting...";
pub const DOWNLOAD_LABEL: &str = "Download CV";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitControl {
    pub label: &'static str,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: NoticeKind,
    pub message: String,
    pub dismissible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub href: String,
    pub file_name: String,
    pub label: &'static str,
}

/// Feedback part of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub banner: Option<Banner>,
    pub submit: SubmitControl,
    pub download: Option<DownloadLink>,
}

pub fn present(snapshot: &FormSnapshot) -> Feedback {
    let submit = if snapshot.status == SubmissionStatus::Submitting {
        SubmitControl {
            label: SUBMITTING_LABEL,
            disabled: true,
        }
    } else {
        SubmitControl {
            label: SUBMIT_LABEL,
            disabled: false,
        }
    };

    let banner = match snapshot.status {
        SubmissionStatus::Succeeded | SubmissionStatus::Failed => {
            snapshot.notice.as_ref().map(banner_for)
        }
        SubmissionStatus::Idle | SubmissionStatus::Submitting => None,
    };

    let download = match (snapshot.status, &snapshot.upload) {
        (SubmissionStatus::Succeeded, Some(upload)) => Some(DownloadLink {
            href: upload.cv_link.clone(),
            file_name: download_file_name(&upload.cv_link).to_string(),
            label: DOWNLOAD_LABEL,
        }),
        _ => None,
    };

    Feedback {
        banner,
        submit,
        download,
    }
}

fn banner_for(notice: &Notice) -> Banner {
    Banner {
        kind: notice.kind,
        message: notice.message.clone(),
        dismissible: true,
    }
}

/// Suggested file name for a download: the last path segment of the link.
pub fn download_file_name(link: &str) -> &str {
    let path = link.split(['?', '#']).next().unwrap_or(link);
    match path.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment,
        _ => link,
    }
}
