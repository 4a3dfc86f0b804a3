use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Multipart, State},
    response::{Html, Redirect},
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_sessions::Session;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::form::render::render_page;
use crate::form::{ApplicationForm, FormSnapshot, SubmitAttempt};
use crate::models::{CvFile, Field, Notice, SubmissionStatus};
use crate::state::AppState;

/// Session key holding the id of the visitor's form.
const FORM_ID_KEY: &str = "form_id";

/// Parts of one browser post, before they touch the form.
#[derive(Debug, Default)]
struct FormPost {
    text: Vec<(Field, String)>,
    cv: Option<CvFile>,
}

async fn read_form_post(
    multipart: &mut Multipart,
    max_cv_bytes: usize,
) -> Result<FormPost, AppError> {
    let mut post = FormPost::default();

    while let Some(part) = multipart.next_field().await? {
        let Some(field) = part.name().and_then(Field::from_part_name) else {
            debug!("Ignoring unknown form part {:?}", part.name());
            continue;
        };

        match field {
            Field::Cv => {
                let file_name = part.file_name().unwrap_or_default().to_string();
                let content_type = part.content_type().map(String::from);
                let bytes: Bytes = part.bytes().await?;
                // Browsers send an empty, unnamed part when no file was picked.
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                if bytes.len() > max_cv_bytes {
                    return Err(AppError::Validation(format!(
                        "CV exceeds the {max_cv_bytes} byte limit"
                    )));
                }
                post.cv = Some(CvFile::new(file_name, content_type.as_deref(), bytes));
            }
            _ => post.text.push((field, part.text().await?)),
        }
    }

    Ok(post)
}

async fn session_form_id(session: &Session) -> Result<Option<Uuid>, AppError> {
    let id = session
        .get::<Uuid>(FORM_ID_KEY)
        .await
        .context("Failed to read form id from session")?;
    Ok(id)
}

/// The visitor's form, created on their first post.
async fn visitor_form(
    state: &AppState,
    session: &Session,
) -> Result<Arc<ApplicationForm>, AppError> {
    let id = match session_form_id(session).await? {
        Some(id) => id,
        None => {
            let id = Uuid::new_v4();
            session
                .insert(FORM_ID_KEY, id)
                .await
                .context("Failed to store form id in session")?;
            debug!(form_id = %id, "New visitor form");
            id
        }
    };
    Ok(state.forms.get_or_create(id))
}

/// The visitor's form if they have one. Reads never create a form.
async fn existing_form(
    state: &AppState,
    session: &Session,
) -> Result<Option<Arc<ApplicationForm>>, AppError> {
    Ok(session_form_id(session)
        .await?
        .and_then(|id| state.forms.get(id)))
}

async fn visitor_snapshot(state: &AppState, session: &Session) -> Result<FormSnapshot, AppError> {
    Ok(existing_form(state, session)
        .await?
        .map(|form| form.snapshot())
        .unwrap_or_default())
}

/// GET /
pub async fn handle_page(
    State(state): State<AppState>,
    session: Session,
) -> Result<Html<String>, AppError> {
    Ok(Html(render_page(&visitor_snapshot(&state, &session).await?)))
}

/// POST /apply
pub async fn handle_apply(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> Result<Redirect, AppError> {
    let post = read_form_post(&mut multipart, state.config.max_upload_bytes).await?;
    let form = visitor_form(&state, &session).await?;

    if form.is_submitting() {
        info!("Form post ignored: a submission is already in flight");
        return Ok(Redirect::to("/"));
    }

    for (field, value) in post.text {
        form.set_field(field, value);
    }
    if let Some(cv) = post.cv {
        form.select_cv(cv);
    }

    match form.submit().await {
        SubmitAttempt::Completed(outcome) => debug!("Submission finished: {outcome:?}"),
        SubmitAttempt::AlreadySubmitting => {
            info!("Form post ignored: a submission is already in flight")
        }
        SubmitAttempt::Incomplete(missing) => info!("Form post incomplete, missing {missing:?}"),
    }

    Ok(Redirect::to("/"))
}

/// POST /notice/dismiss
pub async fn handle_dismiss_notice(
    State(state): State<AppState>,
    session: Session,
) -> Result<Redirect, AppError> {
    if let Some(form) = existing_form(&state, &session).await? {
        form.dismiss_notice();
    }
    Ok(Redirect::to("/"))
}

#[derive(Debug, Serialize)]
pub struct CvSummary {
    pub file_name: String,
    pub content_type: String,
    pub size: usize,
}

#[derive(Debug, Serialize)]
pub struct DraftView {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub cv: Option<CvSummary>,
}

#[derive(Debug, Serialize)]
pub struct UploadView {
    pub cv_link: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub status: SubmissionStatus,
    pub is_submitting: bool,
    pub draft: DraftView,
    pub notice: Option<Notice>,
    pub upload: Option<UploadView>,
}

/// GET /api/state
pub async fn handle_get_state(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<StateResponse>, AppError> {
    let snapshot = visitor_snapshot(&state, &session).await?;
    let draft = snapshot.draft;

    Ok(Json(StateResponse {
        status: snapshot.status,
        is_submitting: snapshot.status == SubmissionStatus::Submitting,
        draft: DraftView {
            name: draft.name,
            email: draft.email,
            phone: draft.phone,
            cv: draft.cv.map(|cv| CvSummary {
                size: cv.size(),
                file_name: cv.file_name,
                content_type: cv.content_type,
            }),
        },
        notice: snapshot.notice,
        upload: snapshot.upload.map(|u| UploadView {
            cv_link: u.cv_link,
            submitted_at: u.submitted_at,
        }),
    }))
}
