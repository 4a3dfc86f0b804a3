/// Submit client: the single point of contact with the remote applications API.
///
/// No other module builds requests to the API. The controller only sees the
/// `Submitter` trait, so tests can swap in an in-memory backend.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::{ParseError, Url};

use crate::models::{ApplicationDraft, Field};

const SUBMIT_PATH: &str = "/api/submit";

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API rejected the application (status {status})")]
    Rejected { status: u16 },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Draft has no CV attached")]
    MissingCv,

    #[error("API returned an unusable cv_link: {0:?}")]
    UnsafeLink(String),
}

/// Body of a 2xx answer from `POST /api/submit`.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub cv_link: String,
}

/// Sends one application to the remote API. Exactly one attempt per call.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, draft: &ApplicationDraft) -> Result<SubmitResponse, SubmitError>;
}

/// reqwest-backed `Submitter` posting `multipart/form-data`.
#[derive(Clone)]
pub struct SubmitClient {
    client: Client,
    endpoint: String,
}

impl SubmitClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Self {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            client: builder.build().expect("Failed to build HTTP client"),
            endpoint: format!("{}{SUBMIT_PATH}", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Submitter for SubmitClient {
    async fn submit(&self, draft: &ApplicationDraft) -> Result<SubmitResponse, SubmitError> {
        let form = build_form(draft)?;

        let response = self.client.post(&self.endpoint).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            // The body of a rejection is never inspected.
            return Err(SubmitError::Rejected {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let parsed: SubmitResponse = serde_json::from_slice(&body)?;
        check_link(&parsed.cv_link)?;

        debug!("API accepted application: status={}, cv_link={}", status, parsed.cv_link);

        Ok(parsed)
    }
}

/// Encodes the draft as the four parts the API expects.
fn build_form(draft: &ApplicationDraft) -> Result<Form, SubmitError> {
    let cv = draft.cv.as_ref().ok_or(SubmitError::MissingCv)?;

    let cv_part = Part::bytes(cv.bytes.to_vec())
        .file_name(cv.file_name.clone())
        .mime_str(&cv.content_type)?;

    Ok(Form::new()
        .text(Field::Name.part_name(), draft.name.clone())
        .text(Field::Email.part_name(), draft.email.clone())
        .text(Field::Phone.part_name(), draft.phone.clone())
        .part(Field::Cv.part_name(), cv_part))
}

/// The link ends up in an `href`, so only http(s) and relative links pass.
fn check_link(link: &str) -> Result<(), SubmitError> {
    let allowed = match Url::parse(link) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(ParseError::RelativeUrlWithoutBase) => !link.trim().is_empty(),
        Err(_) => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(SubmitError::UnsafeLink(link.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::controller::{SubmissionOutcome, FAILURE_MESSAGE};
    use crate::form::{ApplicationForm, SubmitAttempt};
    use crate::models::{CvFile, SubmissionStatus};
    use axum::extract::{Multipart, State};
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use bytes::Bytes;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone)]
    struct ReceivedPart {
        name: String,
        file_name: Option<String>,
        content_type: Option<String>,
        data: Bytes,
    }

    #[derive(Clone)]
    struct FakeApi {
        status: StatusCode,
        body: Value,
        /// How long the API sits on a request before answering.
        delay: Duration,
        requests: Arc<Mutex<Vec<Vec<ReceivedPart>>>>,
    }

    async fn fake_submit(
        State(api): State<FakeApi>,
        mut multipart: Multipart,
    ) -> (StatusCode, Json<Value>) {
        let mut parts = Vec::new();
        while let Some(field) = multipart.next_field().await.unwrap() {
            parts.push(ReceivedPart {
                name: field.name().unwrap_or_default().to_string(),
                file_name: field.file_name().map(String::from),
                content_type: field.content_type().map(String::from),
                data: field.bytes().await.unwrap(),
            });
        }
        api.requests.lock().unwrap().push(parts);
        tokio::time::sleep(api.delay).await;
        (api.status, Json(api.body.clone()))
    }

    /// Serves the fake API on an ephemeral port and returns its base URL.
    async fn spawn_api(api: FakeApi) -> String {
        let app = Router::new()
            .route("/api/submit", post(fake_submit))
            .with_state(api);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn fake_api(status: StatusCode, body: Value) -> FakeApi {
        FakeApi {
            status,
            body,
            delay: Duration::ZERO,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn draft() -> ApplicationDraft {
        ApplicationDraft {
            name: "A".into(),
            email: "a@b.com".into(),
            phone: "123".into(),
            cv: Some(CvFile::new(
                "a.pdf",
                None,
                Bytes::from_static(b"%PDF-1.4 test"),
            )),
        }
    }

    /// Copies the test draft into a form.
    fn fill(form: &ApplicationForm) {
        let draft = draft();
        form.set_field(Field::Name, draft.name);
        form.set_field(Field::Email, draft.email);
        form.set_field(Field::Phone, draft.phone);
        if let Some(cv) = draft.cv {
            form.select_cv(cv);
        }
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = SubmitClient::new("http://127.0.0.1:5000/", None);
        assert_eq!(client.endpoint(), "http://127.0.0.1:5000/api/submit");
    }

    #[tokio::test]
    async fn test_draft_without_cv_is_not_sent() {
        let api = fake_api(StatusCode::OK, json!({ "cv_link": "/files/a.pdf" }));
        let requests = api.requests.clone();
        let base = spawn_api(api).await;
        let mut draft = draft();
        draft.cv = None;

        let err = SubmitClient::new(&base, None).submit(&draft).await.unwrap_err();

        assert!(matches!(err, SubmitError::MissingCv));
        assert!(requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_check_link() {
        for link in [
            "https://cdn.example.com/cv/a.pdf",
            "http://127.0.0.1:5000/files/a.pdf",
            "/files/a.pdf",
            "files/a.pdf",
            "//cdn.example.com/a.pdf",
        ] {
            assert!(check_link(link).is_ok(), "{link} should pass");
        }
        for link in [
            "javascript:alert(document.cookie)",
            " JavaScript:alert(1)",
            "data:text/html;base64,PHNjcmlwdD4=",
            "vbscript:msgbox(1)",
            "file:///etc/passwd",
            "",
        ] {
            assert!(
                matches!(check_link(link), Err(SubmitError::UnsafeLink(_))),
                "{link:?} should be refused"
            );
        }
    }

    #[tokio::test]
    async fn test_submit_posts_one_multipart_request_with_four_parts() {
        let api = fake_api(StatusCode::OK, json!({ "cv_link": "/files/a.pdf" }));
        let requests = api.requests.clone();
        let base = spawn_api(api).await;

        let response = SubmitClient::new(&base, None)
            .submit(&draft())
            .await
            .expect("submission succeeds");
        assert_eq!(response.cv_link, "/files/a.pdf");

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let names: Vec<&str> = requests[0].iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["name", "email", "phone", "cv"]);

        let cv = &requests[0][3];
        assert_eq!(cv.file_name.as_deref(), Some("a.pdf"));
        assert_eq!(cv.content_type.as_deref(), Some("application/pdf"));
        assert_eq!(cv.data, Bytes::from_static(b"%PDF-1.4 test"));
        assert_eq!(requests[0][1].data, Bytes::from_static(b"a@b.com"));
    }

    #[tokio::test]
    async fn test_created_status_is_success() {
        let api = fake_api(StatusCode::CREATED, json!({ "cv_link": "/files/a.pdf" }));
        let base = spawn_api(api).await;

        let response = SubmitClient::new(&base, None)
            .submit(&draft())
            .await
            .expect("201 counts as success");
        assert_eq!(response.cv_link, "/files/a.pdf");
    }

    #[tokio::test]
    async fn test_script_link_ends_as_failed_submission() {
        let api = fake_api(
            StatusCode::OK,
            json!({ "cv_link": "javascript:alert(document.cookie)" }),
        );
        let base = spawn_api(api).await;
        let client = SubmitClient::new(&base, None);

        let err = client.submit(&draft()).await.unwrap_err();
        assert!(matches!(err, SubmitError::UnsafeLink(_)));

        let form = ApplicationForm::new(Arc::new(client));
        fill(&form);
        assert_eq!(
            form.submit().await,
            SubmitAttempt::Completed(SubmissionOutcome::Failed(FAILURE_MESSAGE.into()))
        );
        let snapshot = form.snapshot();
        assert_eq!(snapshot.status, SubmissionStatus::Failed);
        assert!(snapshot.upload.is_none());
    }

    #[tokio::test]
    async fn test_timeout_ends_as_failed_submission() {
        let mut api = fake_api(StatusCode::OK, json!({ "cv_link": "/files/a.pdf" }));
        api.delay = Duration::from_secs(5);
        let base = spawn_api(api).await;
        let client = SubmitClient::new(&base, Some(Duration::from_millis(200)));

        match client.submit(&draft()).await {
            Err(SubmitError::Http(e)) => assert!(e.is_timeout()),
            other => panic!("expected a timeout, got {other:?}"),
        }

        let form = ApplicationForm::new(Arc::new(client));
        fill(&form);
        let before = form.snapshot().draft;
        assert_eq!(
            form.submit().await,
            SubmitAttempt::Completed(SubmissionOutcome::Failed(FAILURE_MESSAGE.into()))
        );
        let snapshot = form.snapshot();
        assert_eq!(snapshot.status, SubmissionStatus::Failed);
        assert_eq!(snapshot.draft, before);
    }

    #[tokio::test]
    async fn test_non_success_status_is_rejected_without_reading_body() {
        let api = fake_api(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "cv_link": "/files/ignored.pdf" }),
        );
        let base = spawn_api(api).await;

        let err = SubmitClient::new(&base, None)
            .submit(&draft())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Rejected { status: 500 }));
    }

    #[tokio::test]
    async fn test_success_without_cv_link_is_parse_error() {
        let api = fake_api(StatusCode::OK, json!({ "link": "/files/a.pdf" }));
        let base = spawn_api(api).await;

        let err = SubmitClient::new(&base, None)
            .submit(&draft())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Parse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_api_is_http_error() {
        // Bind then drop to get a port with nothing listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = SubmitClient::new(&format!("http://{addr}"), None)
            .submit(&draft())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Http(_)));
    }
}
