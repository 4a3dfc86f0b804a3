//! HTML rendering of the application page, server-side through dioxus.

use dioxus::prelude::*;

use crate::form::presenter::{present, Banner, DownloadLink, Feedback};
use crate::form::FormSnapshot;
use crate::models::{ApplicationDraft, NoticeKind};

pub const MAX_FILE_HINT: &str = "Maximum file size: 5MB. Accepted formats: PDF, DOCX";
const ACCEPTED_EXTENSIONS: &str = ".pdf,.docx";

const STYLE: &str = r#"
body { margin: 0; font-family: system-ui, sans-serif; }
.page { min-height: 100vh; display: flex; justify-content: center; align-items: center;
        background: linear-gradient(to bottom, #f0f0f0, #e0e0e0); padding: 20px; box-sizing: border-box; }
.card { width: 100%; max-width: 500px; background: white; border-radius: 8px;
        box-shadow: 0 4px 6px rgba(0,0,0,0.1); padding: 30px; }
.header { text-align: center; margin-bottom: 20px; }
.header h2 { font-size: 24px; margin-bottom: 10px; }
.header p { color: #6c757d; font-size: 14px; }
.notice { display: flex; justify-content: space-between; align-items: center;
          padding: 10px; border-radius: 4px; margin-bottom: 15px; }
.notice.success { color: #155724; background-color: #d4edda; }
.notice.error { color: #721c24; background-color: #f8d7da; }
.notice button { background: none; border: none; cursor: pointer; color: inherit; font-size: 16px; }
form.application { display: flex; flex-direction: column; gap: 15px; }
label { display: block; margin-bottom: 5px; font-weight: 600; }
input { width: 100%; padding: 10px; border: 1px solid #ced4da; border-radius: 4px;
        font-size: 16px; box-sizing: border-box; }
.hint { margin-top: 5px; font-size: 12px; color: #6c757d; }
.submit { width: 100%; padding: 12px; background-color: #007bff; color: white; border: none;
          border-radius: 4px; font-size: 16px; cursor: pointer; }
.submit:disabled { background-color: #6c757d; cursor: not-allowed; }
.download { margin-top: 15px; text-align: center; }
.download a { display: inline-block; padding: 12px; background-color: #28a745; color: white;
              border-radius: 4px; font-size: 16px; text-decoration: none; }
"#;

/// Renders the full page for the current state.
pub fn render_page(snapshot: &FormSnapshot) -> String {
    let feedback = present(snapshot);

    let page = rsx! {
        html { lang: "en",
            head {
                meta { charset: "utf-8" }
                meta { name: "viewport", content: "width=device-width, initial-scale=1" }
                title { "Job Application" }
                style { "{STYLE}" }
            }
            body {
                div { class: "page",
                    div { class: "card",
                        div { class: "header",
                            div { "📋" }
                            h2 { "Job Application" }
                            p { "Fill out the form below to submit your application" }
                        }

                        if let Some(banner) = feedback.banner.as_ref() {
                            {banner_view(banner)}
                        }

                        {application_form(&snapshot.draft, &feedback)}

                        if let Some(download) = feedback.download.as_ref() {
                            {download_view(download)}
                        }
                    }
                }
            }
        }
    };

    format!("<!DOCTYPE html>{}", dioxus_ssr::render_element(page))
}

fn banner_view(banner: &Banner) -> Element {
    let kind = match banner.kind {
        NoticeKind::Success => "success",
        NoticeKind::Error => "error",
    };
    let message = &banner.message;

    rsx! {
        div { class: "notice {kind}", role: "status",
            span { "{message}" }
            if banner.dismissible {
                form { method: "post", action: "/notice/dismiss",
                    button { r#type: "submit", aria_label: "Dismiss", "×" }
                }
            }
        }
    }
}

fn application_form(draft: &ApplicationDraft, feedback: &Feedback) -> Element {
    // A file held from a failed attempt is resent unless the applicant picks another.
    let needs_file = draft.cv.is_none();
    let submit_label = feedback.submit.label;

    rsx! {
        form {
            class: "application",
            method: "post",
            action: "/apply",
            enctype: "multipart/form-data",

            {text_input("name", "Full Name", "text", &draft.name, "John Doe")}
            {text_input("email", "Email Address", "email", &draft.email, "john@example.com")}
            {text_input("phone", "Phone Number", "tel", &draft.phone, "+1 (555) 000-0000")}

            div {
                label { r#for: "cv", "Upload CV (PDF/DOCX)" }
                input {
                    r#type: "file",
                    id: "cv",
                    name: "cv",
                    accept: ACCEPTED_EXTENSIONS,
                    required: needs_file,
                }
                if let Some(cv) = draft.cv.as_ref() {
                    p { class: "hint", "Selected: ", {cv.file_name.clone()} }
                }
                p { class: "hint", "{MAX_FILE_HINT}" }
            }

            button {
                class: "submit",
                r#type: "submit",
                disabled: feedback.submit.disabled,
                "{submit_label}"
            }
        }
    }
}

fn text_input(
    name: &str,
    caption: &str,
    input_type: &str,
    value: &str,
    placeholder: &str,
) -> Element {
    rsx! {
        div {
            label { r#for: "{name}", "{caption}" }
            input {
                r#type: "{input_type}",
                id: "{name}",
                name: "{name}",
                value: "{value}",
                placeholder: "{placeholder}",
                required: true,
            }
        }
    }
}

fn download_view(download: &DownloadLink) -> Element {
    let href = &download.href;
    let file_name = &download.file_name;
    let link_text = download.label;

    rsx! {
        div { class: "download",
            a { href: "{href}", download: "{file_name}", "{link_text}" }
        }
    }
}
