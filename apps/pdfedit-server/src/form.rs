//! Browser upload form
//!
//! `GET /` renders the form, `POST /edit` takes the multipart submission and
//! answers with the edited PDF as a download, or with the form again plus an
//! error banner.

use axum::{
    extract::{multipart::MultipartError, Multipart, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use pdfedit_core::{SubstitutionRequest, OUTPUT_FILE_NAME, OUTPUT_MIME_TYPE};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::api::run_edit;
use crate::error::ServerError;
use crate::AppState;

pub const MAX_PAIRS: usize = 20;

pub const NOTHING_TO_DO: &str =
    "Please enter at least one text replacement or choose a new image.";

#[derive(Deserialize)]
pub struct FormQuery {
    pub pairs: Option<usize>,
}

/// Handler: GET /
pub async fn handle_form(Query(query): Query<FormQuery>) -> Html<String> {
    let pairs = query.pairs.unwrap_or(1).clamp(1, MAX_PAIRS);
    Html(render_page(pairs, None))
}

/// Handler: POST /edit
pub async fn handle_form_submit(State(state): State<AppState>, multipart: Multipart) -> Response {
    match process_submission(&state, multipart).await {
        Ok(pdf) => (
            [
                (header::CONTENT_TYPE, OUTPUT_MIME_TYPE.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", OUTPUT_FILE_NAME),
                ),
            ],
            pdf,
        )
            .into_response(),
        Err(err) => {
            warn!("Form edit failed: {}", err);
            (err.status(), Html(render_page(1, Some(&err.user_message())))).into_response()
        }
    }
}

#[derive(Default)]
struct Submission {
    pdf: Option<Vec<u8>>,
    image: Option<Vec<u8>>,
    searches: Vec<String>,
    replacements: Vec<String>,
}

impl Submission {
    /// Pair search and replace fields by position
    fn request(&self) -> SubstitutionRequest {
        SubstitutionRequest::from_fields(
            self.searches
                .iter()
                .map(String::as_str)
                .zip(self.replacements.iter().map(String::as_str)),
        )
    }
}

async fn read_submission(mut multipart: Multipart) -> Result<Submission, ServerError> {
    let mut submission = Submission::default();

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "pdf" | "image" => {
                let data = field.bytes().await.map_err(upload_error)?;
                // Browsers send an empty part when no file was chosen
                if data.is_empty() {
                    continue;
                }
                if name == "pdf" {
                    submission.pdf = Some(data.to_vec());
                } else {
                    submission.image = Some(data.to_vec());
                }
            }
            "search" => submission
                .searches
                .push(field.text().await.map_err(upload_error)?),
            "replace" => submission
                .replacements
                .push(field.text().await.map_err(upload_error)?),
            other => debug!("Ignoring form field {:?}", other),
        }
    }

    Ok(submission)
}

async fn process_submission(state: &AppState, multipart: Multipart) -> Result<Vec<u8>, ServerError> {
    let submission = read_submission(multipart).await?;
    let request = submission.request();
    request.validate()?;

    let pdf = submission
        .pdf
        .ok_or_else(|| ServerError::InvalidRequest("Please choose a PDF file.".into()))?;
    if request.is_empty() && submission.image.is_none() {
        return Err(ServerError::InvalidRequest(NOTHING_TO_DO.into()));
    }

    info!(
        "Form edit request: {} bytes, {} substitutions, image: {}",
        pdf.len(),
        request.len(),
        submission.image.is_some()
    );

    let outcome = run_edit(state.options.clone(), pdf, request, submission.image).await?;
    Ok(outcome.bytes)
}

fn upload_error(err: MultipartError) -> ServerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge(err.body_text())
    } else {
        ServerError::InvalidRequest(err.body_text())
    }
}

fn render_page(pairs: usize, error: Option<&str>) -> String {
    let banner = error
        .map(|msg| format!("<p class=\"error\">{}</p>\n", escape_html(msg)))
        .unwrap_or_default();

    let rows: String = (1..=pairs)
        .map(|i| {
            format!(
                "      <div class=\"pair\">\n        \
                 <input type=\"text\" name=\"search\" placeholder=\"Text to replace {i}\">\n        \
                 <input type=\"text\" name=\"replace\" placeholder=\"New text {i}\">\n      \
                 </div>\n"
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>PDF Editor</title>
  <style>
    body {{ font-family: sans-serif; max-width: 40rem; margin: 2rem auto; }}
    .pair {{ display: flex; gap: 1rem; margin-bottom: .5rem; }}
    .pair input {{ flex: 1; }}
    .error {{ background: #fdd; border: 1px solid #c00; padding: .75rem; }}
    .info {{ background: #eef; padding: .75rem; }}
  </style>
</head>
<body>
  <h1>PDF Editor</h1>
{banner}  <form method="get" action="/">
    <label>Number of text replacements
      <input type="number" name="pairs" min="1" max="{max}" value="{pairs}">
    </label>
    <button type="submit">Update</button>
  </form>
  <form method="post" action="/edit" enctype="multipart/form-data">
    <h2>PDF file</h2>
    <input type="file" name="pdf" accept="application/pdf" required>
    <h2>Text replacements</h2>
{rows}    <h2>Image replacement</h2>
    <input type="file" name="image" accept="image/png,image/jpeg">
    <p><button type="submit">Edit PDF</button></p>
  </form>
  <p class="info">This tool works best with simple PDFs. Complex layouts or encrypted PDFs may cause problems.</p>
</body>
</html>
"#,
        max = MAX_PAIRS,
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
