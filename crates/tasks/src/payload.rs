//! Job submission payloads.

use std::path::PathBuf;

use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;

use crate::api::TaskApiError;

/// Parameters and inputs sent with a job submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// No request body.
    Empty,
    /// `application/json` body.
    Json(serde_json::Value),
    /// `application/x-www-form-urlencoded` body.
    Form(Vec<(String, String)>),
    /// `multipart/form-data` body with text fields and uploaded files.
    Multipart {
        fields: Vec<(String, String)>,
        files: Vec<FileInput>,
    },
}

/// A local file uploaded as one multipart part.
#[derive(Debug, Clone, PartialEq)]
pub struct FileInput {
    /// Form field name the server expects the file under.
    pub field: String,
    pub path: PathBuf,
}

impl FileInput {
    pub fn new(field: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            field: field.into(),
            path: path.into(),
        }
    }
}

impl Payload {
    /// Attach this payload as the body of `request`.
    ///
    /// Multipart files are read from disk here, so a missing input file
    /// fails the submission before anything is sent.
    pub(crate) async fn apply(self, request: RequestBuilder) -> Result<RequestBuilder, TaskApiError> {
        match self {
            Payload::Empty => Ok(request),
            Payload::Json(body) => Ok(request.json(&body)),
            Payload::Form(fields) => Ok(request.form(&fields)),
            Payload::Multipart { fields, files } => {
                let mut form = Form::new();
                for (name, value) in fields {
                    form = form.text(name, value);
                }
                for file in files {
                    let bytes = tokio::fs::read(&file.path).await.map_err(|source| {
                        TaskApiError::Input {
                            path: file.path.clone(),
                            source,
                        }
                    })?;
                    let file_name = file
                        .path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_else(|| file.field.clone());
                    form = form.part(file.field, Part::bytes(bytes).file_name(file_name));
                }
                Ok(request.multipart(form))
            }
        }
    }
}
