use axum::extract::Multipart;
use serde::{Deserialize, Serialize};

use crate::errors::{FieldErrors, RequestError};
use crate::media::Upload;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_GROUP: &str =
    "Select a valid choice. That choice is not one of the available choices.";

// ----------------- User Request -----------------
#[derive(Deserialize, Serialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub username: String,
}

// ----------------- Comment Request -----------------
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    /// The stripped text, or a field error when nothing is left.
    pub fn clean(self) -> Result<String, RequestError> {
        let mut errors = FieldErrors::new();
        let text = clean_text(Some(&self.text), &mut errors);
        errors.into_result(text)
    }
}

// ----------------- Post Request -----------------
/// A new-post or edit-post form as submitted. Validation against the store
/// happens in [`crate::posts`].
#[derive(Debug, Default)]
pub struct PostForm {
    pub text: Option<String>,
    pub group: Option<String>,
    pub image: Option<Upload>,
    pub clear_image: bool,
}

impl PostForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, RequestError> {
        let mut form = PostForm::default();
        while let Some(field) = multipart.next_field().await.map_err(|e| {
            tracing::debug!(error = %e, "malformed multipart body");
            RequestError::RunTimeError("Malformed form data")
        })? {
            let name = field.name().unwrap_or_default().to_owned();
            match name.as_str() {
                "text" => form.text = Some(read_text(field).await?),
                "group" => form.group = Some(read_text(field).await?),
                "image-clear" => form.clear_image = true,
                "image" => {
                    let file_name = field.file_name().map(str::to_owned);
                    let content = field
                        .bytes()
                        .await
                        .map_err(|_| RequestError::RunTimeError("Malformed form data"))?;
                    form.image = Some(Upload { file_name, content });
                }
                _ => {}
            }
        }
        Ok(form)
    }

    /// Stripped text and parsed group id. Whether the group exists is checked
    /// by the caller.
    pub fn clean_fields(&self, errors: &mut FieldErrors) -> (String, Option<i64>) {
        let text = clean_text(self.text.as_deref(), errors);
        let group = parse_group_id(self.group.as_deref(), errors);
        (text, group)
    }

    /// The upload, unless the file input was left blank.
    pub fn take_image(&mut self) -> Option<Upload> {
        self.image.take().filter(|upload| !upload.is_empty())
    }
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, RequestError> {
    field
        .text()
        .await
        .map_err(|_| RequestError::RunTimeError("Malformed form data"))
}

fn clean_text(raw: Option<&str>, errors: &mut FieldErrors) -> String {
    let text = raw.unwrap_or_default().trim();
    if text.is_empty() {
        errors.add("text", REQUIRED);
    }
    text.to_owned()
}

fn parse_group_id(raw: Option<&str>, errors: &mut FieldErrors) -> Option<i64> {
    let raw = raw.map(str::trim).filter(|raw| !raw.is_empty())?;
    match raw.parse() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add("group", INVALID_GROUP);
            None
        }
    }
}
