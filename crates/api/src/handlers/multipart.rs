//! Shared multipart form reader for upload endpoints.

use std::collections::HashMap;

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;

use crate::error::{AppError, AppResult};

/// Oversized bodies become 413; any other malformed part is a 400.
fn reject(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}

/// A file part received in a multipart form.
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Text fields plus at most one file part.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl MultipartForm {
    /// Drain `multipart`, keeping the part named `file_field` as the file and
    /// every other named part as text.
    pub async fn read(mut multipart: Multipart, file_field: &str) -> AppResult<Self> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(reject)?
        {
            let name = field.name().unwrap_or("").to_string();
            if name == file_field {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(reject)?;
                form.file = Some(UploadedFile {
                    file_name,
                    bytes: data.to_vec(),
                });
            } else if !name.is_empty() {
                let text = field
                    .text()
                    .await
                    .map_err(reject)?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    /// The file part, or 400 naming the missing field.
    pub fn take_file(&mut self, file_field: &str) -> AppResult<UploadedFile> {
        match self.file.take() {
            Some(file) if !file.bytes.is_empty() => Ok(file),
            Some(_) => Err(AppError::BadRequest(format!("'{file_field}' is empty"))),
            None => Err(AppError::BadRequest(format!(
                "Missing required '{file_field}' field"
            ))),
        }
    }

    /// A trimmed, non-empty text field.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn required_text(&self, name: &str) -> AppResult<String> {
        self.text(name)
            .ok_or_else(|| AppError::BadRequest(format!("Missing required '{name}' field")))
    }

    /// Parse a text field, 400 on malformed input.
    pub fn parsed<T: std::str::FromStr>(&self, name: &str) -> AppResult<Option<T>> {
        self.text(name)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|_| AppError::BadRequest(format!("Invalid value for '{name}'")))
            })
            .transpose()
    }

    /// Checkbox-style boolean: `true`/`false`/`on`/`1`/`0`.
    pub fn flag(&self, name: &str) -> AppResult<Option<bool>> {
        match self.text(name).as_deref() {
            None => Ok(None),
            Some("true" | "on" | "1") => Ok(Some(true)),
            Some("false" | "off" | "0") => Ok(Some(false)),
            Some(_) => Err(AppError::BadRequest(format!("Invalid value for '{name}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> MultipartForm {
        MultipartForm {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            file: None,
        }
    }

    #[test]
    fn blank_text_is_absent() {
        let f = form(&[("title", "  "), ("subtitle", " Hello ")]);
        assert_eq!(f.text("title"), None);
        assert_eq!(f.text("subtitle").as_deref(), Some("Hello"));
        assert!(f.required_text("title").is_err());
    }

    #[test]
    fn flags_and_numbers() {
        let f = form(&[("is_active", "on"), ("fee", "4900"), ("bad", "x")]);
        assert_eq!(f.flag("is_active").unwrap(), Some(true));
        assert_eq!(f.flag("missing").unwrap(), None);
        assert!(f.flag("bad").is_err());
        assert_eq!(f.parsed::<i64>("fee").unwrap(), Some(4900));
        assert!(f.parsed::<i64>("bad").is_err());
    }

    #[test]
    fn missing_file_is_bad_request() {
        let mut f = form(&[]);
        assert!(f.take_file("image").is_err());
    }
}
