use crate::error::{AppError, ValidationError};
use crate::models::{NewScreenshot, ScreenshotPatch};
use crate::uploads::UploadedImage;
use axum::extract::Multipart;
use std::collections::HashMap;

/// Raw multipart submission for a screenshot: text parts plus an optional image part.
#[derive(Debug, Default)]
pub struct ScreenshotForm {
    pub fields: HashMap<String, String>,
    pub image: Option<UploadedImage>,
}

impl ScreenshotForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == "image" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                if file_name.is_empty() && data.is_empty() {
                    continue;
                }
                form.image = Some(UploadedImage {
                    file_name,
                    content_type,
                    data,
                });
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    fn required(&self, name: &'static str) -> Result<String, ValidationError> {
        match self.text(name).map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value.to_string()),
            _ => Err(ValidationError::MissingField(name)),
        }
    }

    /// Present fields must be non-blank; absent ones stay `None`.
    fn optional_required(&self, name: &'static str) -> Result<Option<String>, ValidationError> {
        match self.text(name) {
            Some(_) => self.required(name).map(Some),
            None => Ok(None),
        }
    }

    fn list(&self, name: &str) -> Option<Vec<String>> {
        self.text(name)
            .filter(|raw| !raw.trim().is_empty())
            .map(parse_list)
    }

    pub fn to_new_screenshot(&self, image_path: String) -> Result<NewScreenshot, ValidationError> {
        Ok(NewScreenshot {
            title: self.required("title")?,
            image_path,
            description: self.text("description").map(str::to_string),
            app: self.required("app")?,
            genre: self.required("genre")?,
            screen_task: self.required("screenTask")?,
            ui_elements: self.list("uiElements").unwrap_or_default(),
            tags: self.list("tags").unwrap_or_default(),
        })
    }

    /// Blank list fields leave the stored lists untouched.
    pub fn to_patch(&self, image_path: Option<String>) -> Result<ScreenshotPatch, ValidationError> {
        Ok(ScreenshotPatch {
            title: self.optional_required("title")?,
            image_path,
            description: self.text("description").map(str::to_string),
            app: self.optional_required("app")?,
            genre: self.optional_required("genre")?,
            screen_task: self.optional_required("screenTask")?,
            ui_elements: self.list("uiElements"),
            tags: self.list("tags"),
        })
    }
}

/// Splits a comma-separated list, trimming entries and dropping blanks.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
