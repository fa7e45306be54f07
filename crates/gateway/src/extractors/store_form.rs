//! Multipart store form extractor.

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
};

use common::AppError;
use directory_service_lib::infra::PhotoUpload;
use domain::StoreInput;

/// A submitted store form and its optional photo.
#[derive(Debug, Default)]
pub struct StoreForm {
    pub input: StoreInput,
    pub photo: Option<PhotoUpload>,
}

#[async_trait]
impl<S> FromRequest<S> for StoreForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;

        let mut form = StoreForm::default();
        let mut lng = None;
        let mut lat = None;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == "photo" {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let has_filename = field.file_name().is_some_and(|f| !f.is_empty());
                let bytes = field.bytes().await.map_err(multipart_error)?;
                // Browsers send an empty part when no file was chosen
                if has_filename && !bytes.is_empty() {
                    form.photo = Some(PhotoUpload {
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                continue;
            }

            let value = field.text().await.map_err(multipart_error)?;
            match name.as_str() {
                "name" => form.input.name = value,
                "description" => form.input.description = Some(value),
                "tags" | "tags[]" => form.input.tags.push(value),
                "address" | "location[address]" => form.input.address = Some(value),
                "lng" | "location[coordinates][0]" => lng = parse_coordinate(&value, "lng")?,
                "lat" | "location[coordinates][1]" => lat = parse_coordinate(&value, "lat")?,
                _ => {}
            }
        }

        if let (Some(lng), Some(lat)) = (lng, lat) {
            form.input.coordinates = Some([lng, lat]);
        }

        Ok(form)
    }
}

fn parse_coordinate(value: &str, field: &str) -> Result<Option<f64>, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| AppError::validation(format!("{} must be a number", field)))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::validation(err.body_text())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_coordinate_is_absent() {
        assert_eq!(parse_coordinate("  ", "lng").unwrap(), None);
        assert_eq!(parse_coordinate("-79.38", "lng").unwrap(), Some(-79.38));
    }

    #[test]
    fn test_garbage_coordinate_is_rejected() {
        assert!(matches!(
            parse_coordinate("east", "lat"),
            Err(AppError::Validation(msg)) if msg == "lat must be a number"
        ));
    }
}
