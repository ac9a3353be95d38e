// handlers/post_image.rs - PUT /post-image handler
//
// Images travel outside GraphQL (which only speaks JSON): the client uploads
// here first, then sends the returned path through a mutation.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::error::{ApiResult, BusinessError};
use crate::middleware::RequestContext;
use crate::storage::{UploadDescriptor, UploadSink};

pub const IMAGE_FIELD: &str = "image";
pub const OLD_PATH_FIELD: &str = "oldPath";
pub const NO_FILE_MESSAGE: &str = "No file provided!";
pub const STORED_MESSAGE: &str = "File stored";
pub const UNEXPECTED_FIELD_MESSAGE: &str = "Unexpected field";

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStored {
    pub message: &'static str,
    /// Echoes the caller's `oldPath`, not the newly stored path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

#[derive(Debug, Default)]
struct ImageUpload {
    stored: Option<UploadDescriptor>,
    old_path: Option<String>,
    image_seen: bool,
}

/**
 * PUT /post-image - store a replacement image, optionally deleting the old one
 *
 * Multipart input:
 *   image   (file, optional)   png/jpg/jpeg only, other types are dropped
 *   oldPath (text, optional)   storage path of the asset being replaced
 *
 * A second `image` file, or a file under any other field name, is a 400
 * "Unexpected field". Any failure while reading the body removes the image
 * already stored by this request.
 *
 * 401 envelope when unauthenticated (body is never read),
 * 200 {"message":"No file provided!"} when no acceptable file arrived,
 * 201 {"message":"File stored","filePath":<oldPath>} otherwise.
 */
pub async fn post_image(
    State(uploads): State<Arc<UploadSink>>,
    context: RequestContext,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Response> {
    let identity = context.require_authenticated()?;

    let upload = match multipart {
        Ok(multipart) => read_upload(&uploads, multipart).await?,
        Err(rejection) => {
            // Not a multipart body: nothing to ingest
            tracing::debug!(reason = %rejection.body_text(), "post-image without multipart body");
            ImageUpload::default()
        }
    };

    let Some(stored) = upload.stored else {
        return Ok((StatusCode::OK, Json(MessageBody { message: NO_FILE_MESSAGE })).into_response());
    };

    if let Some(old_path) = upload.old_path.as_deref().filter(|p| !p.trim().is_empty()) {
        uploads.delete(old_path).await;
    }

    tracing::info!(
        user_id = %identity.user_id,
        stored = %stored.storage_path,
        replaced = ?upload.old_path,
        "post image stored"
    );

    Ok((
        StatusCode::CREATED,
        Json(ImageStored {
            message: STORED_MESSAGE,
            file_path: upload.old_path,
        }),
    )
        .into_response())
}

async fn read_upload(uploads: &UploadSink, multipart: Multipart) -> ApiResult<ImageUpload> {
    let mut upload = ImageUpload::default();

    match read_fields(uploads, multipart, &mut upload).await {
        Ok(()) => Ok(upload),
        Err(err) => {
            // Failed request: drop the image it already stored
            if let Some(stored) = upload.stored.take() {
                uploads.delete(&stored.storage_path).await;
            }
            Err(err)
        }
    }
}

async fn read_fields(uploads: &UploadSink, mut multipart: Multipart, upload: &mut ImageUpload) -> ApiResult<()> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        let file_name = field.file_name().map(str::to_owned);

        match (name.as_deref(), file_name) {
            (Some(IMAGE_FIELD), Some(original_name)) => {
                if upload.image_seen {
                    return Err(BusinessError::bad_request(UNEXPECTED_FIELD_MESSAGE).into());
                }
                upload.image_seen = true;

                let mime_type = field.content_type().unwrap_or_default().to_owned();
                let bytes = field.bytes().await?;
                upload.stored = uploads.store(&original_name, &mime_type, &bytes).await?;
            }
            (other, Some(_)) => {
                tracing::debug!(field = ?other, "rejecting file under unexpected field");
                return Err(BusinessError::bad_request(UNEXPECTED_FIELD_MESSAGE).into());
            }
            (Some(OLD_PATH_FIELD), None) => {
                upload.old_path = Some(field.text().await?);
            }
            (other, None) => {
                tracing::debug!(field = ?other, "ignoring multipart field");
            }
        }
    }

    Ok(())
}
