//! File upload endpoint

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
};
use bytes::Bytes;
use uuid::Uuid;

use crate::server::state::AppState;

/// POST / - Accept a file and process it in the background
///
/// Always answers `202 Accepted` before the pipeline runs. Outcomes are only
/// visible through the report endpoints and the log.
pub async fn receive_file(State(state): State<AppState>, mut multipart: Multipart) -> StatusCode {
    let mut display_name: Option<String> = None;
    let mut upload: Option<(Option<String>, Bytes)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Failed to read multipart field: {}", e);
                break;
            }
        };

        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "name" => match field.text().await {
                Ok(name) => display_name = Some(name),
                Err(e) => tracing::warn!("Failed to read name field: {}", e),
            },
            "data" => {
                let file_name = field.file_name().map(|s| s.to_string());
                match field.bytes().await {
                    Ok(data) => upload = Some((file_name, data)),
                    Err(e) => tracing::error!(
                        "Failed to read upload {}: {}",
                        file_name.as_deref().unwrap_or("<unnamed>"),
                        e
                    ),
                }
            }
            other => tracing::debug!("Ignoring multipart field '{}'", other),
        }
    }

    match upload {
        Some((file_name, data)) => {
            let name = display_name
                .or(file_name)
                .unwrap_or_else(|| format!("file_{}", Uuid::new_v4()));
            tracing::info!("Accepted file: {} ({} bytes)", name, data.len());
            drop(state.submit(name, data));
        }
        None => tracing::error!("Upload without readable data field; nothing to process"),
    }

    StatusCode::ACCEPTED
}
