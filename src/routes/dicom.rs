use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use futures::TryStreamExt;
use serde_json::Value;

use crate::app_state::AppState;
use crate::models::dicom::{SeriesSummary, StudySummary};
use crate::routes::{ApiError, AuthUser};

/// GET /api/v1/studies — every study on the PACS, with summary details.
pub async fn list_studies(
    State(state): State<AppState>,
) -> Result<Json<Vec<StudySummary>>, ApiError> {
    let ids = state.pacs.list_studies().await?;

    let mut studies = Vec::with_capacity(ids.len());
    for id in ids {
        let details = state.pacs.study_details(&id).await?;
        studies.push(StudySummary::from(details));
    }

    Ok(Json(studies))
}

/// DELETE /api/v1/studies/{study_id}
pub async fn delete_study(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(study_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.pacs.delete_study(&study_id).await?;
    tracing::info!(study_id = %study_id, "study deleted from PACS");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/studies/{study_id}/series — series summaries of one study.
pub async fn list_series(
    State(state): State<AppState>,
    Path(study_id): Path<String>,
) -> Result<Json<Vec<SeriesSummary>>, ApiError> {
    let study = state.pacs.study_details(&study_id).await?;

    let mut series = Vec::with_capacity(study.series.len());
    for series_id in &study.series {
        let details = state.pacs.series_details(series_id).await?;
        series.push(SeriesSummary::from(details));
    }

    Ok(Json(series))
}

/// GET /api/v1/series/{series_id}/instances — instance ids of one series.
pub async fn list_instances(
    State(state): State<AppState>,
    Path(series_id): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    let details = state.pacs.series_details(&series_id).await?;
    Ok(Json(details.instances))
}

/// GET /api/v1/instances/{instance_id}/tags — simplified DICOM tag map.
pub async fn instance_tags(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.pacs.instance_tags(&instance_id).await?))
}

/// GET /api/v1/studies/{study_id}/archive — synchronous zip download.
///
/// The PACS builds the archive inline; the body is streamed through without
/// buffering it in memory.
pub async fn download_archive(
    State(state): State<AppState>,
    Path(study_id): Path<String>,
) -> Result<Response, ApiError> {
    let upstream = state.pacs.download_archive(&study_id).await?;
    let stream = upstream.bytes_stream().map_err(std::io::Error::other);

    Response::builder()
        .header(header::CONTENT_TYPE, "application/zip")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{study_id}.zip\""),
        )
        .body(Body::from_stream(stream))
        .map_err(|_| ApiError::Internal)
}

/// POST /api/v1/dicom — forward an uploaded DICOM file to the PACS.
pub async fn upload_dicom(
    State(state): State<AppState>,
    _user: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::Validation("malformed multipart body".to_string()))?
    {
        if field.name() == Some("file") {
            let data = field.bytes().await.map_err(|_| {
                ApiError::Validation("unreadable DICOM file field".to_string())
            })?;
            if data.is_empty() {
                break;
            }
            let receipt = state.pacs.upload_instance(data.to_vec()).await?;
            return Ok(Json(serde_json::json!({
                "message": "DICOM file uploaded successfully",
                "response": receipt,
            })));
        }
    }

    Err(ApiError::Validation("missing DICOM file field".to_string()))
}
