use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use base64::Engine;

use crate::app_state::AppState;
use crate::db::queries;
use crate::models::news::{NewsDraft, NewsItem};
use crate::routes::{ApiError, AuthUser};

/// Fields pulled out of a multipart news submission.
#[derive(Default)]
struct NewsForm {
    title: Option<String>,
    content: Option<String>,
    image: Option<String>,
}

async fn read_news_form(mut multipart: Multipart) -> Result<NewsForm, ApiError> {
    let mut form = NewsForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::Validation("malformed multipart body".to_string()))?
    {
        match field.name() {
            Some("title") => {
                form.title = Some(field.text().await.map_err(|_| {
                    ApiError::Validation("unreadable title field".to_string())
                })?);
            }
            Some("content") => {
                form.content = Some(field.text().await.map_err(|_| {
                    ApiError::Validation("unreadable content field".to_string())
                })?);
            }
            Some("image") => {
                let data = field.bytes().await.map_err(|_| {
                    ApiError::Validation("unreadable image field".to_string())
                })?;
                if data.is_empty() {
                    continue;
                }
                image::guess_format(&data)
                    .map_err(|_| ApiError::Validation("unsupported image format".to_string()))?;
                form.image = Some(base64::engine::general_purpose::STANDARD.encode(&data));
            }
            _ => {}
        }
    }

    Ok(form)
}

/// POST /api/v1/news — publish a news item.
pub async fn create_news(
    State(state): State<AppState>,
    _user: AuthUser,
    multipart: Multipart,
) -> Result<Json<NewsItem>, ApiError> {
    let form = read_news_form(multipart).await?;

    let (Some(title), Some(content)) = (form.title, form.content) else {
        return Err(ApiError::Validation(
            "title and content are required".to_string(),
        ));
    };
    if title.trim().is_empty() || content.trim().is_empty() {
        return Err(ApiError::Validation(
            "title and content must not be empty".to_string(),
        ));
    }

    let item = queries::insert_news(
        &state.db,
        &NewsDraft {
            title,
            content,
            image: form.image,
        },
    )
    .await?;

    Ok(Json(item))
}

/// GET /api/v1/news — the full feed, newest first.
pub async fn list_news(State(state): State<AppState>) -> Result<Json<Vec<NewsItem>>, ApiError> {
    Ok(Json(queries::list_news(&state.db).await?))
}

/// GET /api/v1/news/{id}
pub async fn get_news(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<NewsItem>, ApiError> {
    queries::get_news(&state.db, id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("news item"))
}

/// PUT /api/v1/news/{id} — partial update; a missing image keeps the stored
/// one.
pub async fn update_news(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<NewsItem>, ApiError> {
    let existing = queries::get_news(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("news item"))?;

    let form = read_news_form(multipart).await?;
    let draft = NewsDraft {
        title: form
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(existing.title),
        content: form
            .content
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(existing.content),
        image: form.image.or(existing.image),
    };

    queries::update_news(&state.db, id, &draft)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("news item"))
}

/// DELETE /api/v1/news/{id}
pub async fn delete_news(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if queries::delete_news(&state.db, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("news item"))
    }
}
