use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::models::news::{NewsDraft, NewsItem};
use crate::models::user::User;

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        hashed_password: row.try_get("hashed_password")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
    })
}

fn news_from_row(row: &PgRow) -> Result<NewsItem, sqlx::Error> {
    Ok(NewsItem {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        image: row.try_get("image")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Insert a new portal account
pub async fn create_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    hashed_password: &str,
) -> Result<User, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO users (username, email, hashed_password)
        VALUES ($1, $2, $3)
        RETURNING id, username, email, hashed_password, is_active, created_at
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(hashed_password)
    .fetch_one(pool)
    .await?;

    user_from_row(&row)
}

/// Look up an account by email
pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, username, email, hashed_password, is_active, created_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    row.map(|r| user_from_row(&r)).transpose()
}

/// Publish a news item
pub async fn insert_news(pool: &PgPool, draft: &NewsDraft) -> Result<NewsItem, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO news (title, content, image)
        VALUES ($1, $2, $3)
        RETURNING id, title, content, image, created_at
        "#,
    )
    .bind(&draft.title)
    .bind(&draft.content)
    .bind(&draft.image)
    .fetch_one(pool)
    .await?;

    news_from_row(&row)
}

/// All news items, newest first
pub async fn list_news(pool: &PgPool) -> Result<Vec<NewsItem>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, title, content, image, created_at
        FROM news
        ORDER BY id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(news_from_row).collect()
}

/// A single news item by id
pub async fn get_news(pool: &PgPool, news_id: i64) -> Result<Option<NewsItem>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, title, content, image, created_at
        FROM news
        WHERE id = $1
        "#,
    )
    .bind(news_id)
    .fetch_optional(pool)
    .await?;

    row.map(|r| news_from_row(&r)).transpose()
}

/// Replace a news item, returning the updated row or None if absent
pub async fn update_news(
    pool: &PgPool,
    news_id: i64,
    draft: &NewsDraft,
) -> Result<Option<NewsItem>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        UPDATE news
        SET title = $1, content = $2, image = $3
        WHERE id = $4
        RETURNING id, title, content, image, created_at
        "#,
    )
    .bind(&draft.title)
    .bind(&draft.content)
    .bind(&draft.image)
    .bind(news_id)
    .fetch_optional(pool)
    .await?;

    row.map(|r| news_from_row(&r)).transpose()
}

/// Delete a news item; false if it did not exist
pub async fn delete_news(pool: &PgPool, news_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM news WHERE id = $1")
        .bind(news_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
