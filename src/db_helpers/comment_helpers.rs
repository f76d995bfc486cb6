use chrono::Utc;
use sqlx::{Sqlite, SqlitePool};

use crate::{
    errors::RequestError,
    models::{Comment, NewComment},
};

const COMMENT_QUERY: &str = r#"
            SELECT comments.id         AS "id",
                   comments.text       AS "text",
                   comments.created_at AS "created_at",
                   comments.post_id    AS "post_id",
                   comments.author_id  AS "author_id",
                   users.username      AS "author_username"
            FROM   comments
                JOIN users
                    ON users.id = comments.author_id
"#;

pub async fn add_comment_to_post_in_db(
    pool: &SqlitePool,
    NewComment {
        post_id,
        author_id,
        text,
    }: NewComment,
) -> Result<Comment, RequestError> {
    let mut tx = pool.begin().await?;

    let post = sqlx::query_scalar::<Sqlite, i64>("SELECT id FROM posts WHERE id = $1")
        .bind(post_id)
        .fetch_optional(&mut tx)
        .await?;
    if post.is_none() {
        return Err(RequestError::NotFound("Post not found"));
    }

    let id = sqlx::query_scalar::<Sqlite, i64>(
        r#"
        INSERT INTO comments (text, created_at, post_id, author_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(text)
    .bind(Utc::now())
    .bind(post_id)
    .bind(author_id)
    .fetch_one(&mut tx)
    .await?;

    let query = format!("{COMMENT_QUERY} WHERE comments.id = $1");
    let comment = sqlx::query_as::<Sqlite, Comment>(&query)
        .bind(id)
        .fetch_one(&mut tx)
        .await?;
    tx.commit().await?;

    Ok(comment)
}

pub async fn get_comments_for_post_in_db(
    pool: &SqlitePool,
    post_id: i64,
) -> Result<Vec<Comment>, RequestError> {
    let query = format!(
        "{COMMENT_QUERY} WHERE comments.post_id = $1 ORDER BY comments.created_at, comments.id"
    );
    let comments = sqlx::query_as::<Sqlite, Comment>(&query)
        .bind(post_id)
        .fetch_all(pool)
        .await?;
    Ok(comments)
}
