use chrono::Utc;
use sqlx::{Sqlite, SqlitePool};

use crate::errors::RequestError;
use crate::models::{NewPost, Post, PostChanges};
use crate::store::PostFilter;

const POST_QUERY: &str = r#"
            SELECT posts.id          AS "id",
                   posts.text        AS "text",
                   posts.image       AS "image",
                   posts.created_at  AS "created_at",
                   posts.author_id   AS "author_id",
                   users.username    AS "author_username",
                   posts.group_id    AS "group_id",
                   post_groups.slug  AS "group_slug",
                   post_groups.title AS "group_title"
            FROM   posts
                JOIN users
                    ON users.id = posts.author_id
                LEFT JOIN post_groups
                    ON post_groups.id = posts.group_id
"#;

// $1 group, $2 author, $3 follower
const POST_FILTER: &str = r#"
            WHERE  ( posts.group_id = $1
                    OR $1 IS NULL )
                AND ( posts.author_id = $2
                        OR $2 IS NULL )
                AND ( $3 IS NULL
                        OR EXISTS (SELECT 1
                                   FROM   follows
                                   WHERE  follows.author_id = posts.author_id
                                       AND follows.user_id = $3) )
"#;

pub async fn get_post_by_id_in_db(pool: &SqlitePool, id: i64) -> Result<Option<Post>, RequestError> {
    let query = format!("{POST_QUERY} WHERE posts.id = $1");
    let post = sqlx::query_as::<Sqlite, Post>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(post)
}

pub async fn count_posts_in_db(pool: &SqlitePool, filter: PostFilter) -> Result<usize, RequestError> {
    let query = format!("SELECT COUNT(*) FROM posts {POST_FILTER}");
    let count = sqlx::query_scalar::<Sqlite, i64>(&query)
        .bind(filter.group_id)
        .bind(filter.author_id)
        .bind(filter.followed_by)
        .fetch_one(pool)
        .await?;
    Ok(usize::try_from(count).unwrap_or_default())
}

pub async fn list_posts_in_db(
    pool: &SqlitePool,
    filter: PostFilter,
    limit: usize,
    offset: usize,
) -> Result<Vec<Post>, RequestError> {
    let query = format!(
        "{POST_QUERY} {POST_FILTER} ORDER BY posts.created_at DESC, posts.id DESC LIMIT $4 OFFSET $5"
    );
    let posts = sqlx::query_as::<Sqlite, Post>(&query)
        .bind(filter.group_id)
        .bind(filter.author_id)
        .bind(filter.followed_by)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(pool)
        .await?;
    Ok(posts)
}

pub async fn create_post_in_db(
    pool: &SqlitePool,
    NewPost {
        author_id,
        text,
        group_id,
        image,
    }: NewPost,
) -> Result<Post, RequestError> {
    let mut tx = pool.begin().await?;

    let id = sqlx::query_scalar::<Sqlite, i64>(
        r#"
        INSERT INTO posts (text, image, created_at, author_id, group_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(text)
    .bind(image)
    .bind(Utc::now())
    .bind(author_id)
    .bind(group_id)
    .fetch_one(&mut tx)
    .await?;

    let query = format!("{POST_QUERY} WHERE posts.id = $1");
    let post = sqlx::query_as::<Sqlite, Post>(&query)
        .bind(id)
        .fetch_one(&mut tx)
        .await?;

    tx.commit().await?;
    Ok(post)
}

pub async fn update_post_in_db(
    pool: &SqlitePool,
    id: i64,
    PostChanges {
        text,
        group_id,
        image,
    }: PostChanges,
) -> Result<Post, RequestError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE posts SET text = $1, group_id = $2, image = $3
        WHERE posts.id = $4
        "#,
    )
    .bind(text)
    .bind(group_id)
    .bind(image)
    .bind(id)
    .execute(&mut tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("Post not found"));
    }

    let query = format!("{POST_QUERY} WHERE posts.id = $1");
    let post = sqlx::query_as::<Sqlite, Post>(&query)
        .bind(id)
        .fetch_one(&mut tx)
        .await?;

    tx.commit().await?;
    Ok(post)
}
