use sqlx::{Sqlite, SqlitePool};

use crate::{errors::RequestError, models::User};

pub async fn follow_exists_in_db(
    pool: &SqlitePool,
    user_id: i64,
    author_id: i64,
) -> Result<bool, RequestError> {
    let count = sqlx::query_scalar::<Sqlite, i64>(
        r#"
        SELECT COUNT(*) FROM follows WHERE user_id = $1 AND author_id = $2
        "#,
    )
    .bind(user_id)
    .bind(author_id)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

/// The unique (user_id, author_id) constraint turns a racing duplicate into a no-op.
pub async fn follow_user_in_db(
    pool: &SqlitePool,
    user_id: i64,
    author_id: i64,
) -> Result<bool, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        r#"
        INSERT INTO follows (user_id, author_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, author_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(author_id)
    .execute(&mut tx)
    .await?;
    tx.commit().await?;

    Ok(result.rows_affected() > 0)
}

pub async fn unfollow_user_in_db(
    pool: &SqlitePool,
    user_id: i64,
    author_id: i64,
) -> Result<bool, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        r#"
        DELETE FROM follows WHERE user_id = $1 AND author_id = $2
        "#,
    )
    .bind(user_id)
    .bind(author_id)
    .execute(&mut tx)
    .await?;
    tx.commit().await?;

    Ok(result.rows_affected() > 0)
}

pub async fn list_followed_authors_in_db(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<User>, RequestError> {
    let authors = sqlx::query_as::<Sqlite, User>(
        r#"
        SELECT users.id, users.username, users.email, users.password, users.created_at
        FROM   follows
            JOIN users
                ON users.id = follows.author_id
        WHERE  follows.user_id = $1
        ORDER  BY users.username
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(authors)
}
