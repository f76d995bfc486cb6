use sqlx::{Sqlite, SqlitePool};

use crate::{
    errors::RequestError,
    models::{Group, NewGroup},
};

pub async fn insert_group_in_db(pool: &SqlitePool, group: NewGroup) -> Result<Group, RequestError> {
    let mut tx = pool.begin().await?;
    let group = sqlx::query_as::<Sqlite, Group>(
        r#"
        INSERT INTO post_groups (slug, title, description)
        VALUES ($1, $2, $3)
        RETURNING id, slug, title, description
        "#,
    )
    .bind(group.slug)
    .bind(group.title)
    .bind(group.description)
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(group)
}

pub async fn get_group_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Group>, RequestError> {
    let group = sqlx::query_as::<Sqlite, Group>(
        "SELECT id, slug, title, description FROM post_groups WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(group)
}

pub async fn get_group_by_slug(
    pool: &SqlitePool,
    slug: &str,
) -> Result<Option<Group>, RequestError> {
    let group = sqlx::query_as::<Sqlite, Group>(
        "SELECT id, slug, title, description FROM post_groups WHERE slug = $1",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;
    Ok(group)
}

pub async fn list_groups_in_db(pool: &SqlitePool) -> Result<Vec<Group>, RequestError> {
    let groups = sqlx::query_as::<Sqlite, Group>(
        "SELECT id, slug, title, description FROM post_groups ORDER BY title",
    )
    .fetch_all(pool)
    .await?;
    Ok(groups)
}
