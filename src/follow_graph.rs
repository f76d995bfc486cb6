//! Directed "user follows author" edges.
//!
//! Following is idempotent: a self-follow or a repeated follow is a no-op, as
//! is unfollowing someone you don't follow. None of these are errors.
use tracing::debug;

use crate::errors::RequestError;
use crate::models::User;
use crate::store::ContentStore;

pub async fn find_author(store: &dyn ContentStore, username: &str) -> Result<User, RequestError> {
    store
        .get_user_by_username(username)
        .await?
        .ok_or(RequestError::NotFound("User not found"))
}

/// Anonymous viewers follow nobody.
pub async fn is_following(
    store: &dyn ContentStore,
    viewer_id: Option<i64>,
    author_id: i64,
) -> Result<bool, RequestError> {
    match viewer_id {
        Some(viewer_id) => store.follow_exists(viewer_id, author_id).await,
        None => Ok(false),
    }
}

/// Returns whether a new edge was created.
pub async fn follow(
    store: &dyn ContentStore,
    viewer_id: i64,
    author: &User,
) -> Result<bool, RequestError> {
    if viewer_id == author.id {
        debug!(viewer_id, "ignoring self-follow");
        return Ok(false);
    }
    if store.follow_exists(viewer_id, author.id).await? {
        return Ok(false);
    }
    let created = store.insert_follow(viewer_id, author.id).await?;
    if created {
        debug!(viewer_id, author_id = author.id, "followed author");
    }
    Ok(created)
}

/// Returns whether an edge was removed.
pub async fn unfollow(
    store: &dyn ContentStore,
    viewer_id: i64,
    author: &User,
) -> Result<bool, RequestError> {
    let removed = store.delete_follow(viewer_id, author.id).await?;
    if removed {
        debug!(viewer_id, author_id = author.id, "unfollowed author");
    }
    Ok(removed)
}

pub async fn followed_authors(
    store: &dyn ContentStore,
    viewer_id: i64,
) -> Result<Vec<User>, RequestError> {
    store.list_followed_authors(viewer_id).await
}
