//! Creating, editing and looking up single posts.
use tracing::{debug, info};

use crate::comments::comments_for_post;
use crate::data_formats::{PostForm, INVALID_GROUP};
use crate::errors::{FieldErrors, RequestError};
use crate::media::{inspect_image, MediaStore, ValidImage, INVALID_IMAGE};
use crate::models::{Comment, NewPost, Post, PostChanges};
use crate::store::ContentStore;

/// A post as addressed by its author's username and its id. A username that
/// does not match the author is treated like a missing post.
pub async fn find_post(
    store: &dyn ContentStore,
    username: &str,
    post_id: i64,
) -> Result<Post, RequestError> {
    match store.get_post(post_id).await? {
        Some(post) if post.author_username == username => Ok(post),
        _ => Err(RequestError::NotFound("Post not found")),
    }
}

#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: Post,
    pub comments: Vec<Comment>,
}

pub async fn post_detail(
    store: &dyn ContentStore,
    username: &str,
    post_id: i64,
) -> Result<PostDetail, RequestError> {
    let post = find_post(store, username, post_id).await?;
    let comments = comments_for_post(store, post.id).await?;
    Ok(PostDetail { post, comments })
}

/// Only the author may edit. Everyone else is sent back to the post.
pub fn ensure_author(post: &Post, editor_id: Option<i64>) -> Result<(), RequestError> {
    if editor_id == Some(post.author_id) {
        Ok(())
    } else {
        debug!(post_id = post.id, ?editor_id, "edit by non-author refused");
        Err(RequestError::PermissionDenied {
            redirect_to: post.url(),
        })
    }
}

struct CleanPost {
    text: String,
    group_id: Option<i64>,
    image: Option<ValidImage>,
}

async fn clean_post_form(
    store: &dyn ContentStore,
    form: &mut PostForm,
) -> Result<CleanPost, RequestError> {
    let mut errors = FieldErrors::new();
    let (text, mut group_id) = form.clean_fields(&mut errors);

    if let Some(id) = group_id {
        if store.get_group_by_id(id).await?.is_none() {
            errors.add("group", INVALID_GROUP);
            group_id = None;
        }
    }

    let image = match form.take_image() {
        Some(upload) => {
            let image = inspect_image(upload).await?;
            if image.is_none() {
                errors.add("image", INVALID_IMAGE);
            }
            image
        }
        None => None,
    };

    errors.into_result(CleanPost {
        text,
        group_id,
        image,
    })
}

pub async fn create_post(
    store: &dyn ContentStore,
    media: &MediaStore,
    author_id: i64,
    mut form: PostForm,
) -> Result<Post, RequestError> {
    let clean = clean_post_form(store, &mut form).await?;
    let image = match clean.image {
        Some(image) => Some(media.save(image).await?),
        None => None,
    };
    let inserted = store
        .insert_post(NewPost {
            author_id,
            text: clean.text,
            group_id: clean.group_id,
            image: image.clone(),
        })
        .await;
    if let (Err(_), Some(name)) = (&inserted, &image) {
        media.discard(name).await;
    }
    let post = inserted?;
    info!(post_id = post.id, author_id, "created post");
    Ok(post)
}

/// Author and creation time are kept. An omitted image keeps the current one
/// unless the form asks to clear it; an omitted group clears the group.
pub async fn edit_post(
    store: &dyn ContentStore,
    media: &MediaStore,
    editor_id: Option<i64>,
    username: &str,
    post_id: i64,
    mut form: PostForm,
) -> Result<Post, RequestError> {
    let post = find_post(store, username, post_id).await?;
    ensure_author(&post, editor_id)?;

    let clean = clean_post_form(store, &mut form).await?;
    let saved = match clean.image {
        Some(image) => Some(media.save(image).await?),
        None => None,
    };
    let image = match &saved {
        Some(name) => Some(name.clone()),
        None if form.clear_image => None,
        None => post.image,
    };
    let updated = store
        .update_post(
            post.id,
            PostChanges {
                text: clean.text,
                group_id: clean.group_id,
                image,
            },
        )
        .await;
    if let (Err(_), Some(name)) = (&updated, &saved) {
        media.discard(name).await;
    }
    let post = updated?;
    info!(post_id = post.id, "edited post");
    Ok(post)
}
