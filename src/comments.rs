use tracing::info;

use crate::data_formats::CommentForm;
use crate::errors::RequestError;
use crate::models::{Comment, NewComment};
use crate::posts::find_post;
use crate::store::ContentStore;

/// Attaches a comment to the post `username`/`post_id`. The post is looked up
/// before the text is validated, so a missing post is NOT-FOUND even when the
/// text is empty. Comments are visible as soon as this returns.
pub async fn add_comment(
    store: &dyn ContentStore,
    author_id: i64,
    username: &str,
    post_id: i64,
    form: CommentForm,
) -> Result<Comment, RequestError> {
    let post = find_post(store, username, post_id).await?;
    let text = form.clean()?;
    let comment = store
        .insert_comment(NewComment {
            post_id: post.id,
            author_id,
            text,
        })
        .await?;
    info!(comment_id = comment.id, post_id, author_id, "added comment");
    Ok(comment)
}

pub async fn comments_for_post(
    store: &dyn ContentStore,
    post_id: i64,
) -> Result<Vec<Comment>, RequestError> {
    store.list_comments(post_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mock::MemoryStore;

    fn form(text: &str) -> CommentForm {
        CommentForm {
            text: text.to_owned(),
        }
    }

    #[tokio::test]
    async fn comment_is_visible_immediately() {
        let store = MemoryStore::default();
        let leo = store.add_user("leo").await;
        let ann = store.add_user("ann").await;
        let post = store.add_post(&leo, "post", None).await;

        let comment = add_comment(&store, ann.id, "leo", post.id, form(" nice "))
            .await
            .unwrap();
        assert_eq!(comment.text, "nice");
        assert_eq!(comment.author_username, "ann");

        let comments = comments_for_post(&store, post.id).await.unwrap();
        assert_eq!(comments, vec![comment]);
    }

    #[tokio::test]
    async fn empty_comment_is_rejected_and_not_stored() {
        let store = MemoryStore::default();
        let leo = store.add_user("leo").await;
        let post = store.add_post(&leo, "post", None).await;

        let result = add_comment(&store, leo.id, "leo", post.id, form("   ")).await;
        assert!(matches!(result, Err(RequestError::Validation(_))));
        assert!(comments_for_post(&store, post.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn comment_on_missing_post_is_not_found() {
        let store = MemoryStore::default();
        let leo = store.add_user("leo").await;

        let result = add_comment(&store, leo.id, "leo", 42, form("")).await;
        assert!(matches!(result, Err(RequestError::NotFound(_))));
    }
}
