use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::errors::RequestError;
use crate::models::{
    Comment, Group, NewComment, NewGroup, NewPost, NewUser, Post, PostChanges, User,
};
use crate::store::{ContentStore, PostFilter};

mod comment_helpers;
mod follow_helpers;
mod group_helpers;
mod post_helpers;
mod user_helpers;

pub use comment_helpers::*;
pub use follow_helpers::*;
pub use group_helpers::*;
pub use post_helpers::*;
pub use user_helpers::*;

/// [`ContentStore`] backed by a SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentStore for SqliteStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, RequestError> {
        insert_user_in_db(&self.pool, user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, RequestError> {
        get_user_by_id(&self.pool, id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, RequestError> {
        get_user_by_username(&self.pool, username).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, RequestError> {
        get_user_by_email(&self.pool, email).await
    }

    async fn insert_group(&self, group: NewGroup) -> Result<Group, RequestError> {
        insert_group_in_db(&self.pool, group).await
    }

    async fn get_group_by_id(&self, id: i64) -> Result<Option<Group>, RequestError> {
        get_group_by_id(&self.pool, id).await
    }

    async fn get_group_by_slug(&self, slug: &str) -> Result<Option<Group>, RequestError> {
        get_group_by_slug(&self.pool, slug).await
    }

    async fn list_groups(&self) -> Result<Vec<Group>, RequestError> {
        list_groups_in_db(&self.pool).await
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post, RequestError> {
        create_post_in_db(&self.pool, post).await
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, RequestError> {
        get_post_by_id_in_db(&self.pool, id).await
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> Result<Post, RequestError> {
        update_post_in_db(&self.pool, id, changes).await
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<usize, RequestError> {
        count_posts_in_db(&self.pool, filter).await
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Post>, RequestError> {
        list_posts_in_db(&self.pool, filter, limit, offset).await
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, RequestError> {
        add_comment_to_post_in_db(&self.pool, comment).await
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, RequestError> {
        get_comments_for_post_in_db(&self.pool, post_id).await
    }

    async fn follow_exists(&self, user_id: i64, author_id: i64) -> Result<bool, RequestError> {
        follow_exists_in_db(&self.pool, user_id, author_id).await
    }

    async fn insert_follow(&self, user_id: i64, author_id: i64) -> Result<bool, RequestError> {
        follow_user_in_db(&self.pool, user_id, author_id).await
    }

    async fn delete_follow(&self, user_id: i64, author_id: i64) -> Result<bool, RequestError> {
        unfollow_user_in_db(&self.pool, user_id, author_id).await
    }

    async fn list_followed_authors(&self, user_id: i64) -> Result<Vec<User>, RequestError> {
        list_followed_authors_in_db(&self.pool, user_id).await
    }
}
