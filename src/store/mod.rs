//! The persistence collaborator. Everything the core needs from storage goes
//! through [`ContentStore`], so feed and follow logic can run against SQLite in
//! production and against an in-memory store in unit tests.
#[cfg(test)]
pub mod mock;

use async_trait::async_trait;

use crate::errors::RequestError;
use crate::models::{
    Comment, Group, NewComment, NewGroup, NewPost, NewUser, Post, PostChanges, User,
};

/// Conjunctive post filter. Unset fields don't filter.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PostFilter {
    pub group_id: Option<i64>,
    pub author_id: Option<i64>,
    /// Only posts by authors this user follows.
    pub followed_by: Option<i64>,
}

impl PostFilter {
    pub fn group(group_id: i64) -> Self {
        Self {
            group_id: Some(group_id),
            ..Default::default()
        }
    }

    pub fn author(author_id: i64) -> Self {
        Self {
            author_id: Some(author_id),
            ..Default::default()
        }
    }

    pub fn followed_by(user_id: i64) -> Self {
        Self {
            followed_by: Some(user_id),
            ..Default::default()
        }
    }
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn insert_user(&self, user: NewUser) -> Result<User, RequestError>;
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, RequestError>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, RequestError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, RequestError>;

    async fn insert_group(&self, group: NewGroup) -> Result<Group, RequestError>;
    async fn get_group_by_id(&self, id: i64) -> Result<Option<Group>, RequestError>;
    async fn get_group_by_slug(&self, slug: &str) -> Result<Option<Group>, RequestError>;
    async fn list_groups(&self) -> Result<Vec<Group>, RequestError>;

    async fn insert_post(&self, post: NewPost) -> Result<Post, RequestError>;
    async fn get_post(&self, id: i64) -> Result<Option<Post>, RequestError>;
    /// Rewrites the editable fields. Author and creation time are untouched.
    async fn update_post(&self, id: i64, changes: PostChanges) -> Result<Post, RequestError>;
    async fn count_posts(&self, filter: PostFilter) -> Result<usize, RequestError>;
    /// Matching posts, newest first (see [`Post::newest_first`]).
    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Post>, RequestError>;

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, RequestError>;
    /// Comments on a post, oldest first.
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, RequestError>;

    async fn follow_exists(&self, user_id: i64, author_id: i64) -> Result<bool, RequestError>;
    /// Returns `false` when the edge already existed. Must be atomic against
    /// concurrent inserts of the same pair.
    async fn insert_follow(&self, user_id: i64, author_id: i64) -> Result<bool, RequestError>;
    /// Returns `false` when there was no edge to remove.
    async fn delete_follow(&self, user_id: i64, author_id: i64) -> Result<bool, RequestError>;
    async fn list_followed_authors(&self, user_id: i64) -> Result<Vec<User>, RequestError>;
}
