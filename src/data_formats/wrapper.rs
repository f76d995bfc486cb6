//! Page contexts handed to the renderer, and the JSON envelopes of the
//! authentication endpoints.
use serde::{Deserialize, Serialize};

use super::response::{
    CommentResponse, GroupResponse, PageResponse, PostResponse, ProfileResponse,
};
use crate::feed::Feed;

#[derive(Debug, Deserialize, Serialize)]
pub struct UserWrapper<T> {
    pub user: T,
}

impl<T> UserWrapper<T> {
    pub fn wrap_with_user_data(request: T) -> UserWrapper<T> {
        UserWrapper { user: request }
    }
}

#[derive(Debug, Serialize)]
pub struct FeedPage {
    pub posts: Vec<PostResponse>,
    pub page: PageResponse,
}

impl From<Feed> for FeedPage {
    fn from(feed: Feed) -> Self {
        FeedPage {
            posts: feed.posts.into_iter().map(PostResponse::from).collect(),
            page: feed.page,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GroupContext {
    pub group: GroupResponse,
    #[serde(flatten)]
    pub feed: FeedPage,
}

#[derive(Debug, Serialize)]
pub struct ProfileContext {
    pub author: ProfileResponse,
    #[serde(flatten)]
    pub feed: FeedPage,
}

#[derive(Debug, Serialize)]
pub struct PostContext {
    pub author: ProfileResponse,
    pub post: PostResponse,
    pub comments: Vec<CommentResponse>,
    pub comments_count: usize,
}

#[derive(Debug, Serialize)]
pub struct PostFormContext {
    pub groups: Vec<GroupResponse>,
    pub post: Option<PostResponse>,
    pub is_edit: bool,
}
