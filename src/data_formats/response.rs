use serde::{Deserialize, Serialize};

use crate::feed::PageMeta;
use crate::media::media_url;
use crate::models::{Comment, Group, Post, User};

#[derive(Deserialize, Serialize, Debug)]
pub struct UserResponse {
    pub email: String,
    pub token: String,
    pub username: String,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct ProfileResponse {
    pub username: String,
    pub following: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GroupResponse {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GroupSummary {
    pub slug: String,
    pub title: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PostResponse {
    pub id: i64,
    pub text: String,
    pub image: Option<String>,
    pub pub_date: String,
    pub author: String,
    pub group: Option<GroupSummary>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CommentResponse {
    pub id: i64,
    pub text: String,
    pub created: String,
    pub author: String,
}

pub type PageResponse = PageMeta;

impl UserResponse {
    pub fn new(User { username, email, .. }: User, token: String) -> Self {
        UserResponse {
            email,
            token,
            username,
        }
    }
}

impl ProfileResponse {
    pub fn new(User { username, .. }: User, following: bool) -> Self {
        ProfileResponse {
            username,
            following,
        }
    }
}

impl From<Group> for GroupResponse {
    fn from(
        Group {
            id,
            slug,
            title,
            description,
        }: Group,
    ) -> Self {
        GroupResponse {
            id,
            slug,
            title,
            description,
        }
    }
}

impl From<Post> for PostResponse {
    fn from(
        Post {
            id,
            text,
            image,
            created_at,
            author_username,
            group_slug,
            group_title,
            ..
        }: Post,
    ) -> Self {
        let group = match (group_slug, group_title) {
            (Some(slug), Some(title)) => Some(GroupSummary { slug, title }),
            _ => None,
        };
        PostResponse {
            id,
            text,
            image: image.as_deref().map(media_url),
            pub_date: created_at.to_rfc3339(),
            author: author_username,
            group,
        }
    }
}

impl From<Comment> for CommentResponse {
    fn from(
        Comment {
            id,
            text,
            created_at,
            author_username,
            ..
        }: Comment,
    ) -> Self {
        CommentResponse {
            id,
            text,
            created: created_at.to_rfc3339(),
            author: author_username,
        }
    }
}
