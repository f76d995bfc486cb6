use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::errors::RequestError;
use crate::models::{
    Comment, Follow, Group, NewComment, NewGroup, NewPost, NewUser, Post, PostChanges, User,
};
use crate::store::{ContentStore, PostFilter};

#[derive(Default, Debug)]
struct Tables {
    last_id: i64,
    users: Vec<User>,
    groups: Vec<Group>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    follows: Vec<Follow>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn username(&self, id: i64) -> Result<String, RequestError> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.username.clone())
            .ok_or(RequestError::NotFound("User not found"))
    }

    fn group_names(&self, id: Option<i64>) -> (Option<String>, Option<String>) {
        match id.and_then(|id| self.groups.iter().find(|g| g.id == id)) {
            Some(group) => (Some(group.slug.clone()), Some(group.title.clone())),
            None => (None, None),
        }
    }

    fn matches(&self, post: &Post, filter: &PostFilter) -> bool {
        if let Some(group_id) = filter.group_id {
            if post.group_id != Some(group_id) {
                return false;
            }
        }
        if let Some(author_id) = filter.author_id {
            if post.author_id != author_id {
                return false;
            }
        }
        if let Some(user_id) = filter.followed_by {
            let follows = self
                .follows
                .iter()
                .any(|f| f.user_id == user_id && f.author_id == post.author_id);
            if !follows {
                return false;
            }
        }
        true
    }
}

/// An in-memory implementation of [`ContentStore`].
#[derive(Clone, Default, Debug)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn follow_count(&self) -> usize {
        self.tables.lock().unwrap().follows.len()
    }

    pub async fn add_user(&self, username: &str) -> User {
        self.insert_user(NewUser {
            username: username.to_owned(),
            email: format!("{username}@example.com"),
            password: "not-a-hash".to_owned(),
        })
        .await
        .unwrap()
    }

    pub async fn add_group(&self, slug: &str) -> Group {
        self.insert_group(NewGroup {
            slug: slug.to_owned(),
            title: format!("title of {slug}"),
            description: None,
        })
        .await
        .unwrap()
    }

    pub async fn add_post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        self.insert_post(NewPost {
            author_id: author.id,
            text: text.to_owned(),
            group_id: group.map(|g| g.id),
            image: None,
        })
        .await
        .unwrap()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, RequestError> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(RequestError::RunTimeError("User already exists"));
        }
        let user = User {
            id: tables.next_id(),
            username: user.username,
            email: user.email,
            password: user.password,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, RequestError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, RequestError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, RequestError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert_group(&self, group: NewGroup) -> Result<Group, RequestError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.groups.iter().any(|g| g.slug == group.slug) {
            return Err(RequestError::RunTimeError("Group already exists"));
        }
        let group = Group {
            id: tables.next_id(),
            slug: group.slug,
            title: group.title,
            description: group.description,
        };
        tables.groups.push(group.clone());
        Ok(group)
    }

    async fn get_group_by_id(&self, id: i64) -> Result<Option<Group>, RequestError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.groups.iter().find(|g| g.id == id).cloned())
    }

    async fn get_group_by_slug(&self, slug: &str) -> Result<Option<Group>, RequestError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>, RequestError> {
        let tables = self.tables.lock().unwrap();
        let mut groups = tables.groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(groups)
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post, RequestError> {
        let mut tables = self.tables.lock().unwrap();
        let author_username = tables.username(post.author_id)?;
        let (group_slug, group_title) = tables.group_names(post.group_id);
        let post = Post {
            id: tables.next_id(),
            text: post.text,
            image: post.image,
            created_at: Utc::now(),
            author_id: post.author_id,
            author_username,
            group_id: post.group_id,
            group_slug,
            group_title,
        };
        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, RequestError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> Result<Post, RequestError> {
        let mut tables = self.tables.lock().unwrap();
        let (group_slug, group_title) = tables.group_names(changes.group_id);
        let post = tables
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RequestError::NotFound("Post not found"))?;
        post.text = changes.text;
        post.image = changes.image;
        post.group_id = changes.group_id;
        post.group_slug = group_slug;
        post.group_title = group_title;
        Ok(post.clone())
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<usize, RequestError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .posts
            .iter()
            .filter(|p| tables.matches(p, &filter))
            .count())
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Post>, RequestError> {
        let tables = self.tables.lock().unwrap();
        let mut posts: Vec<Post> = tables
            .posts
            .iter()
            .filter(|p| tables.matches(p, &filter))
            .cloned()
            .collect();
        posts.sort_by(Post::newest_first);
        Ok(posts.into_iter().skip(offset).take(limit).collect())
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, RequestError> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.posts.iter().any(|p| p.id == comment.post_id) {
            return Err(RequestError::NotFound("Post not found"));
        }
        let author_username = tables.username(comment.author_id)?;
        let comment = Comment {
            id: tables.next_id(),
            text: comment.text,
            created_at: Utc::now(),
            post_id: comment.post_id,
            author_id: comment.author_id,
            author_username,
        };
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, RequestError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn follow_exists(&self, user_id: i64, author_id: i64) -> Result<bool, RequestError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .follows
            .iter()
            .any(|f| f.user_id == user_id && f.author_id == author_id))
    }

    async fn insert_follow(&self, user_id: i64, author_id: i64) -> Result<bool, RequestError> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .follows
            .iter()
            .any(|f| f.user_id == user_id && f.author_id == author_id)
        {
            return Ok(false);
        }
        let id = tables.next_id();
        tables.follows.push(Follow {
            id,
            user_id,
            author_id,
        });
        Ok(true)
    }

    async fn delete_follow(&self, user_id: i64, author_id: i64) -> Result<bool, RequestError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.follows.len();
        tables
            .follows
            .retain(|f| !(f.user_id == user_id && f.author_id == author_id));
        Ok(tables.follows.len() != before)
    }

    async fn list_followed_authors(&self, user_id: i64) -> Result<Vec<User>, RequestError> {
        let tables = self.tables.lock().unwrap();
        let mut authors: Vec<User> = tables
            .follows
            .iter()
            .filter(|f| f.user_id == user_id)
            .filter_map(|f| tables.users.iter().find(|u| u.id == f.author_id))
            .cloned()
            .collect();
        authors.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(authors)
    }
}
