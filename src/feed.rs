//! Feed composition: which posts a viewing context sees, and which slice of
//! them lands on the requested page.
use serde::Serialize;

use crate::errors::RequestError;
use crate::models::{Group, Post, User};
use crate::store::{ContentStore, PostFilter};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// What a feed is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope<'a> {
    Global,
    Group(&'a str),
    Author(&'a str),
    /// Posts by authors the viewer follows.
    Follow(i64),
}

/// The resolved scope, returned so pages can render a header for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSubject {
    Global,
    Group(Group),
    Author(User),
    Follow { viewer_id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub per_page: usize,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page_number: Option<usize>,
    pub next_page_number: Option<usize>,
}

impl PageMeta {
    pub fn offset(&self) -> usize {
        (self.number - 1) * self.per_page
    }
}

/// Splits `count` items into pages of `per_page`.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    count: usize,
    per_page: usize,
}

impl Paginator {
    pub fn new(count: usize, per_page: usize) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    /// Never zero: an empty feed still has an (empty) first page.
    pub fn num_pages(&self) -> usize {
        ((self.count + self.per_page - 1) / self.per_page).max(1)
    }

    /// Out-of-range numbers clamp to the first or last page.
    pub fn page(&self, requested: i64) -> PageMeta {
        let num_pages = self.num_pages();
        let number = requested.clamp(1, num_pages as i64) as usize;
        PageMeta {
            number,
            num_pages,
            count: self.count,
            per_page: self.per_page,
            has_previous: number > 1,
            has_next: number < num_pages,
            previous_page_number: (number > 1).then(|| number - 1),
            next_page_number: (number < num_pages).then(|| number + 1),
        }
    }
}

/// Reads the raw `page` query value. Anything that is not an integer means
/// the first page.
pub fn parse_page_number(raw: Option<&str>) -> i64 {
    raw.and_then(|raw| raw.trim().parse().ok()).unwrap_or(1)
}

/// The page of the global feed that `requested` lands on after clamping.
pub async fn global_page_number(
    store: &dyn ContentStore,
    requested: i64,
    page_size: usize,
) -> Result<usize, RequestError> {
    let count = store.count_posts(PostFilter::default()).await?;
    Ok(Paginator::new(count, page_size).page(requested).number)
}

#[derive(Debug, Clone)]
pub struct Feed {
    pub subject: FeedSubject,
    pub posts: Vec<Post>,
    pub page: PageMeta,
}

pub async fn compose_feed(
    store: &dyn ContentStore,
    scope: FeedScope<'_>,
    page_number: i64,
    page_size: usize,
) -> Result<Feed, RequestError> {
    let (subject, filter) = match scope {
        FeedScope::Global => (FeedSubject::Global, PostFilter::default()),
        FeedScope::Group(slug) => {
            let group = store
                .get_group_by_slug(slug)
                .await?
                .ok_or(RequestError::NotFound("Group not found"))?;
            let filter = PostFilter::group(group.id);
            (FeedSubject::Group(group), filter)
        }
        FeedScope::Author(username) => {
            let author = store
                .get_user_by_username(username)
                .await?
                .ok_or(RequestError::NotFound("User not found"))?;
            let filter = PostFilter::author(author.id);
            (FeedSubject::Author(author), filter)
        }
        FeedScope::Follow(viewer_id) => (
            FeedSubject::Follow { viewer_id },
            PostFilter::followed_by(viewer_id),
        ),
    };

    let count = store.count_posts(filter).await?;
    let page = Paginator::new(count, page_size).page(page_number);
    let posts = if count == 0 {
        Vec::new()
    } else {
        store.list_posts(filter, page.per_page, page.offset()).await?
    };
    tracing::debug!(?scope, page = page.number, count, "composed feed");

    Ok(Feed {
        subject,
        posts,
        page,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::follow_graph;
    use crate::store::mock::MemoryStore;

    fn texts(feed: &Feed) -> Vec<&str> {
        feed.posts.iter().map(|p| p.text.as_str()).collect()
    }

    #[test]
    fn paginator_clamps_and_reports_neighbours() {
        let paginator = Paginator::new(13, 10);
        assert_eq!(paginator.num_pages(), 2);

        let first = paginator.page(1);
        assert_eq!(first.offset(), 0);
        assert!(!first.has_previous && first.has_next);
        assert_eq!(first.next_page_number, Some(2));

        let last = paginator.page(99);
        assert_eq!(last.number, 2);
        assert_eq!(last.offset(), 10);
        assert_eq!(last.previous_page_number, Some(1));
        assert_eq!(last.next_page_number, None);

        assert_eq!(paginator.page(-4).number, 1);
    }

    #[test]
    fn empty_feed_has_one_page() {
        let page = Paginator::new(0, 10).page(3);
        assert_eq!((page.number, page.num_pages), (1, 1));
        assert!(!page.has_previous && !page.has_next);
    }

    #[test]
    fn page_parameter_parsing() {
        assert_eq!(parse_page_number(None), 1);
        assert_eq!(parse_page_number(Some("abc")), 1);
        assert_eq!(parse_page_number(Some("")), 1);
        assert_eq!(parse_page_number(Some("3")), 3);
        assert_eq!(parse_page_number(Some("-2")), -2);
    }

    #[tokio::test]
    async fn global_feed_is_newest_first() {
        let store = MemoryStore::default();
        let leo = store.add_user("leo").await;
        store.add_post(&leo, "T1", None).await;
        store.add_post(&leo, "T2", None).await;
        store.add_post(&leo, "T3", None).await;

        let feed = compose_feed(&store, FeedScope::Global, 1, DEFAULT_PAGE_SIZE)
            .await
            .unwrap();
        assert_eq!(texts(&feed), ["T3", "T2", "T1"]);
        assert_eq!(feed.subject, FeedSubject::Global);
        assert_eq!(feed.page.count, 3);
    }

    #[tokio::test]
    async fn pages_slice_the_feed() {
        let store = MemoryStore::default();
        let leo = store.add_user("leo").await;
        for n in 0..13 {
            store.add_post(&leo, &format!("post {n}"), None).await;
        }

        let first = compose_feed(&store, FeedScope::Global, 1, 10).await.unwrap();
        assert_eq!(first.posts.len(), 10);
        assert_eq!(first.posts[0].text, "post 12");

        let second = compose_feed(&store, FeedScope::Global, 2, 10).await.unwrap();
        assert_eq!(texts(&second), ["post 2", "post 1", "post 0"]);

        let clamped = compose_feed(&store, FeedScope::Global, 40, 10).await.unwrap();
        assert_eq!(clamped.page.number, 2);
        assert_eq!(texts(&clamped), texts(&second));
    }

    #[tokio::test]
    async fn global_page_number_is_clamped() {
        let store = MemoryStore::default();
        assert_eq!(global_page_number(&store, 5, 10).await.unwrap(), 1);

        let leo = store.add_user("leo").await;
        for n in 0..13 {
            store.add_post(&leo, &format!("post {n}"), None).await;
        }
        assert_eq!(global_page_number(&store, 2, 10).await.unwrap(), 2);
        assert_eq!(global_page_number(&store, 99, 10).await.unwrap(), 2);
        assert_eq!(global_page_number(&store, 0, 10).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn group_feed_only_shows_that_group() {
        let store = MemoryStore::default();
        let leo = store.add_user("leo").await;
        let group = store.add_group("testslug").await;
        store.add_group("testslug1").await;
        store.add_post(&leo, "testtesttest", Some(&group)).await;
        store.add_post(&leo, "ungrouped", None).await;

        let feed = compose_feed(&store, FeedScope::Group("testslug"), 1, 10)
            .await
            .unwrap();
        assert_eq!(texts(&feed), ["testtesttest"]);
        assert_eq!(feed.posts[0].group_slug.as_deref(), Some("testslug"));
        assert!(matches!(feed.subject, FeedSubject::Group(ref g) if g.id == group.id));

        let other = compose_feed(&store, FeedScope::Group("testslug1"), 1, 10)
            .await
            .unwrap();
        assert!(other.posts.is_empty());
    }

    #[tokio::test]
    async fn unknown_group_or_author_is_not_found() {
        let store = MemoryStore::default();
        assert!(matches!(
            compose_feed(&store, FeedScope::Group("nope"), 1, 10).await,
            Err(RequestError::NotFound("Group not found"))
        ));
        assert!(matches!(
            compose_feed(&store, FeedScope::Author("nobody"), 1, 10).await,
            Err(RequestError::NotFound("User not found"))
        ));
    }

    #[tokio::test]
    async fn author_feed_only_shows_that_author() {
        let store = MemoryStore::default();
        let leo = store.add_user("leo").await;
        let ann = store.add_user("ann").await;
        store.add_post(&leo, "by leo", None).await;
        store.add_post(&ann, "by ann", None).await;

        let feed = compose_feed(&store, FeedScope::Author("ann"), 1, 10)
            .await
            .unwrap();
        assert_eq!(texts(&feed), ["by ann"]);
        assert!(matches!(feed.subject, FeedSubject::Author(ref u) if u.username == "ann"));
    }

    #[tokio::test]
    async fn follow_feed_tracks_the_follow_graph() {
        let store = MemoryStore::default();
        let viewer = store.add_user("viewer").await;
        let leo = store.add_user("leo").await;
        let ann = store.add_user("ann").await;
        store.add_post(&leo, "by leo", None).await;
        store.add_post(&ann, "by ann", None).await;
        store.add_post(&viewer, "by viewer", None).await;

        let scope = FeedScope::Follow(viewer.id);
        let before = compose_feed(&store, scope, 1, 10).await.unwrap();
        assert!(before.posts.is_empty());

        follow_graph::follow(&store, viewer.id, &leo).await.unwrap();
        let following = compose_feed(&store, scope, 1, 10).await.unwrap();
        assert_eq!(texts(&following), ["by leo"]);

        follow_graph::unfollow(&store, viewer.id, &leo).await.unwrap();
        let after = compose_feed(&store, scope, 1, 10).await.unwrap();
        assert_eq!(texts(&after), texts(&before));
    }
}
