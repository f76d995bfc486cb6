use axum::{
    extract::{Multipart, Path, Query},
    http::{StatusCode, Uri},
    response::Redirect,
    Extension, Form, Json,
};

use crate::{
    authentication::{get_jwt_token, hash_password_argon2, verify_password_argon2},
    authentication::{AuthUser, MaybeUser},
    comments,
    data_formats::{
        CommentForm, CommentResponse, FeedPage, GroupContext, GroupResponse, LoginRequest,
        PageQuery, PostContext, PostForm, PostFormContext, PostResponse, ProfileContext,
        ProfileResponse, RegisterRequest, UserResponse, UserWrapper,
    },
    errors::{FieldErrors, RequestError, RequestErrorJsonWrapper},
    feed::{compose_feed, global_page_number, FeedScope, FeedSubject},
    follow_graph,
    fragment_cache::FragmentKey,
    models::NewUser,
    posts,
    render::{render_page, Rendered},
    AppState, JsonResponse,
};

type UserJson = UserWrapper<UserResponse>;
type JsonResult<T> = Result<Json<T>, RequestError>;
type PageResult = Result<Rendered, RequestError>;
type RedirectResult = Result<Redirect, RequestError>;

/// Usernames that would be shadowed by fixed routes.
const RESERVED_USERNAMES: &[&str] = &["new", "follow", "group", "auth", "media", "check_health"];

// ----------------- Helper Handlers -----------------
pub async fn alive() -> &'static str {
    "alive"
}

pub async fn not_found(uri: Uri) -> JsonResponse<RequestErrorJsonWrapper> {
    (
        StatusCode::NOT_FOUND,
        Json(RequestErrorJsonWrapper::new(&format!(
            "URL {} provided was not found",
            uri.path()
        ))),
    )
}

/// Post ids arrive as path segments; anything that isn't one names no post.
fn parse_post_id(raw: &str) -> Result<i64, RequestError> {
    raw.parse()
        .map_err(|_| RequestError::NotFound("Post not found"))
}

// ----------------- User Handlers -----------------
pub async fn login_user(
    Extension(state): Extension<AppState>,
    Json(UserWrapper { user: request }): Json<UserWrapper<LoginRequest>>,
) -> JsonResult<UserJson> {
    let user = match state.store.get_user_by_email(&request.email).await? {
        Some(user) => user,
        None => return Err(RequestError::RunTimeError("Email not found")),
    };
    let is_password_correct = verify_password_argon2(request.password, &user.password).await?;
    if !is_password_correct {
        return Err(RequestError::RunTimeError("Incorrect password"));
    }
    let token = get_jwt_token(user.id, &state.config.jwt_secret)?;
    Ok(Json(UserWrapper::wrap_with_user_data(UserResponse::new(
        user, token,
    ))))
}

pub async fn register_user(
    Extension(state): Extension<AppState>,
    Json(UserWrapper { user: request }): Json<UserWrapper<RegisterRequest>>,
) -> JsonResult<UserJson> {
    let username = request.username.trim().to_owned();
    let email = request.email.trim().to_owned();

    let mut errors = FieldErrors::new();
    if username.is_empty() {
        errors.add("username", "This field is required.");
    } else if RESERVED_USERNAMES.contains(&username.as_str())
        || !username
            .chars()
            .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        errors.add("username", "Enter a valid username.");
    }
    if email.is_empty() {
        errors.add("email", "This field is required.");
    }
    if request.password.is_empty() {
        errors.add("password", "This field is required.");
    }
    errors.into_result(())?;

    let password = hash_password_argon2(request.password).await?;
    let user = state
        .store
        .insert_user(NewUser {
            username,
            email,
            password,
        })
        .await
        .map_err(|e| match e {
            RequestError::DatabaseError(sqlx::Error::Database(e))
                if e.message().contains("UNIQUE constraint failed") =>
            {
                RequestError::RunTimeError("User already exists")
            }
            other => other,
        })?;
    tracing::info!(user_id = user.id, "registered user");

    let token = get_jwt_token(user.id, &state.config.jwt_secret)?;
    Ok(Json(UserWrapper::wrap_with_user_data(UserResponse::new(
        user, token,
    ))))
}

// ----------------- Feed Handlers -----------------
/// The global feed. Its rendered body is cached per clamped page number and
/// is not refreshed by new posts until the entry expires.
pub async fn index(
    Extension(state): Extension<AppState>,
    Query(query): Query<PageQuery>,
) -> PageResult {
    let number = global_page_number(
        state.store.as_ref(),
        query.number(),
        state.config.page_size,
    )
    .await?;
    let key = FragmentKey::new("index_page").vary_on(number);
    let ttl = state.config.index_cache_ttl();
    let render_state = state.clone();
    let body = state
        .fragments
        .get_or_render(&key, ttl, move || async move {
            let feed = compose_feed(
                render_state.store.as_ref(),
                FeedScope::Global,
                number as i64,
                render_state.config.page_size,
            )
            .await?;
            let page = render_page(
                render_state.renderer.as_ref(),
                "index.html",
                &FeedPage::from(feed),
            )?;
            Ok::<_, RequestError>(page.body)
        })
        .await?;
    Ok(Rendered {
        content_type: state.renderer.content_type(),
        body,
    })
}

pub async fn group_posts(
    Extension(state): Extension<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> PageResult {
    let feed = compose_feed(
        state.store.as_ref(),
        FeedScope::Group(&slug),
        query.number(),
        state.config.page_size,
    )
    .await?;
    let group = match &feed.subject {
        FeedSubject::Group(group) => group.clone(),
        _ => return Err(anyhow::anyhow!("group feed resolved without a group").into()),
    };
    let context = GroupContext {
        group: GroupResponse::from(group),
        feed: FeedPage::from(feed),
    };
    render_page(state.renderer.as_ref(), "group.html", &context)
}

pub async fn profile(
    Extension(state): Extension<AppState>,
    viewer: MaybeUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> PageResult {
    let feed = compose_feed(
        state.store.as_ref(),
        FeedScope::Author(&username),
        query.number(),
        state.config.page_size,
    )
    .await?;
    let author = match &feed.subject {
        FeedSubject::Author(author) => author.clone(),
        _ => return Err(anyhow::anyhow!("author feed resolved without an author").into()),
    };
    let following =
        follow_graph::is_following(state.store.as_ref(), viewer.get_id(), author.id).await?;
    let context = ProfileContext {
        author: ProfileResponse::new(author, following),
        feed: FeedPage::from(feed),
    };
    render_page(state.renderer.as_ref(), "profile.html", &context)
}

pub async fn follow_index(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Query(query): Query<PageQuery>,
) -> PageResult {
    let feed = compose_feed(
        state.store.as_ref(),
        FeedScope::Follow(user.id),
        query.number(),
        state.config.page_size,
    )
    .await?;
    render_page(state.renderer.as_ref(), "follow.html", &FeedPage::from(feed))
}

// ----------------- Post Handlers -----------------
pub async fn post_view(
    Extension(state): Extension<AppState>,
    viewer: MaybeUser,
    Path((username, post_id)): Path<(String, String)>,
) -> PageResult {
    let post_id = parse_post_id(&post_id)?;
    let detail = posts::post_detail(state.store.as_ref(), &username, post_id).await?;
    let following =
        follow_graph::is_following(state.store.as_ref(), viewer.get_id(), detail.post.author_id)
            .await?;
    let comments: Vec<CommentResponse> = detail
        .comments
        .into_iter()
        .map(CommentResponse::from)
        .collect();
    let context = PostContext {
        author: ProfileResponse {
            username: detail.post.author_username.clone(),
            following,
        },
        post: PostResponse::from(detail.post),
        comments_count: comments.len(),
        comments,
    };
    render_page(state.renderer.as_ref(), "post.html", &context)
}

async fn post_form_context(
    state: &AppState,
    post: Option<PostResponse>,
) -> Result<PostFormContext, RequestError> {
    let groups = state
        .store
        .list_groups()
        .await?
        .into_iter()
        .map(GroupResponse::from)
        .collect();
    Ok(PostFormContext {
        groups,
        is_edit: post.is_some(),
        post,
    })
}

pub async fn new_post_form(Extension(state): Extension<AppState>, _user: AuthUser) -> PageResult {
    let context = post_form_context(&state, None).await?;
    render_page(state.renderer.as_ref(), "new_post.html", &context)
}

pub async fn new_post(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> RedirectResult {
    let form = PostForm::from_multipart(multipart).await?;
    posts::create_post(state.store.as_ref(), &state.media, user.id, form).await?;
    Ok(Redirect::to("/"))
}

pub async fn post_edit_form(
    Extension(state): Extension<AppState>,
    editor: MaybeUser,
    Path((username, post_id)): Path<(String, String)>,
) -> PageResult {
    let post_id = parse_post_id(&post_id)?;
    let post = posts::find_post(state.store.as_ref(), &username, post_id).await?;
    posts::ensure_author(&post, editor.get_id())?;
    let context = post_form_context(&state, Some(PostResponse::from(post))).await?;
    render_page(state.renderer.as_ref(), "new_post.html", &context)
}

pub async fn post_edit(
    Extension(state): Extension<AppState>,
    editor: MaybeUser,
    Path((username, post_id)): Path<(String, String)>,
    multipart: Multipart,
) -> RedirectResult {
    let post_id = parse_post_id(&post_id)?;
    let form = PostForm::from_multipart(multipart).await?;
    let post = posts::edit_post(
        state.store.as_ref(),
        &state.media,
        editor.get_id(),
        &username,
        post_id,
        form,
    )
    .await?;
    Ok(Redirect::to(&post.url()))
}

// ----------------- Comment Handlers -----------------
pub async fn add_comment(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path((username, post_id)): Path<(String, String)>,
    Form(form): Form<CommentForm>,
) -> RedirectResult {
    let post_id = parse_post_id(&post_id)?;
    comments::add_comment(state.store.as_ref(), user.id, &username, post_id, form).await?;
    Ok(Redirect::to(&format!("/{username}/{post_id}/")))
}

// ----------------- Follow Handlers -----------------
pub async fn profile_follow(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(username): Path<String>,
) -> RedirectResult {
    let author = follow_graph::find_author(state.store.as_ref(), &username).await?;
    follow_graph::follow(state.store.as_ref(), user.id, &author).await?;
    Ok(Redirect::to("/"))
}

/// Unfollowing someone unknown, or someone not followed, changes nothing.
pub async fn profile_unfollow(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(username): Path<String>,
) -> RedirectResult {
    if let Some(author) = state.store.get_user_by_username(&username).await? {
        follow_graph::unfollow(state.store.as_ref(), user.id, &author).await?;
    }
    Ok(Redirect::to("/"))
}
