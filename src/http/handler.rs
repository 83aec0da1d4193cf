use crate::http::AppState;
use crate::http::auth::{Authorized, CreateUsers, DeleteUsers, UpdateUsers};
use crate::http::negotiate::{MediaType, negotiate};
use crate::models::{
    CreateAuthorError, CreateAuthorRequest, FindArticlesError, FindAuthorError, FindAuthorRequest,
    FindIdentityError, Identity, ListAuthorsError, ListAuthorsRequest, PenName, PenNameError,
    RecentArticlesRequest, Username, UsernameError,
};
use crate::pagination::{AUTHORS_PER_ROW, PAGE_SIZE, PageWindow, parse_page};
use crate::password::{PasswordError, PasswordHasher};
use crate::render::{AUTHOR_DETAILS_TEMPLATE, AUTHOR_LIST_TEMPLATE, RenderError};
use axum::extract::{Form, Json, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Newest articles shown on an author's page.
pub const RECENT_ARTICLES: u64 = 4;

pub const NO_MORE_AUTHORS: &str = "no more authors";

const NEGOTIABLE: &[MediaType] = &[MediaType::Json, MediaType::Html];

#[derive(Debug)]
pub struct ApiSuccess<T: Serialize>(StatusCode, Json<ApiResponse<T>>);

impl<T: Serialize> ApiSuccess<T> {
    pub const fn new(status: StatusCode, data: T) -> Self {
        Self(status, Json(ApiResponse::new(status, data)))
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    status_code: u16,
    data: T,
}

impl<T: Serialize> ApiResponse<T> {
    const fn new(status: StatusCode, data: T) -> Self {
        Self {
            status_code: status.as_u16(),
            data,
        }
    }
}

/// Every way a request can fail, rendered as a plain-text body.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    NotAcceptable(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    UnprocessableEntity(String),
    NotImplemented(String),
    ServiceUnavailable(String),
    InternalServerError(String),
}

impl ApiError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NotAcceptable(_) => StatusCode::NOT_ACCEPTABLE,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn internal(cause: &anyhow::Error) -> Self {
        tracing::error!(error = ?cause, "request failed");
        Self::InternalServerError("Internal server error".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::NotFound(msg)
            | Self::NotAcceptable(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::Conflict(msg)
            | Self::UnprocessableEntity(msg)
            | Self::NotImplemented(msg)
            | Self::ServiceUnavailable(msg)
            | Self::InternalServerError(msg) => (status, msg).into_response(),
        }
    }
}

impl From<ListAuthorsError> for ApiError {
    fn from(err: ListAuthorsError) -> Self {
        Self::internal(&err.0)
    }
}

impl From<FindAuthorError> for ApiError {
    fn from(err: FindAuthorError) -> Self {
        match err {
            FindAuthorError::NotFound { .. } => Self::NotFound(err.to_string()),
            FindAuthorError::Other(cause) => Self::internal(&cause),
        }
    }
}

impl From<FindArticlesError> for ApiError {
    fn from(err: FindArticlesError) -> Self {
        Self::internal(&err.0)
    }
}

impl From<FindIdentityError> for ApiError {
    fn from(err: FindIdentityError) -> Self {
        match err {
            FindIdentityError::NotFound { id } => {
                tracing::debug!(author_id = id, "token subject no longer exists");
                Self::Unauthorized("Invalid bearer token".to_string())
            }
            FindIdentityError::Other(cause) => Self::internal(&cause),
        }
    }
}

impl From<CreateAuthorError> for ApiError {
    fn from(err: CreateAuthorError) -> Self {
        match err {
            CreateAuthorError::Duplicate { .. } => Self::Conflict(err.to_string()),
            CreateAuthorError::UnknownGroup { .. } => Self::UnprocessableEntity(err.to_string()),
            CreateAuthorError::Other(cause) => Self::internal(&cause),
        }
    }
}

impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        Self::internal(&err.0)
    }
}

impl From<ParseCreateAuthorHttpRequestError> for ApiError {
    fn from(err: ParseCreateAuthorHttpRequestError) -> Self {
        match err {
            ParseCreateAuthorHttpRequestError::Password(PasswordError::Hash(cause)) => {
                Self::internal(&anyhow::anyhow!("Failed to hash password: {cause}"))
            }
            err => Self::UnprocessableEntity(err.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuthorHttpRequest {
    username: String,
    password: String,
    pen_name: String,
    #[serde(default)]
    avatar: Option<String>,
    #[serde(default)]
    introduce: Option<String>,
    group_id: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseCreateAuthorHttpRequestError {
    #[error(transparent)]
    Username(#[from] UsernameError),
    #[error(transparent)]
    PenName(#[from] PenNameError),
    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl CreateAuthorHttpRequest {
    /// Validates the form and digests the password.
    fn try_into_domain(
        self,
        hasher: &PasswordHasher,
    ) -> Result<CreateAuthorRequest, ParseCreateAuthorHttpRequestError> {
        let username = Username::new(&self.username)?;
        let pen_name = PenName::new(&self.pen_name)?;
        let password_digest = hasher.hash(&self.password)?;
        Ok(CreateAuthorRequest::new(
            username,
            password_digest,
            pen_name,
            non_blank(self.avatar),
            non_blank(self.introduce),
            self.group_id,
        ))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Serialize)]
pub struct CreateAuthorHttpResponse {
    id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ListAuthorsQuery {
    page: Option<String>,
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::NotFound(format!(r#"Author with id "{raw}" does not exist"#)))
}

pub async fn list_authors(
    State(state): State<AppState>,
    Query(query): Query<ListAuthorsQuery>,
) -> Result<Html<String>, ApiError> {
    let page = parse_page(query.page.as_deref());
    let req = ListAuthorsRequest::new(PageWindow::offset_for(page, PAGE_SIZE), PAGE_SIZE);

    let authors = state.within(state.authors().list_authors(&req)).await?;
    if authors.is_empty() {
        return Err(ApiError::NotFound(NO_MORE_AUTHORS.to_string()));
    }

    let total = state.within(state.authors().count_authors()).await?;
    let window = PageWindow::compute(page, PAGE_SIZE, total);

    let context = json!({
        "title": "Authors",
        "authors": authors,
        "page": window,
        "authors_per_row": AUTHORS_PER_ROW,
    });
    let html = state.renderer().render(AUTHOR_LIST_TEMPLATE, &context)?;

    Ok(Html(html))
}

pub async fn find_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let author = state
        .within(state.authors().find_author_profile(&FindAuthorRequest::new(id)))
        .await?;

    let vary = [(header::VARY, "Accept")];
    match negotiate(&headers, NEGOTIABLE) {
        Some(MediaType::Json) => Ok((vary, Json(author)).into_response()),
        Some(MediaType::Html) => {
            let req = RecentArticlesRequest::new(author.pen_name(), RECENT_ARTICLES);
            let articles = state.within(state.articles().find_recent_articles(&req)).await?;

            let context = json!({
                "author": author,
                "articles": articles,
                "title": author.pen_name(),
            });
            let html = state.renderer().render(AUTHOR_DETAILS_TEMPLATE, &context)?;

            Ok((vary, Html(html)).into_response())
        }
        None => Err(ApiError::NotAcceptable("json and html only".to_string())),
    }
}

pub async fn create_author(
    auth: Authorized<CreateUsers>,
    State(state): State<AppState>,
    Form(body): Form<CreateAuthorHttpRequest>,
) -> Result<ApiSuccess<CreateAuthorHttpResponse>, ApiError> {
    let req = body.try_into_domain(state.hasher())?;
    let author = state.within(state.authors().create_author(&req)).await?;

    tracing::info!(
        author_id = author.id(),
        created_by = auth.identity().author_id(),
        "created author"
    );

    Ok(ApiSuccess::new(
        StatusCode::OK,
        CreateAuthorHttpResponse { id: author.id() },
    ))
}

pub async fn delete_author(auth: Authorized<DeleteUsers>, Path(id): Path<String>) -> ApiError {
    not_implemented(auth.identity(), &id, "deleting")
}

pub async fn update_author(auth: Authorized<UpdateUsers>, Path(id): Path<String>) -> ApiError {
    not_implemented(auth.identity(), &id, "updating")
}

fn not_implemented(caller: &Identity, raw_id: &str, action: &str) -> ApiError {
    match parse_id(raw_id) {
        Ok(id) => {
            tracing::warn!(
                author_id = id,
                caller = caller.author_id(),
                "{action} authors is not implemented"
            );
            ApiError::NotImplemented(format!("{action} authors is not implemented"))
        }
        Err(err) => err,
    }
}
