use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use thiserror::Error;

const PEN_NAME_MAX_CHARS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Username(String);

impl Username {
    pub fn new(raw: &str) -> Result<Self, UsernameError> {
        let trimmed = raw.trim();
        if Self::is_valid(trimmed) {
            Ok(Self(trimmed.into()))
        } else {
            Err(UsernameError(trimmed.into()))
        }
    }

    pub fn new_unchecked(raw: &str) -> Self {
        Self(raw.into())
    }

    fn is_valid(s: &str) -> bool {
        static RE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.\-]{3,32}$").unwrap());
        RE.is_match(s)
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Error, Debug)]
#[error(r#""{0}" is not a valid username (3 to 32 letters, digits, '.', '-' or '_')"#)]
pub struct UsernameError(String);

/// Display name of an author. Articles reference their author by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PenName(String);

impl PenName {
    pub fn new(raw: &str) -> Result<Self, PenNameError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Err(PenNameError::Empty)
        } else if trimmed.chars().count() > PEN_NAME_MAX_CHARS {
            Err(PenNameError::TooLong)
        } else {
            Ok(Self(trimmed.into()))
        }
    }

    pub fn new_unchecked(raw: &str) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PenName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Error, Debug)]
pub enum PenNameError {
    #[error("Pen name cannot be empty")]
    Empty,
    #[error("Pen name cannot be longer than {PEN_NAME_MAX_CHARS} characters")]
    TooLong,
}

/// A full author record as stored. The password digest never leaves the server.
#[derive(Debug, Clone, Serialize)]
pub struct Author {
    id: i64,
    username: Username,
    #[serde(skip_serializing)]
    password_digest: String,
    pen_name: PenName,
    avatar: Option<String>,
    introduce: Option<String>,
    #[serde(skip_serializing)]
    group_id: i64,
}

impl Author {
    pub const fn new(
        id: i64,
        username: Username,
        password_digest: String,
        pen_name: PenName,
        group_id: i64,
    ) -> Self {
        Self {
            id,
            username,
            password_digest,
            pen_name,
            avatar: None,
            introduce: None,
            group_id,
        }
    }

    #[must_use]
    pub fn with_avatar(mut self, avatar: Option<String>) -> Self {
        self.avatar = avatar;
        self
    }

    #[must_use]
    pub fn with_introduce(mut self, introduce: Option<String>) -> Self {
        self.introduce = introduce;
        self
    }

    pub const fn id(&self) -> i64 {
        self.id
    }

    pub const fn username(&self) -> &Username {
        &self.username
    }

    pub fn password_digest(&self) -> &str {
        &self.password_digest
    }

    pub const fn pen_name(&self) -> &PenName {
        &self.pen_name
    }

    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }

    pub fn introduce(&self) -> Option<&str> {
        self.introduce.as_deref()
    }

    pub const fn group_id(&self) -> i64 {
        self.group_id
    }
}

/// Public view of an author: what anonymous visitors may see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorProfile {
    id: i64,
    pen_name: String,
    introduce: Option<String>,
    avatar: Option<String>,
}

impl AuthorProfile {
    pub const fn new(
        id: i64,
        pen_name: String,
        introduce: Option<String>,
        avatar: Option<String>,
    ) -> Self {
        Self {
            id,
            pen_name,
            introduce,
            avatar,
        }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }

    pub fn pen_name(&self) -> &str {
        &self.pen_name
    }

    pub fn introduce(&self) -> Option<&str> {
        self.introduce.as_deref()
    }

    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleSummary {
    id: i64,
    title: String,
    author: String,
    summary: Option<String>,
}

impl ArticleSummary {
    pub const fn new(id: i64, title: String, author: String, summary: Option<String>) -> Self {
        Self {
            id,
            title,
            author,
            summary,
        }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }
}

#[derive(Debug)]
pub struct CreateAuthorRequest {
    username: Username,
    password_digest: String,
    pen_name: PenName,
    avatar: Option<String>,
    introduce: Option<String>,
    group_id: i64,
}

impl CreateAuthorRequest {
    pub const fn new(
        username: Username,
        password_digest: String,
        pen_name: PenName,
        avatar: Option<String>,
        introduce: Option<String>,
        group_id: i64,
    ) -> Self {
        Self {
            username,
            password_digest,
            pen_name,
            avatar,
            introduce,
            group_id,
        }
    }

    pub const fn username(&self) -> &Username {
        &self.username
    }

    pub fn password_digest(&self) -> &str {
        &self.password_digest
    }

    pub const fn pen_name(&self) -> &PenName {
        &self.pen_name
    }

    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }

    pub fn introduce(&self) -> Option<&str> {
        self.introduce.as_deref()
    }

    pub const fn group_id(&self) -> i64 {
        self.group_id
    }
}

#[derive(Error, Debug)]
pub enum CreateAuthorError {
    #[error("Author with username \"{username}\" or pen name \"{pen_name}\" already exists")]
    Duplicate { username: String, pen_name: String },
    #[error("Group with id \"{group_id}\" does not exist")]
    UnknownGroup { group_id: i64 },
    #[error(transparent)]
    Other(anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListAuthorsRequest {
    offset: u64,
    limit: u64,
}

impl ListAuthorsRequest {
    pub const fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    pub const fn offset(&self) -> u64 {
        self.offset
    }

    pub const fn limit(&self) -> u64 {
        self.limit
    }
}

#[derive(Error, Debug)]
#[error(transparent)]
pub struct ListAuthorsError(#[from] pub anyhow::Error);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindAuthorRequest {
    id: i64,
}

impl FindAuthorRequest {
    pub const fn new(id: i64) -> Self {
        Self { id }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Error, Debug)]
pub enum FindAuthorError {
    #[error("Author with id \"{id}\" does not exist")]
    NotFound { id: i64 },
    #[error(transparent)]
    Other(anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentArticlesRequest {
    author: String,
    limit: u64,
}

impl RecentArticlesRequest {
    pub fn new(author: &str, limit: u64) -> Self {
        Self {
            author: author.into(),
            limit,
        }
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub const fn limit(&self) -> u64 {
        self.limit
    }
}

#[derive(Error, Debug)]
#[error(transparent)]
pub struct FindArticlesError(#[from] pub anyhow::Error);

/// The caller behind an authenticated request and the permissions granted to
/// its group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    author_id: i64,
    permissions: BTreeSet<String>,
}

impl Identity {
    pub fn new<I, P>(author_id: i64, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            author_id,
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    pub const fn author_id(&self) -> i64 {
        self.author_id
    }

    pub fn has_permission(&self, name: &str) -> bool {
        self.permissions.contains(name)
    }
}

#[derive(Error, Debug)]
pub enum FindIdentityError {
    #[error("Author with id \"{id}\" does not exist")]
    NotFound { id: i64 },
    #[error(transparent)]
    Other(anyhow::Error),
}
