use crate::models::{
    ArticleSummary, Author, AuthorProfile, CreateAuthorError, CreateAuthorRequest,
    FindArticlesError, FindAuthorError, FindAuthorRequest, FindIdentityError, Identity,
    ListAuthorsError, ListAuthorsRequest, PenName, RecentArticlesRequest, Username,
};
use crate::repositories::{ArticleRepository, AuthorRepository};
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteRow};
use sqlx::{FromRow, Row, SqlitePool};
use std::str::FromStr;

static MIGRATOR: Migrator = sqlx::migrate!();

pub async fn establish_pool(path: &str) -> anyhow::Result<SqlitePool> {
    let opts = SqliteConnectOptions::from_str(path)
        .with_context(|| format!("Invalid database path {path}"))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);
    let pool = SqlitePool::connect_with(opts)
        .await
        .with_context(|| format!("Failed to open database at {path}"))?;

    MIGRATOR
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok(pool)
}

/// Authors and articles backed by one SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl<'r> FromRow<'r, SqliteRow> for Author {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id = row.try_get("id")?;
        let username: &str = row.try_get("username")?;
        let password_digest = row.try_get("password")?;
        let pen_name: &str = row.try_get("pen_name")?;
        let avatar = row.try_get("avatar")?;
        let introduce = row.try_get("introduce")?;
        let group_id = row.try_get("group_id")?;

        let username = Username::new_unchecked(username);
        let pen_name = PenName::new_unchecked(pen_name);
        Ok(Self::new(id, username, password_digest, pen_name, group_id)
            .with_avatar(avatar)
            .with_introduce(introduce))
    }
}

impl<'r> FromRow<'r, SqliteRow> for AuthorProfile {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self::new(
            row.try_get("id")?,
            row.try_get("pen_name")?,
            row.try_get("introduce")?,
            row.try_get("avatar")?,
        ))
    }
}

impl<'r> FromRow<'r, SqliteRow> for ArticleSummary {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self::new(
            row.try_get("id")?,
            row.try_get("title")?,
            row.try_get("author")?,
            row.try_get("summary")?,
        ))
    }
}

#[async_trait]
impl AuthorRepository for SqliteRepository {
    async fn create_author(&self, req: &CreateAuthorRequest) -> Result<Author, CreateAuthorError> {
        let author = sqlx::query_as(
            "INSERT INTO authors (username, password, pen_name, avatar, introduce, group_id) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(req.username().to_string())
        .bind(req.password_digest())
        .bind(req.pen_name().as_str())
        .bind(req.avatar())
        .bind(req.introduce())
        .bind(req.group_id())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| create_error(err, req))?;

        Ok(author)
    }

    async fn list_authors(&self, req: &ListAuthorsRequest) -> Result<Vec<Author>, ListAuthorsError> {
        let authors = sqlx::query_as(
            "SELECT id, username, password, pen_name, avatar, introduce, group_id \
             FROM authors ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(to_sql_int(req.limit()))
        .bind(to_sql_int(req.offset()))
        .fetch_all(&self.pool)
        .await
        .map_err(|err| {
            let err = anyhow!(err).context(format!(
                "Failed to list authors at offset {} with limit {}",
                req.offset(),
                req.limit()
            ));
            ListAuthorsError(err)
        })?;

        Ok(authors)
    }

    async fn count_authors(&self) -> Result<u64, ListAuthorsError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                let err = anyhow!(err).context("Failed to count authors");
                ListAuthorsError(err)
            })?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn find_author_profile(
        &self,
        req: &FindAuthorRequest,
    ) -> Result<AuthorProfile, FindAuthorError> {
        let profile =
            sqlx::query_as("SELECT id, pen_name, introduce, avatar FROM authors WHERE id = ?")
                .bind(req.id())
                .fetch_one(&self.pool)
                .await
                .map_err(|err| {
                    if matches!(err, sqlx::Error::RowNotFound) {
                        FindAuthorError::NotFound { id: req.id() }
                    } else {
                        let err = anyhow!(err).context(format!(
                            r#"Failed to retrieve author with id "{}""#,
                            req.id()
                        ));
                        FindAuthorError::Other(err)
                    }
                })?;

        Ok(profile)
    }

    async fn find_identity(&self, author_id: i64) -> Result<Identity, FindIdentityError> {
        let lookup_failed = |err: sqlx::Error| {
            let err = anyhow!(err).context(format!(
                r#"Failed to resolve permissions of author "{author_id}""#
            ));
            FindIdentityError::Other(err)
        };

        let group_id: i64 = sqlx::query_scalar("SELECT group_id FROM authors WHERE id = ?")
            .bind(author_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(lookup_failed)?
            .ok_or(FindIdentityError::NotFound { id: author_id })?;

        let permissions: Vec<String> =
            sqlx::query_scalar("SELECT permission FROM group_permissions WHERE group_id = ?")
                .bind(group_id)
                .fetch_all(&self.pool)
                .await
                .map_err(lookup_failed)?;

        Ok(Identity::new(author_id, permissions))
    }
}

#[async_trait]
impl ArticleRepository for SqliteRepository {
    async fn find_recent_articles(
        &self,
        req: &RecentArticlesRequest,
    ) -> Result<Vec<ArticleSummary>, FindArticlesError> {
        let articles = sqlx::query_as(
            "SELECT id, title, author, summary FROM articles \
             WHERE author = ? ORDER BY id DESC LIMIT ?",
        )
        .bind(req.author())
        .bind(to_sql_int(req.limit()))
        .fetch_all(&self.pool)
        .await
        .map_err(|err| {
            let err = anyhow!(err).context(format!(
                r#"Failed to retrieve articles written by "{}""#,
                req.author()
            ));
            FindArticlesError(err)
        })?;

        Ok(articles)
    }
}

fn create_error(err: sqlx::Error, req: &CreateAuthorRequest) -> CreateAuthorError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return CreateAuthorError::Duplicate {
                username: req.username().to_string(),
                pen_name: req.pen_name().to_string(),
            };
        }
        if db_err.is_foreign_key_violation() {
            return CreateAuthorError::UnknownGroup {
                group_id: req.group_id(),
            };
        }
    }

    let err = anyhow!(err).context(format!(
        r#"Failed to create author with username "{}""#,
        req.username()
    ));
    CreateAuthorError::Other(err)
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
