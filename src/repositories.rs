use crate::models::{
    ArticleSummary, Author, AuthorProfile, CreateAuthorError, CreateAuthorRequest,
    FindArticlesError, FindAuthorError, FindAuthorRequest, FindIdentityError, Identity,
    ListAuthorsError, ListAuthorsRequest, RecentArticlesRequest,
};
use async_trait::async_trait;

#[async_trait]
pub trait AuthorRepository: Send + Sync + 'static {
    async fn create_author(&self, req: &CreateAuthorRequest) -> Result<Author, CreateAuthorError>;

    /// One page of authors, ordered by id ascending.
    async fn list_authors(&self, req: &ListAuthorsRequest) -> Result<Vec<Author>, ListAuthorsError>;

    async fn count_authors(&self) -> Result<u64, ListAuthorsError>;

    async fn find_author_profile(
        &self,
        req: &FindAuthorRequest,
    ) -> Result<AuthorProfile, FindAuthorError>;

    /// Resolves an author id into the permissions granted to the author's group.
    async fn find_identity(&self, author_id: i64) -> Result<Identity, FindIdentityError>;
}

#[async_trait]
pub trait ArticleRepository: Send + Sync + 'static {
    /// Newest articles written under a pen name, ordered by id descending.
    async fn find_recent_articles(
        &self,
        req: &RecentArticlesRequest,
    ) -> Result<Vec<ArticleSummary>, FindArticlesError>;
}
