use argon2::{Argon2, PasswordHash, PasswordVerifier};
use authors_service::database::{SqliteRepository, establish_pool};
use authors_service::http::auth::TokenDecoder;
use authors_service::http::{AppState, router};
use authors_service::models::{
    CreateAuthorError, CreateAuthorRequest, FindAuthorError, FindAuthorRequest, FindIdentityError,
    ListAuthorsRequest, PenName, RecentArticlesRequest, Username,
};
use authors_service::password::PasswordHasher;
use authors_service::render::TemplateRenderer;
use authors_service::repositories::{ArticleRepository, AuthorRepository};
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

const WRITERS: i64 = 2;
const ADMINISTRATORS: i64 = 1;

fn digest_matches(password: &str, digest: &str) -> bool {
    let parsed = PasswordHash::new(digest).unwrap();
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

struct TestDb {
    pool: SqlitePool,
    repo: SqliteRepository,
    _dir: TempDir,
}

impl TestDb {
    async fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let path = dir.path().join("authors.db");
        let pool = establish_pool(&format!("sqlite://{}", path.display()))
            .await
            .expect("failed to open test database");
        let repo = SqliteRepository::new(pool.clone());
        Self {
            pool,
            repo,
            _dir: dir,
        }
    }

    async fn create(&self, username: &str, pen_name: &str, group_id: i64) -> i64 {
        let req = CreateAuthorRequest::new(
            Username::new(username).unwrap(),
            PasswordHasher::default().hash("secret").unwrap(),
            PenName::new(pen_name).unwrap(),
            None,
            Some(format!("{pen_name} writes things")),
            group_id,
        );
        self.repo.create_author(&req).await.unwrap().id()
    }

    async fn publish(&self, title: &str, author: &str) {
        sqlx::query("INSERT INTO articles (title, author, summary) VALUES (?, ?, ?)")
            .bind(title)
            .bind(author)
            .bind(format!("{title} in brief"))
            .execute(&self.pool)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn lists_authors_by_id_in_pages() {
    let db = TestDb::new().await;
    for i in 0..6 {
        db.create(&format!("user{i}"), &format!("Pen {i}"), WRITERS).await;
    }

    let first = db
        .repo
        .list_authors(&ListAuthorsRequest::new(0, 4))
        .await
        .unwrap();
    let second = db
        .repo
        .list_authors(&ListAuthorsRequest::new(4, 4))
        .await
        .unwrap();
    let past_end = db
        .repo
        .list_authors(&ListAuthorsRequest::new(8, 4))
        .await
        .unwrap();

    let ids: Vec<_> = first.iter().chain(&second).map(|a| a.id()).collect();
    assert_eq!(ids, [1, 2, 3, 4, 5, 6]);
    assert_eq!(first.len(), 4);
    assert!(past_end.is_empty());
    assert_eq!(db.repo.count_authors().await.unwrap(), 6);
}

#[tokio::test]
async fn stores_digest_and_optional_fields() {
    let db = TestDb::new().await;
    let id = db.create("ada", "Lovelace", WRITERS).await;

    let stored = db
        .repo
        .list_authors(&ListAuthorsRequest::new(0, 1))
        .await
        .unwrap()
        .remove(0);
    assert_eq!(stored.id(), id);
    assert_eq!(stored.username().to_string(), "ada");
    assert_eq!(stored.group_id(), WRITERS);
    assert_eq!(stored.avatar(), None);
    assert_eq!(stored.introduce(), Some("Lovelace writes things"));
    assert!(digest_matches("secret", stored.password_digest()));
}

#[tokio::test]
async fn rejects_duplicates_and_unknown_groups() {
    let db = TestDb::new().await;
    db.create("ada", "Lovelace", WRITERS).await;

    let duplicate = CreateAuthorRequest::new(
        Username::new("ada").unwrap(),
        "digest".to_string(),
        PenName::new("Someone Else").unwrap(),
        None,
        None,
        WRITERS,
    );
    assert!(matches!(
        db.repo.create_author(&duplicate).await,
        Err(CreateAuthorError::Duplicate { .. })
    ));

    let orphan = CreateAuthorRequest::new(
        Username::new("grace").unwrap(),
        "digest".to_string(),
        PenName::new("Hopper").unwrap(),
        None,
        None,
        99,
    );
    assert!(matches!(
        db.repo.create_author(&orphan).await,
        Err(CreateAuthorError::UnknownGroup { group_id: 99 })
    ));
}

#[tokio::test]
async fn finds_public_profile() {
    let db = TestDb::new().await;
    let id = db.create("ada", "Lovelace", WRITERS).await;

    let profile = db
        .repo
        .find_author_profile(&FindAuthorRequest::new(id))
        .await
        .unwrap();
    assert_eq!(profile.id(), id);
    assert_eq!(profile.pen_name(), "Lovelace");
    assert_eq!(profile.introduce(), Some("Lovelace writes things"));

    assert!(matches!(
        db.repo.find_author_profile(&FindAuthorRequest::new(404)).await,
        Err(FindAuthorError::NotFound { id: 404 })
    ));
}

#[tokio::test]
async fn resolves_group_permissions() {
    let db = TestDb::new().await;
    let admin = db.create("root", "Admin", ADMINISTRATORS).await;
    let writer = db.create("ada", "Lovelace", WRITERS).await;

    let identity = db.repo.find_identity(admin).await.unwrap();
    assert_eq!(identity.author_id(), admin);
    for permission in [
        "create_users",
        "delete_users",
        "update_users",
        "update_private_users",
    ] {
        assert!(identity.has_permission(permission), "{permission}");
    }

    let identity = db.repo.find_identity(writer).await.unwrap();
    assert!(!identity.has_permission("create_users"));

    assert!(matches!(
        db.repo.find_identity(77).await,
        Err(FindIdentityError::NotFound { id: 77 })
    ));
}

#[tokio::test]
async fn finds_newest_articles_by_pen_name() {
    let db = TestDb::new().await;
    for i in 1..=6 {
        db.publish(&format!("Note {i}"), "Lovelace").await;
        if i % 3 == 0 {
            db.publish(&format!("Other {i}"), "Hopper").await;
        }
    }

    let articles = db
        .repo
        .find_recent_articles(&RecentArticlesRequest::new("Lovelace", 4))
        .await
        .unwrap();

    let titles: Vec<_> = articles.iter().map(|a| a.title()).collect();
    assert_eq!(titles, ["Note 6", "Note 5", "Note 4", "Note 3"]);
    assert!(articles.iter().all(|a| a.author() == "Lovelace"));
    assert!(articles.windows(2).all(|w| w[0].id() > w[1].id()));
    assert_eq!(articles[0].summary(), Some("Note 6 in brief"));
}

#[tokio::test]
async fn serves_pages_from_database() {
    let db = TestDb::new().await;
    let id = db.create("ada", "Lovelace", WRITERS).await;
    db.create("grace", "Hopper", WRITERS).await;
    db.publish("Notes on the Analytical Engine", "Lovelace").await;

    let repo = Arc::new(db.repo.clone());
    let state = AppState::new(
        repo.clone(),
        repo,
        Arc::new(TemplateRenderer::new().unwrap()),
        TokenDecoder::new("unused"),
    );
    let app = router(state);

    let resp = app
        .clone()
        .oneshot(Request::get("/authors").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(html.to_vec()).unwrap();
    assert!(html.contains("Lovelace"));
    assert!(html.contains("Hopper"));
    assert!(!html.contains("$argon2id$"));

    let resp = app
        .oneshot(
            Request::get(format!("/authors/{id}"))
                .header(header::ACCEPT, "text/html")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(html.to_vec()).unwrap();
    assert!(html.contains("<title>Lovelace</title>"));
    assert!(html.contains("Notes on the Analytical Engine"));
}
