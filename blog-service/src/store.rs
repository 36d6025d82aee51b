//! SQLite-backed storage for users and posts.
//!
//! Creates its tables on startup and implements the repository traits.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use common::auth::SubjectId;
use common::errors::{AppError, AppResult};
use common::models::{Post, User};
use common::response::PageRequest;

use crate::repository::{
    NewPost, NewUser, PostChanges, PostRepository, StoredCredentials, UserRepository,
};

const POST_COLUMNS: &str = "SELECT p.id, p.title, p.content, p.author_id, p.created_at, p.updated_at,
            u.nickname AS author_nickname, u.email AS author_email,
            u.created_at AS author_created_at, u.updated_at AS author_updated_at
     FROM posts p
     JOIN users u ON u.id = p.author_id";

/// Row from the `users` table, without the password hash.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    nickname: String,
    email: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: SubjectId::new(row.id),
            nickname: row.nickname,
            email: row.email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Row from `posts` joined with its author.
#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    content: String,
    author_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_nickname: String,
    author_email: String,
    author_created_at: DateTime<Utc>,
    author_updated_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        let author_id = SubjectId::new(row.author_id);
        Post {
            id: row.id,
            title: row.title,
            content: row.content,
            author_id,
            author: User {
                id: author_id,
                nickname: row.author_nickname,
                email: row.author_email,
                created_at: row.author_created_at,
                updated_at: row.author_updated_at,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Storage over a SQLite pool.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Connects to `url` and makes sure the schema exists.
    pub async fn connect(url: &str, max_connections: u32) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::Internal(format!("invalid DATABASE_URL: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseQuery(format!("failed to connect: {}", e)))?;

        let store = Self::from_pool(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Wraps an existing pool. The caller runs [`Store::ensure_schema`].
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates the `users` and `posts` tables if they do not exist.
    pub async fn ensure_schema(&self) -> AppResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                nickname   VARCHAR(255) NOT NULL UNIQUE,
                email      VARCHAR(100) NOT NULL UNIQUE,
                password   VARCHAR(255) NOT NULL,
                created_at DATETIME     NOT NULL,
                updated_at DATETIME     NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseQuery(format!("failed to create users table: {}", e)))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS posts (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                title      VARCHAR(255) NOT NULL UNIQUE,
                content    VARCHAR(255) NOT NULL,
                author_id  INTEGER      NOT NULL REFERENCES users (id) ON DELETE CASCADE,
                created_at DATETIME     NOT NULL,
                updated_at DATETIME     NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseQuery(format!("failed to create posts table: {}", e)))?;

        tracing::info!("tables `users` and `posts` ensured");
        Ok(())
    }

    /// Round-trips a trivial query.
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_user(&self, id: i64) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, nickname, email, created_at, updated_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn fetch_post(&self, id: i64) -> AppResult<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!("{POST_COLUMNS} WHERE p.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Post::from))
    }
}

#[async_trait]
impl UserRepository for Store {
    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO users (nickname, email, password, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.nickname)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.fetch_user(id)
            .await?
            .ok_or_else(|| AppError::Internal("inserted user vanished".into()))
    }

    async fn find_user(&self, id: SubjectId) -> AppResult<Option<User>> {
        self.fetch_user(id.get()).await
    }

    async fn find_credentials(&self, email: &str) -> AppResult<Option<StoredCredentials>> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT id, password FROM users WHERE email = ?")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(id, password_hash)| StoredCredentials {
            id: SubjectId::new(id),
            password_hash,
        }))
    }

    async fn list_users(&self, page: PageRequest) -> AppResult<(Vec<User>, u64)> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, nickname, email, created_at, updated_at FROM users
             ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok((rows.into_iter().map(User::from).collect(), total as u64))
    }

    async fn update_user(&self, id: SubjectId, changes: NewUser) -> AppResult<Option<User>> {
        let result = sqlx::query(
            "UPDATE users SET nickname = ?, email = ?, password = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&changes.nickname)
        .bind(&changes.email)
        .bind(&changes.password_hash)
        .bind(Utc::now())
        .bind(id.get())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_user(id.get()).await
    }

    async fn delete_user(&self, id: SubjectId) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.get())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl PostRepository for Store {
    async fn insert_post(&self, post: NewPost) -> AppResult<Post> {
        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO posts (title, content, author_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.author_id.get())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.fetch_post(id)
            .await?
            .ok_or_else(|| AppError::Internal("inserted post vanished".into()))
    }

    async fn find_post(&self, id: i64) -> AppResult<Option<Post>> {
        self.fetch_post(id).await
    }

    async fn list_posts(&self, page: PageRequest) -> AppResult<(Vec<Post>, u64)> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "{POST_COLUMNS} ORDER BY p.id LIMIT ? OFFSET ?"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;

        Ok((rows.into_iter().map(Post::from).collect(), total as u64))
    }

    async fn load_owner(&self, id: i64) -> AppResult<SubjectId> {
        let owner: Option<i64> = sqlx::query_scalar("SELECT author_id FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        owner
            .map(SubjectId::new)
            .ok_or_else(|| AppError::NotFound("post".into()))
    }

    async fn update_if_owned_by(
        &self,
        id: i64,
        owner: SubjectId,
        changes: PostChanges,
    ) -> AppResult<Option<Post>> {
        let result = sqlx::query(
            "UPDATE posts SET title = ?, content = ?, updated_at = ?
             WHERE id = ? AND author_id = ?",
        )
        .bind(&changes.title)
        .bind(&changes.content)
        .bind(Utc::now())
        .bind(id)
        .bind(owner.get())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_post(id).await
    }

    async fn delete_if_owned_by(&self, id: i64, owner: SubjectId) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ? AND author_id = ?")
            .bind(id)
            .bind(owner.get())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
