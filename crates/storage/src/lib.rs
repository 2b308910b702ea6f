use anyhow::{Context, Result};
use async_trait::async_trait;
use controller::Model;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use shared::{
    domain::{Todo, TodoCounts, TodoId, TodoPatch, TodoQuery},
    error::TodoError,
};

const MEMORY_URL_PREFIX: &str = "sqlite::memory:";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url '{database_url}'"))?
            .create_if_missing(true);

        // Every connection to an in-memory url opens its own empty database,
        // so those pools are pinned to one long-lived connection.
        let pool_options = if database_url.starts_with(MEMORY_URL_PREFIX) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(connect_options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::debug!(database_url, "todo storage ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn list_todos(&self, query: TodoQuery) -> Result<Vec<Todo>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, completed
            FROM todos
            WHERE (?1 IS NULL OR id = ?1)
              AND (?2 IS NULL OR completed = ?2)
            ORDER BY id ASC
            "#,
        )
        .bind(query.id.map(|id| id.0))
        .bind(query.completed)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(todo_from_row).collect()
    }

    pub async fn count_todos(&self) -> Result<TodoCounts> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total, COALESCE(SUM(completed), 0) AS completed FROM todos",
        )
        .fetch_one(&self.pool)
        .await?;

        let total = usize::try_from(row.get::<i64, _>("total"))?;
        let completed = usize::try_from(row.get::<i64, _>("completed"))?;
        Ok(TodoCounts {
            active: total - completed,
            completed,
            total,
        })
    }

    pub async fn insert_todo(&self, title: &str) -> Result<Todo> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TodoError::EmptyTitle.into());
        }

        let row = sqlx::query(
            "INSERT INTO todos (title, completed) VALUES (?, 0) RETURNING id, title, completed",
        )
        .bind(title)
        .fetch_one(&self.pool)
        .await?;
        todo_from_row(&row)
    }

    pub async fn update_todo(&self, id: TodoId, changes: TodoPatch) -> Result<()> {
        let title = match changes.title.as_deref().map(str::trim) {
            Some("") => return Err(TodoError::EmptyTitle.into()),
            other => other,
        };

        if changes.is_empty() {
            let found: Option<i64> = sqlx::query_scalar("SELECT id FROM todos WHERE id = ?")
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await?;
            return match found {
                Some(_) => Ok(()),
                None => Err(TodoError::NotFound(id).into()),
            };
        }

        let result = sqlx::query(
            r#"
            UPDATE todos
            SET title = COALESCE(?1, title),
                completed = COALESCE(?2, completed),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?3
            "#,
        )
        .bind(title)
        .bind(changes.completed)
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(TodoError::NotFound(id).into());
        }
        Ok(())
    }

    /// Deleting an id that is already gone is not an error.
    pub async fn delete_todo(&self, id: TodoId) -> Result<()> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            tracing::debug!(todo_id = id.0, "delete matched no todo");
        }
        Ok(())
    }

    pub async fn remove_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM todos")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Model for Storage {
    async fn read(&self, query: TodoQuery) -> Result<Vec<Todo>> {
        self.list_todos(query).await
    }

    async fn get_count(&self) -> Result<TodoCounts> {
        self.count_todos().await
    }

    async fn create(&self, title: &str) -> Result<Todo> {
        self.insert_todo(title).await
    }

    async fn update(&self, id: TodoId, changes: TodoPatch) -> Result<()> {
        self.update_todo(id, changes).await
    }

    async fn remove(&self, id: TodoId) -> Result<()> {
        self.delete_todo(id).await
    }
}

fn todo_from_row(row: &SqliteRow) -> Result<Todo> {
    Ok(Todo {
        id: TodoId(row.try_get::<i64, _>("id")?),
        title: row.try_get::<String, _>("title")?,
        completed: row.try_get::<bool, _>("completed")?,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with(MEMORY_URL_PREFIX) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
