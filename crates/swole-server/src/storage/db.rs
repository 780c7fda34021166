//! SQLite database layer (embedded, no external dependencies)

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::Path;
use swole_types::{NewWorkout, User, Workout, WorkoutPatch};

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_path: &Path) -> Result<Self> {
        tracing::info!("Opening SQLite database at: {}", database_path.display());

        let parent = database_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        tokio::fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;

        // Check if directory is writable
        let test_file = parent.join(".write_test");
        match tokio::fs::write(&test_file, b"test").await {
            Ok(_) => {
                let _ = tokio::fs::remove_file(&test_file).await;
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Database directory is not writable: {}: {}",
                    parent.display(),
                    e
                ));
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to SQLite database at: {}",
                    database_path.display()
                )
            })?;

        Self::from_pool(pool).await
    }

    /// Private in-memory database. A single connection that never idles out,
    /// since each SQLite memory connection is its own database.
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("Failed to open in-memory SQLite database")?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self> {
        Self::create_schema(&pool)
            .await
            .context("Failed to create database schema")?;

        tracing::info!("Database initialization complete");
        Ok(Self { pool })
    }

    async fn create_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS "user" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workout (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES "user"(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                weight TEXT NOT NULL,
                reps TEXT NOT NULL,
                muscle TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_workout_user_id ON workout(user_id)")
            .execute(pool)
            .await?;

        Ok(())
    }

    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    /// Wait for checked-out connections and close the pool
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // User operations

    /// Insert a user and return its id. A taken username surfaces as a
    /// unique violation, see [`is_unique_violation`].
    pub async fn create_user(&self, username: &str, password_hash: &str) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO "user" (username, password)
            VALUES (?1, ?2)
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// `(id, password_hash)` for a username
    pub async fn get_credentials(&self, username: &str) -> Result<Option<(i64, String)>> {
        let row: Option<(i64, String)> = sqlx::query_as(
            r#"
            SELECT id, password FROM "user" WHERE username = ?1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn user_exists(&self, id: i64) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as(r#"SELECT id FROM "user" WHERE id = ?1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, username FROM "user" WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let workouts = self.list_workouts_by_user(row.id).await?;
        Ok(Some(row.into_user(workouts)))
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(
            r#"
            SELECT id, username FROM "user" ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_user: HashMap<i64, Vec<Workout>> = HashMap::new();
        for workout in self.list_workouts().await? {
            by_user.entry(workout.user_id).or_default().push(workout);
        }

        Ok(rows
            .into_iter()
            .map(|r| {
                let workouts = by_user.remove(&r.id).unwrap_or_default();
                r.into_user(workouts)
            })
            .collect())
    }

    /// Delete a user and, through the foreign key, every workout it owns.
    /// Returns false when no such user exists.
    pub async fn delete_user(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM "user" WHERE id = ?1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // Workout operations

    pub async fn create_workout(&self, workout: &NewWorkout) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO workout (user_id, title, weight, reps, muscle)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(workout.user_id)
        .bind(&workout.title)
        .bind(&workout.weight)
        .bind(&workout.reps)
        .bind(&workout.muscle)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    #[cfg(test)]
    pub async fn get_workout(&self, id: i64) -> Result<Option<Workout>> {
        let row: Option<WorkoutRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, title, weight, reps, muscle
            FROM workout WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    pub async fn list_workouts(&self) -> Result<Vec<Workout>> {
        let rows: Vec<WorkoutRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, title, weight, reps, muscle
            FROM workout ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    pub async fn list_workouts_by_user(&self, user_id: i64) -> Result<Vec<Workout>> {
        let rows: Vec<WorkoutRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, title, weight, reps, muscle
            FROM workout WHERE user_id = ?1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// Apply a partial update inside one transaction.
    /// Returns the updated workout, or None when it does not exist.
    pub async fn update_workout(&self, id: i64, patch: &WorkoutPatch) -> Result<Option<Workout>> {
        let mut tx = self.pool.begin().await?;

        let row: Option<WorkoutRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, title, weight, reps, muscle
            FROM workout WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut workout: Workout = row.into();
        patch.apply(&mut workout);

        sqlx::query(
            r#"
            UPDATE workout SET title = ?1, weight = ?2, reps = ?3, muscle = ?4
            WHERE id = ?5
            "#,
        )
        .bind(&workout.title)
        .bind(&workout.weight)
        .bind(&workout.reps)
        .bind(&workout.muscle)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(workout))
    }

    /// Returns false when no such workout exists
    pub async fn delete_workout(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM workout WHERE id = ?1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Whether an error from this layer is a UNIQUE constraint violation
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
        _ => false,
    }
}

// Helper structs for sqlx query_as
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
}

impl UserRow {
    fn into_user(self, workouts: Vec<Workout>) -> User {
        User {
            id: self.id,
            username: self.username,
            workouts,
        }
    }
}

#[derive(sqlx::FromRow)]
struct WorkoutRow {
    id: i64,
    user_id: i64,
    title: String,
    weight: String,
    reps: String,
    muscle: String,
}

impl From<WorkoutRow> for Workout {
    fn from(r: WorkoutRow) -> Self {
        Workout {
            id: r.id,
            user_id: r.user_id,
            title: r.title,
            weight: r.weight,
            reps: r.reps,
            muscle: r.muscle,
        }
    }
}
