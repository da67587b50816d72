/// User model and database operations
///
/// Boardwalk does not own authentication: credentials are resolved to a user
/// id by the identity provider (see `auth::identity`). This model only keeps
/// the reference records that issues and memberships point at.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     name VARCHAR(255),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{constraint_of, DomainError, DomainResult};

/// User reference record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Email address (unique)
    pub email: String,

    /// Display name
    pub name: Option<String>,

    /// When the user was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new user record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address
    pub email: String,

    /// Display name
    pub name: Option<String>,
}

impl User {
    /// Creates a new user record
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` if the email is already registered.
    pub async fn create(pool: &PgPool, data: CreateUser) -> DomainResult<Self> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name)
            VALUES ($1, $2)
            RETURNING id, email, name, created_at
            "#,
        )
        .bind(&data.email)
        .bind(&data.name)
        .fetch_one(pool)
        .await
        .map_err(|e| match constraint_of(&e) {
            Some(c) if c.contains("email") => {
                DomainError::Conflict(format!("email {} already exists", data.email))
            }
            _ => e.into(),
        })?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> DomainResult<Option<Self>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email
    pub async fn find_by_email(pool: &PgPool, email: &str) -> DomainResult<Option<Self>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Checks whether a user id resolves
    pub async fn exists(pool: &PgPool, id: Uuid) -> DomainResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;

        Ok(exists)
    }
}
