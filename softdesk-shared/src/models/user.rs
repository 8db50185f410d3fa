/// User model and database operations
///
/// Users sign up once, log in with their username, and may only update their
/// own record. They are never deleted through the API.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     username VARCHAR(150) NOT NULL UNIQUE,
///     email VARCHAR(254),
///     first_name VARCHAR(150) NOT NULL DEFAULT '',
///     last_name VARCHAR(150) NOT NULL DEFAULT '',
///     password_hash VARCHAR(255) NOT NULL,
///     age INTEGER NOT NULL CHECK (age >= 15),
///     can_be_contacted BOOLEAN NOT NULL DEFAULT FALSE,
///     can_data_be_shared BOOLEAN NOT NULL DEFAULT FALSE,
///     is_superuser BOOLEAN NOT NULL DEFAULT FALSE,
///     date_joined TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use softdesk_shared::models::user::{User, CreateUser};
/// use softdesk_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::from_url("postgresql://localhost/softdesk")).await?;
///
/// let user = User::create(&pool, CreateUser {
///     username: "ada".to_string(),
///     email: Some("ada@example.com".to_string()),
///     first_name: "Ada".to_string(),
///     last_name: "Lovelace".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     age: 36,
///     can_be_contacted: true,
///     can_data_be_shared: false,
/// }).await?;
///
/// let found = User::find_by_username(&pool, "ada").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

/// Minimum age accepted at signup and on profile updates
pub const MIN_AGE: i32 = 15;

/// Name of the unique constraint on `username`
pub const USERNAME_CONSTRAINT: &str = "users_username_key";

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, password_hash, age, \
     can_be_contacted, can_data_be_shared, is_superuser, date_joined, last_login";

/// User account
///
/// The password hash is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Primary key
    pub id: i64,

    /// Login name, unique across all users
    pub username: String,

    /// Optional contact address
    pub email: Option<String>,

    pub first_name: String,

    pub last_name: String,

    /// Argon2id PHC string
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Age in years, at least [`MIN_AGE`]
    pub age: i32,

    /// When false, the email address is redacted from API output
    pub can_be_contacted: bool,

    /// When false, identifying fields are redacted from API output
    pub can_data_be_shared: bool,

    /// Superusers bypass the contributor check
    pub is_superuser: bool,

    pub date_joined: DateTime<Utc>,

    pub last_login: Option<DateTime<Utc>>,
}

/// Input for creating a new user
///
/// Holds a password hash, never the plaintext password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub age: i32,
    pub can_be_contacted: bool,
    pub can_data_be_shared: bool,
}

/// Input for updating an existing user
///
/// Only `Some` fields are written. `email: Some(None)` clears the address.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<Option<String>>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<i32>,
    pub can_be_contacted: Option<bool>,
    pub can_data_be_shared: Option<bool>,
}

impl UpdateUser {
    /// Returns true when no field would be written
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.age.is_none()
            && self.can_be_contacted.is_none()
            && self.can_data_be_shared.is_none()
    }
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Fails on a duplicate username ([`USERNAME_CONSTRAINT`]) or if the age
    /// check constraint is violated.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO users (username, email, first_name, last_name, password_hash, age,
                               can_be_contacted, can_data_be_shared)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.username)
            .bind(data.email)
            .bind(data.first_name)
            .bind(data.last_name)
            .bind(data.password_hash)
            .bind(data.age)
            .bind(data.can_be_contacted)
            .bind(data.can_data_be_shared)
            .fetch_one(pool)
            .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by username (exact match)
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Lists all users ordered by ID
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC");

        sqlx::query_as::<_, User>(&query).fetch_all(pool).await
    }

    /// Updates an existing user
    ///
    /// Builds the `SET` clause from the fields present in `data`. An empty
    /// update returns the current row unchanged.
    ///
    /// # Returns
    ///
    /// The updated user, or `None` if no user has this ID
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET ");
        let mut set = builder.separated(", ");

        if let Some(username) = data.username {
            set.push("username = ").push_bind_unseparated(username);
        }
        if let Some(email) = data.email {
            set.push("email = ").push_bind_unseparated(email);
        }
        if let Some(first_name) = data.first_name {
            set.push("first_name = ").push_bind_unseparated(first_name);
        }
        if let Some(last_name) = data.last_name {
            set.push("last_name = ").push_bind_unseparated(last_name);
        }
        if let Some(age) = data.age {
            set.push("age = ").push_bind_unseparated(age);
        }
        if let Some(can_be_contacted) = data.can_be_contacted {
            set.push("can_be_contacted = ")
                .push_bind_unseparated(can_be_contacted);
        }
        if let Some(can_data_be_shared) = data.can_data_be_shared {
            set.push("can_data_be_shared = ")
                .push_bind_unseparated(can_data_be_shared);
        }

        builder.push(" WHERE id = ").push_bind(id);
        builder.push(" RETURNING ").push(USER_COLUMNS);

        builder
            .build_query_as::<User>()
            .fetch_optional(pool)
            .await
    }

    /// Records a successful login
    pub async fn update_last_login(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
