//! Session and credential store backed by the `users`, `roles` and `sessions` tables.
//!
//! Produces the [`Caller`] the resolution pipeline runs with. Passwords and session
//! ids are never logged.

use crate::error::AppError;
use crate::resolve::Caller;
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use subtle::ConstantTimeEq;

pub type SessionId = i64;

const MAX_SESSION_ID_ATTEMPTS: usize = 8;

/// Hex SHA-256 of the password, matching `users.password_sha256`.
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Compares two secrets in constant time. Unequal lengths are unequal.
pub fn secret_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Random non-negative 63-bit id.
fn new_session_id() -> SessionId {
    (rand::thread_rng().gen::<u64>() >> 1) as SessionId
}

/// Fields required to register a user.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub id: String,
    pub nick: String,
    pub avatar: String,
    pub signature: String,
    pub password: String,
}

#[derive(Clone)]
pub struct SessionStore {
    pool: SqlitePool,
    session_hours: u32,
    default_roles: Vec<String>,
}

impl SessionStore {
    pub fn new(pool: SqlitePool, session_hours: u32, default_roles: Vec<String>) -> Self {
        SessionStore {
            pool,
            session_hours,
            default_roles,
        }
    }

    pub fn default_roles(&self) -> &[String] {
        &self.default_roles
    }

    /// Caller for a live session, or `None` if the id is unknown or expired.
    /// A user without any role still authenticates, with an empty role set.
    pub async fn lookup(&self, session_id: SessionId) -> Result<Option<Caller>, AppError> {
        let rows: Vec<(String, Option<String>)> = sqlx::query_as(
            "SELECT users.id, roles.role FROM sessions
             JOIN users ON users.id = sessions.users_id
             LEFT JOIN roles ON roles.users_id = users.id
             WHERE sessions.id = ? AND sessions.created > datetime('now', ?)",
        )
        .bind(session_id)
        .bind(format!("-{} hours", self.session_hours))
        .fetch_all(&self.pool)
        .await?;

        let Some((users_id, _)) = rows.first() else {
            return Ok(None);
        };
        let caller = Caller::new(
            Some(users_id.clone()),
            rows.iter().filter_map(|(_, role)| role.clone()),
        );
        tracing::debug!(users_id = %users_id, roles = ?caller.roles, "session recognized");
        Ok(Some(caller))
    }

    pub async fn roles_of(&self, users_id: &str) -> Result<Vec<String>, AppError> {
        let roles = sqlx::query_scalar("SELECT role FROM roles WHERE users_id = ? ORDER BY role")
            .bind(users_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    /// Start a session if the password matches.
    pub async fn login(&self, users_id: &str, password: &str) -> Result<Option<SessionId>, AppError> {
        let stored: Option<String> =
            sqlx::query_scalar("SELECT password_sha256 FROM users WHERE id = ?")
                .bind(users_id)
                .fetch_optional(&self.pool)
                .await?;
        match stored {
            Some(hash) if secret_eq(&hash, &hash_password(password)) => {
                let id = self.insert_session(users_id).await?;
                tracing::info!(users_id = %users_id, "session started");
                Ok(Some(id))
            }
            _ => {
                tracing::info!(users_id = %users_id, "login rejected");
                Ok(None)
            }
        }
    }

    async fn insert_session(&self, users_id: &str) -> Result<SessionId, AppError> {
        let mut last_err = None;
        for _ in 0..MAX_SESSION_ID_ATTEMPTS {
            let id = new_session_id();
            let inserted = sqlx::query("INSERT INTO sessions (id, users_id) VALUES (?, ?)")
                .bind(id)
                .bind(users_id)
                .execute(&self.pool)
                .await;
            match inserted {
                Ok(_) => return Ok(id),
                Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                    last_err = Some(sqlx::Error::Database(e));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(last_err.map(AppError::Db).unwrap_or_else(|| {
            AppError::Unauthenticated("could not allocate a session".into())
        }))
    }

    pub async fn logout(&self, session_id: SessionId) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Insert the user with the default roles, then start a session.
    pub async fn register(&self, user: &NewUser) -> Result<SessionId, AppError> {
        let mut tx = self.pool.begin().await?;
        let inserted = sqlx::query(
            "INSERT INTO users (id, nick, avatar, signature, password_sha256) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.nick)
        .bind(&user.avatar)
        .bind(&user.signature)
        .bind(hash_password(&user.password))
        .execute(&mut *tx)
        .await;
        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(AppError::BadParams(format!("user '{}' already exists", user.id)));
            }
            Err(e) => return Err(e.into()),
        }
        for role in &self.default_roles {
            sqlx::query("INSERT INTO roles (users_id, role) VALUES (?, ?)")
                .bind(&user.id)
                .bind(role)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        tracing::info!(users_id = %user.id, roles = ?self.default_roles, "user registered");
        self.insert_session(&user.id).await
    }
}
