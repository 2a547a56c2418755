// userd
// Copyright 2024 The userd Authors
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Database abstraction to manipulate users and sessions.
//!
//! The facilities in this module provide an abstraction over different database systems.
//! The PostgreSQL backend is for production use and the SQLite backend is primarily
//! intended to support unit tests.
//!
//! Domain operations are implemented as free functions that take an `Executor`, which
//! forces call sites to be explicit about whether they run against the pool or inside a
//! transaction.

use crate::model::{
    AccessToken, HashedPassword, ModelError, Role, Session, User, UserId, Username,
};
use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use time::OffsetDateTime;

pub mod postgres;
pub mod sqlite;
#[cfg(test)]
mod tests;

/// Database errors.  Any unexpected errors that come from the database are classified as
/// `BackendError`, but errors we know about have more specific types.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum DbError {
    /// Indicates that a request to create an entry failed because it already exists.
    #[error("Already exists")]
    AlreadyExists,

    /// Catch-all error type for unexpected database errors.
    #[error("Database error: {0}")]
    BackendError(String),

    /// Indicates a failure processing the data that already exists in the database.
    #[error("Data integrity error: {0}")]
    DataIntegrityError(String),

    /// Indicates that a requested entry does not exist.
    #[error("Entity not found")]
    NotFound,

    /// Indicates that the database is not available (maybe because of too many active
    /// concurrent connections).
    #[error("Unavailable")]
    Unavailable,
}

impl From<ModelError> for DbError {
    fn from(e: ModelError) -> Self {
        DbError::DataIntegrityError(e.to_string())
    }
}

/// Result type for this module.
pub type DbResult<T> = Result<T, DbError>;

/// A database executor that can talk to multiple database implementations.
///
/// This type provides a generic mechanism to access a typed instance of a database, which
/// is needed by sqlx to offer type safety guarantees during query compilation.  Users of
/// this type are forced to destructure it and issue different calls for each database.
///
/// Note that this can wrap an executor that talks directly to a pool or to an open
/// transaction.
pub enum Executor {
    /// A PostgreSQL executor that can be used in `sqlx` operations.
    Postgres(postgres::PostgresExecutor),

    /// A SQLite executor that can be used in `sqlx` operations.
    Sqlite(sqlite::SqliteExecutor),
}

/// A wrapper for a database executor backed by an open transaction.
pub struct TxExecutor(Executor);

impl TxExecutor {
    /// Returns the executor wrapped by this transaction.
    ///
    /// This would be better called `executor` but this method is used so frequently that
    /// it makes call sites too verbose.
    pub fn ex(&mut self) -> &mut Executor {
        &mut self.0
    }

    /// Commits the transaction.
    pub async fn commit(self) -> DbResult<()> {
        match self.0 {
            Executor::Postgres(e) => e.commit().await,
            Executor::Sqlite(e) => e.commit().await,
        }
    }
}

/// Abstraction over the database connection.
#[async_trait]
pub trait Db {
    /// Obtains an executor for direct access to the pool.
    ///
    /// This would be better called `executor` but this method is used so frequently that
    /// it makes call sites too verbose.
    async fn ex(&self) -> DbResult<Executor>;

    /// Begins a transaction.
    ///
    /// It is the responsibility of the caller to call `commit` on the returned executor.
    /// Otherwise the transaction is rolled back on drop.
    async fn begin(&self) -> DbResult<TxExecutor>;

    /// Closes the connection pool.
    async fn close(&self);
}

/// Initializes the database schema.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        Executor::Postgres(ex) => postgres::run_schema(ex, include_str!("db/postgres.sql")).await,
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("db/sqlite.sql")).await,
    }
}

impl TryFrom<PgRow> for User {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let username: String = row.try_get("username").map_err(postgres::map_sqlx_error)?;
        let password: String = row.try_get("password").map_err(postgres::map_sqlx_error)?;
        let role_id: i32 = row.try_get("role_id").map_err(postgres::map_sqlx_error)?;
        let role_name: Option<String> =
            row.try_get("role_name").map_err(postgres::map_sqlx_error)?;

        let mut user = User::new(
            UserId::from_i64(id),
            Username::new(username)?,
            HashedPassword::new(password),
            role_id,
        );
        if let Some(role_name) = role_name {
            user = user.with_role(Role::from_name(&role_name)?);
        }
        Ok(user)
    }
}

impl TryFrom<SqliteRow> for User {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let username: String = row.try_get("username").map_err(sqlite::map_sqlx_error)?;
        let password: String = row.try_get("password").map_err(sqlite::map_sqlx_error)?;
        let role_id: i32 = row.try_get("role_id").map_err(sqlite::map_sqlx_error)?;
        let role_name: Option<String> =
            row.try_get("role_name").map_err(sqlite::map_sqlx_error)?;

        let mut user = User::new(
            UserId::from_i64(id),
            Username::new(username)?,
            HashedPassword::new(password),
            role_id,
        );
        if let Some(role_name) = role_name {
            user = user.with_role(Role::from_name(&role_name)?);
        }
        Ok(user)
    }
}

impl TryFrom<PgRow> for Session {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let access_token: String =
            row.try_get("access_token").map_err(postgres::map_sqlx_error)?;
        let username: String = row.try_get("username").map_err(postgres::map_sqlx_error)?;
        let login_time: OffsetDateTime =
            row.try_get("login_time").map_err(postgres::map_sqlx_error)?;

        let access_token = AccessToken::new(access_token)?;
        let username = Username::new(username)?;

        Ok(Session::new(access_token, username, login_time))
    }
}

impl TryFrom<SqliteRow> for Session {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let access_token: String = row.try_get("access_token").map_err(sqlite::map_sqlx_error)?;
        let username: String = row.try_get("username").map_err(sqlite::map_sqlx_error)?;
        let login_time_secs: i64 =
            row.try_get("login_time_secs").map_err(sqlite::map_sqlx_error)?;
        let login_time_nsecs: i64 =
            row.try_get("login_time_nsecs").map_err(sqlite::map_sqlx_error)?;

        let access_token = AccessToken::new(access_token)?;
        let username = Username::new(username)?;
        let login_time = sqlite::build_timestamp(login_time_secs, login_time_nsecs)?;

        Ok(Session::new(access_token, username, login_time))
    }
}

/// Common projection for user queries.
///
/// All user lookups join the roles table so that the rows can be decoded uniformly, even
/// though only the by-username lookup contractually needs the resolved role name.
const USER_PROJECTION: &str = "
    SELECT u.id, u.username, u.password, u.role_id, r.role_name
    FROM users u LEFT JOIN role r ON u.role_id = r.id";

/// Creates a new user named `username` with a `password` in hashed form and holding the
/// role identified by `role_id`.  Returns the user with its newly-assigned id.
pub async fn create_user(
    ex: &mut Executor,
    username: Username,
    password: HashedPassword,
    role_id: i32,
) -> DbResult<User> {
    let id = match ex {
        Executor::Postgres(ex) => {
            let query_str =
                "INSERT INTO users (username, password, role_id) VALUES ($1, $2, $3) RETURNING id";
            let row = sqlx::query(query_str)
                .bind(username.as_str())
                .bind(password.as_str())
                .bind(role_id)
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get::<i64, _>("id").map_err(postgres::map_sqlx_error)?
        }

        Executor::Sqlite(ex) => {
            let query_str =
                "INSERT INTO users (username, password, role_id) VALUES (?, ?, ?) RETURNING id";
            let row = sqlx::query(query_str)
                .bind(username.as_str())
                .bind(password.as_str())
                .bind(role_id)
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get::<i64, _>("id").map_err(sqlite::map_sqlx_error)?
        }
    };

    Ok(User::new(UserId::from_i64(id), username, password, role_id))
}

/// Gets information about an existing user given its `id`.
pub async fn get_user_by_id(ex: &mut Executor, id: UserId) -> DbResult<User> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str = format!("{} WHERE u.id = $1", USER_PROJECTION);
            let raw_user = sqlx::query(&query_str)
                .bind(id.as_i64())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            User::try_from(raw_user)
        }

        Executor::Sqlite(ex) => {
            let query_str = format!("{} WHERE u.id = ?", USER_PROJECTION);
            let raw_user = sqlx::query(&query_str)
                .bind(id.as_i64())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            User::try_from(raw_user)
        }
    }
}

/// Gets information about an existing user named `username`.
///
/// The lookup is case-insensitive to match the normalization applied when usernames are
/// created.
pub async fn get_user_by_username(ex: &mut Executor, username: &Username) -> DbResult<User> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str = format!("{} WHERE LOWER(u.username) = LOWER($1)", USER_PROJECTION);
            let raw_user = sqlx::query(&query_str)
                .bind(username.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            User::try_from(raw_user)
        }

        Executor::Sqlite(ex) => {
            let query_str = format!("{} WHERE LOWER(u.username) = LOWER(?)", USER_PROJECTION);
            let raw_user = sqlx::query(&query_str)
                .bind(username.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            User::try_from(raw_user)
        }
    }
}

/// Lists all known users in insertion order.
pub async fn list_users(ex: &mut Executor) -> DbResult<Vec<User>> {
    let raw_users = match ex {
        Executor::Postgres(ex) => {
            let query_str = format!("{} ORDER BY u.id", USER_PROJECTION);
            let raw_users = sqlx::query(&query_str)
                .fetch_all(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            raw_users.into_iter().map(User::try_from).collect::<DbResult<Vec<User>>>()
        }

        Executor::Sqlite(ex) => {
            let query_str = format!("{} ORDER BY u.id", USER_PROJECTION);
            let raw_users = sqlx::query(&query_str)
                .fetch_all(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            raw_users.into_iter().map(User::try_from).collect::<DbResult<Vec<User>>>()
        }
    };
    raw_users
}

/// Gets a session from its access token.  Sessions marked as deleted (logged out) are
/// ignored.
pub(crate) async fn get_session(
    ex: &mut Executor,
    access_token: &AccessToken,
) -> DbResult<Session> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str = "
                SELECT access_token, username, login_time
                FROM sessions
                WHERE access_token = $1 AND logout_time IS NULL";
            let raw_session = sqlx::query(query_str)
                .bind(access_token.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            Session::try_from(raw_session)
        }

        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT access_token, username, login_time_secs, login_time_nsecs
                FROM sessions
                WHERE
                    access_token = ? AND
                    logout_time_secs IS NULL AND
                    logout_time_nsecs IS NULL";
            let raw_session = sqlx::query(query_str)
                .bind(access_token.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Session::try_from(raw_session)
        }
    }
}

/// Saves a session.
pub(crate) async fn put_session(ex: &mut Executor, session: &Session) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str =
                "INSERT INTO sessions (access_token, username, login_time) VALUES ($1, $2, $3)";
            let done = sqlx::query(query_str)
                .bind(session.access_token().as_str())
                .bind(session.username().as_str())
                .bind(session.login_time())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(ex) => {
            let (login_time_secs, login_time_nsecs) =
                sqlite::unpack_timestamp(session.login_time());

            let query_str = "
                INSERT INTO sessions (access_token, username, login_time_secs, login_time_nsecs)
                VALUES (?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(session.access_token().as_str())
                .bind(session.username().as_str())
                .bind(login_time_secs)
                .bind(login_time_nsecs)
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }
    };

    if rows_affected != 1 {
        return Err(DbError::BackendError("Insertion affected more than one row".to_owned()));
    }
    Ok(())
}

/// Marks a session as deleted at time `now`.
pub(crate) async fn delete_session(
    ex: &mut Executor,
    session: Session,
    now: OffsetDateTime,
) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE sessions SET logout_time = $1
                WHERE access_token = $2 AND logout_time IS NULL";
            let done = sqlx::query(query_str)
                .bind(now)
                .bind(session.access_token().as_str())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(ex) => {
            let (now_secs, now_nsecs) = sqlite::unpack_timestamp(now);

            let query_str = "
                UPDATE sessions SET logout_time_secs = ?, logout_time_nsecs = ?
                WHERE
                    access_token = ? AND
                    logout_time_secs IS NULL AND
                    logout_time_nsecs IS NULL";
            let done = sqlx::query(query_str)
                .bind(now_secs)
                .bind(now_nsecs)
                .bind(session.access_token().as_str())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }
    };

    match rows_affected {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        _ => Err(DbError::BackendError("Update affected more than one row".to_owned())),
    }
}
