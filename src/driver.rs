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

//! Business logic for user registration and session management.

use crate::clocks::Clock;
use crate::db::{self, Db, DbError};
use crate::env::get_optional_var;
use crate::model::{AccessToken, ModelError, User};
use futures::lock::Mutex;
use log::warn;
use lru_time_cache::LruCache;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;

mod login;
mod logout;
mod signup;
#[cfg(test)]
pub(crate) mod testutils;
mod users;

/// Default number of sessions to keep cached in memory.
const DEFAULT_SESSIONS_CACHE_CAPACITY: usize = 10 * 1024;

/// Default amount of time to keep cached sessions in memory.
const DEFAULT_SESSIONS_CACHE_TTL_SECONDS: u64 = 60;

/// Default value for the `SESSION_MAX_AGE` setting when not specified.
const DEFAULT_SESSION_MAX_AGE_SECONDS: u64 = 24 * 60 * 60;

/// Default value for the `SESSION_MAX_SKEW` setting when not specified.
const DEFAULT_SESSION_MAX_SKEW_SECONDS: u64 = 60 * 60;

/// Business logic errors.  These errors encompass backend and logical errors.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum DriverError {
    /// Indicates that a request to create an entry failed because it already exists.
    #[error("{0}")]
    AlreadyExists(String),

    /// Catch-all error type for unexpected backend errors.
    #[error("{0}")]
    BackendError(String),

    /// Indicates an error in the input data.
    #[error("{0}")]
    InvalidInput(String),

    /// Indicates that a requested entry does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Indicates that the caller is not allowed to perform the requested operation.
    #[error("{0}")]
    Unauthorized(String),
}

impl From<DbError> for DriverError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::AlreadyExists => DriverError::AlreadyExists(e.to_string()),
            DbError::BackendError(_) => DriverError::BackendError(e.to_string()),
            DbError::DataIntegrityError(_) => DriverError::BackendError(e.to_string()),
            DbError::NotFound => DriverError::NotFound(e.to_string()),
            DbError::Unavailable => DriverError::BackendError(e.to_string()),
        }
    }
}

impl From<ModelError> for DriverError {
    fn from(e: ModelError) -> Self {
        DriverError::InvalidInput(e.to_string())
    }
}

/// Result type for this module.
pub type DriverResult<T> = Result<T, DriverError>;

/// Configuration options for the driver.
#[derive(Clone, Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub struct DriverOptions {
    /// The number of sessions to keep cached in memory.
    pub sessions_cache_capacity: usize,

    /// The amount of time to keep cached sessions in memory.
    pub sessions_cache_ttl: Duration,

    /// The amount of time we consider sessions valid for.
    pub session_max_age: Duration,

    /// The amount of time we tolerate in clock skew when validating sessions.  We should
    /// never see this, except if we end up serving requests from different machines and
    /// their clocks aren't properly synchronized.
    pub session_max_skew: Duration,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            sessions_cache_capacity: DEFAULT_SESSIONS_CACHE_CAPACITY,
            sessions_cache_ttl: Duration::from_secs(DEFAULT_SESSIONS_CACHE_TTL_SECONDS),
            session_max_age: Duration::from_secs(DEFAULT_SESSION_MAX_AGE_SECONDS),
            session_max_skew: Duration::from_secs(DEFAULT_SESSION_MAX_SKEW_SECONDS),
        }
    }
}

impl DriverOptions {
    /// Creates a new set of options from environment variables.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        Ok(Self {
            sessions_cache_capacity: get_optional_var::<usize>(prefix, "SESSIONS_CACHE_CAPACITY")?
                .unwrap_or(DEFAULT_SESSIONS_CACHE_CAPACITY),
            sessions_cache_ttl: get_optional_var::<Duration>(prefix, "SESSIONS_CACHE_TTL")?
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_SESSIONS_CACHE_TTL_SECONDS)),
            session_max_age: get_optional_var::<Duration>(prefix, "SESSION_MAX_AGE")?
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_SESSION_MAX_AGE_SECONDS)),
            session_max_skew: get_optional_var::<Duration>(prefix, "SESSION_MAX_SKEW")?
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_SESSION_MAX_SKEW_SECONDS)),
        })
    }
}

/// Business logic.
///
/// The public operations exposed by the driver are all "one shot": they start and commit a
/// transaction, so it's incorrect for the caller to use two separate calls.  For this
/// reason, these operations consume the driver in an attempt to minimize the possibility
/// of executing two operations.  `get_session` is the exception because every protected
/// request needs it before the operation it gates.
#[derive(Clone)]
pub struct Driver {
    /// The database that the driver uses for persistence.
    db: Arc<dyn Db + Send + Sync>,

    /// Clock instance to obtain the current time.
    clock: Arc<dyn Clock + Send + Sync>,

    /// Options for the driver.
    opts: DriverOptions,

    /// Cache of sessions.
    sessions_cache: Arc<Mutex<LruCache<AccessToken, DriverResult<Arc<User>>>>>,
}

impl Driver {
    /// Creates a new driver backed by the given dependencies.
    pub fn new(
        db: Arc<dyn Db + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
        opts: DriverOptions,
    ) -> Self {
        let sessions_cache = LruCache::with_expiry_duration_and_capacity(
            opts.sessions_cache_ttl,
            opts.sessions_cache_capacity,
        );
        let sessions_cache = Arc::from(Mutex::from(sessions_cache));

        Self { db, clock, opts, sessions_cache }
    }

    /// Decodes the session in `token`, validates it and returns the user that owns the
    /// session.
    ///
    /// This is an internal helper for `get_session` that does not perform any caching.
    async fn get_session_uncached(
        &self,
        now: OffsetDateTime,
        token: AccessToken,
    ) -> DriverResult<User> {
        let mut ex = self.db.ex().await?;

        let session = match db::get_session(&mut ex, &token).await {
            Ok(session) => session,
            Err(DbError::NotFound) => {
                return Err(DriverError::Unauthorized("Invalid session".to_owned()));
            }
            Err(e) => return Err(e.into()),
        };

        let whoami = db::get_user_by_username(&mut ex, session.username()).await?;

        let login_time = session.login_time();
        let expired = login_time < (now - self.opts.session_max_age);
        let skew = login_time > (now + self.opts.session_max_skew);
        if expired || skew {
            return Err(DriverError::Unauthorized(
                "Session expired; please log in again".to_owned(),
            ));
        }

        Ok(whoami)
    }

    /// Decodes the session in `token`, validates it and returns the user that owns the
    /// session.
    ///
    /// Both OK and error results come from an internal cache, which should have been
    /// configured to evict entries relatively quickly.  In general, the cache should only
    /// hold entries for the predicted length of a frontend interaction.
    pub(crate) async fn get_session(&self, token: AccessToken) -> DriverResult<Arc<User>> {
        {
            let mut cache = self.sessions_cache.lock().await;
            if let Some(result) = cache.get(&token) {
                return result.clone();
            }
        }

        let now = self.clock.now_utc();
        let result = self.get_session_uncached(now, token.clone()).await.map(Arc::from);

        let mut cache = self.sessions_cache.lock().await;
        if let Some(old_result) = cache.insert(token, result.clone()) {
            if old_result != result {
                warn!(
                    "Cache insertion race detected with inconsistent values: {:?} != {:?}",
                    old_result, result
                );
            }
        }

        result
    }
}
