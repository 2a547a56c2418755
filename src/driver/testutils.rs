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

//! Test utilities for the business layer.

use crate::clocks::testutils::{SettableClock, utc_datetime};
use crate::db::{self, Db};
use crate::driver::{Driver, DriverOptions};
use crate::model::{AccessToken, Password, Role, User, Username};
use std::sync::Arc;

/// Returns a set of options that disable session caching.
pub(crate) fn opts_no_session_caching() -> DriverOptions {
    DriverOptions { sessions_cache_ttl: std::time::Duration::ZERO, ..Default::default() }
}

/// State of a running test.
pub(crate) struct TestContext {
    /// The database the driver is backed by.
    db: Arc<dyn Db + Send + Sync>,

    /// The clock the driver is backed by.
    clock: Arc<SettableClock>,

    /// The driver under test.
    driver: Driver,
}

impl TestContext {
    /// Initializes a driver against an empty in-memory database with the time set to a
    /// fixed instant.
    pub(crate) async fn setup(opts: DriverOptions) -> Self {
        let db: Arc<dyn Db + Send + Sync> =
            Arc::from(crate::db::sqlite::testutils::setup().await);
        let clock = Arc::from(SettableClock::new(utc_datetime(2023, 6, 1, 6, 0, 0)));
        let driver = Driver::new(db.clone(), clock.clone(), opts);
        Self { db, clock, driver }
    }

    /// Returns a clone of the driver under test, given that driver operations consume it.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    /// Returns direct access to the database.
    pub(crate) fn db(&self) -> &Arc<dyn Db + Send + Sync> {
        &self.db
    }

    /// Returns the clock that feeds the driver.
    pub(crate) fn clock(&self) -> &SettableClock {
        &self.clock
    }

    /// Creates a user named `username` with the given plain-text `password` and `role`,
    /// bypassing the driver.
    pub(crate) async fn create_test_user(
        &self,
        username: Username,
        password: &str,
        role: Role,
    ) -> User {
        let password = Password::new(password).unwrap().hash().unwrap();
        let mut ex = self.db.ex().await.unwrap();
        db::create_user(&mut ex, username, password, role.id()).await.unwrap()
    }

    /// Creates a user named `username` with the password `password` and logs it in,
    /// returning the access token of the new session.
    pub(crate) async fn do_test_login(&self, username: Username) -> AccessToken {
        self.create_test_user(username.clone(), "password", Role::User).await;
        let session = self
            .driver()
            .login(username, Password::new("password").unwrap())
            .await
            .unwrap();
        session.take_access_token()
    }
}
