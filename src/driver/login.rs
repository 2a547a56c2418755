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

//! Extends the driver with the `login` operation.

use crate::db::{self, DbError};
use crate::driver::{Driver, DriverError, DriverResult};
use crate::model::{AccessToken, Password, Session, Username};

impl Driver {
    /// Verifies the credentials of `username` and, if valid, opens a new session for it.
    ///
    /// Failures to find the user and failures to validate the password are both reported
    /// as `Unauthorized` so that callers cannot tell which usernames are registered.
    pub(crate) async fn login(self, username: Username, password: Password) -> DriverResult<Session> {
        let now = self.clock.now_utc();

        let mut tx = self.db.begin().await?;

        let user = match db::get_user_by_username(tx.ex(), &username).await {
            Ok(user) => user,
            Err(DbError::NotFound) => {
                return Err(DriverError::Unauthorized("Unknown user".to_owned()));
            }
            Err(e) => return Err(e.into()),
        };

        if !password.verify(user.password())? {
            return Err(DriverError::Unauthorized("Invalid password".to_owned()));
        }

        let session = Session::new(AccessToken::generate(), username, now);
        db::put_session(tx.ex(), &session).await?;

        tx.commit().await?;

        Ok(session)
    }
}
