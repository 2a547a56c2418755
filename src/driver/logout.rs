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

//! Extends the driver with the `logout` operation.

use crate::db::{self, DbError};
use crate::driver::{Driver, DriverError, DriverResult};
use crate::model::AccessToken;

impl Driver {
    /// Closes the session identified by `token`.
    ///
    /// The session row is kept around with its logout timestamp for auditing purposes, but
    /// it stops being usable right away.
    pub(crate) async fn logout(self, token: AccessToken) -> DriverResult<()> {
        let now = self.clock.now_utc();

        let mut tx = self.db.begin().await?;

        let session = match db::get_session(tx.ex(), &token).await {
            Ok(session) => session,
            Err(DbError::NotFound) => {
                return Err(DriverError::Unauthorized("Invalid session".to_owned()));
            }
            Err(e) => return Err(e.into()),
        };

        db::delete_session(tx.ex(), session, now).await?;

        tx.commit().await?;

        // Make sure follow-up requests with the same token do not reuse a cached session
        // that we know is gone.
        let mut cache = self.sessions_cache.lock().await;
        cache.remove(&token);

        Ok(())
    }
}
