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

//! Extends the driver with user lookup operations.

use crate::db::{self, DbError};
use crate::driver::{Driver, DriverError, DriverResult};
use crate::model::{User, UserId};

impl Driver {
    /// Gets information about the user with the given `id`.
    ///
    /// The identifier comes straight from the request path so it may legitimately be
    /// absent, in which case this fails with a backend error to expose the routing bug.
    pub(crate) async fn get_user(self, id: Option<UserId>) -> DriverResult<User> {
        let id = match id {
            Some(id) => id,
            None => return Err(DriverError::BackendError("User id not presented".to_owned())),
        };

        let mut ex = self.db.ex().await?;
        match db::get_user_by_id(&mut ex, id).await {
            Ok(user) => Ok(user),
            Err(DbError::NotFound) => {
                Err(DriverError::NotFound(format!("User not found for id={}", id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Lists all registered users.
    pub(crate) async fn list_users(self) -> DriverResult<Vec<User>> {
        let mut ex = self.db.ex().await?;
        Ok(db::list_users(&mut ex).await?)
    }
}
