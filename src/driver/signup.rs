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

//! Extends the driver with the `add_user` operation.

use crate::db::{self, DbError};
use crate::driver::{Driver, DriverError, DriverResult};
use crate::model::{Password, Role, User, Username};

impl Driver {
    /// Registers a new user named `username` with the given `password` and the default
    /// `USER` role.
    ///
    /// Uniqueness of usernames is enforced here, not by the schema, so the existence check
    /// and the insertion must happen within the same transaction.
    pub(crate) async fn add_user(self, username: Username, password: Password) -> DriverResult<User> {
        let password = password.hash()?;

        let mut tx = self.db.begin().await?;

        match db::get_user_by_username(tx.ex(), &username).await {
            Ok(_) => {
                return Err(DriverError::AlreadyExists(format!(
                    "User \"{}\" already exists",
                    username.as_str()
                )));
            }
            Err(DbError::NotFound) => (),
            Err(e) => return Err(e.into()),
        }

        let user = db::create_user(tx.ex(), username, password, Role::User.id()).await?;

        tx.commit().await?;

        Ok(user)
    }
}
