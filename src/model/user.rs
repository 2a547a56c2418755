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

//! The `User` and `UserId` data types.

use crate::model::{HashedPassword, Role, Username};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a user as assigned by the database.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Creates a user identifier from its raw numeric value.
    pub fn from_i64(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw numeric value of the identifier.
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Representation of a user's information.
#[derive(Debug, PartialEq)]
#[cfg_attr(test, derive(Clone))]
pub struct User {
    /// Identifier of the user.
    id: UserId,

    /// Name of the user.
    username: Username,

    /// Hashed password.
    password: HashedPassword,

    /// Identifier of the role the user holds.
    role_id: i32,

    /// The role the user holds, resolved from `role_id` when the query joins the roles
    /// table.
    role: Option<Role>,
}

impl User {
    /// Creates a new user with the given fields.
    pub(crate) fn new(
        id: UserId,
        username: Username,
        password: HashedPassword,
        role_id: i32,
    ) -> Self {
        Self { id, username, password, role_id, role: None }
    }

    /// Modifies a user to carry its resolved role.
    pub(crate) fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Gets the user's identifier.
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Gets the user's username.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Gets the user's password as a hash.
    pub fn password(&self) -> &HashedPassword {
        &self.password
    }

    /// Gets the identifier of the user's role.
    pub fn role_id(&self) -> i32 {
        self.role_id
    }

    /// Gets the user's resolved role, or `None` if the user was fetched without resolving
    /// it.
    pub fn role(&self) -> Option<Role> {
        self.role
    }
}
