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

//! The `Role` data type.

use crate::model::{ModelError, ModelResult};
use std::fmt;

/// The set of roles a user can hold.
///
/// Roles have stable numeric identifiers because the database seeds the roles table with
/// them and the users table references them by id.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    /// Regular user with no access to the management APIs.
    User,

    /// Administrator with access to the user listing and lookup APIs.
    Admin,
}

impl Role {
    /// Returns the numeric identifier of the role as stored in the database.
    pub fn id(self) -> i32 {
        match self {
            Role::User => 1,
            Role::Admin => 2,
        }
    }

    /// Returns the canonical name of the role.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    /// Creates a role from its canonical name as stored in the database.
    pub(crate) fn from_name(name: &str) -> ModelResult<Self> {
        match name {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            name => Err(ModelError(format!("Unknown role '{}'", name))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
