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

//! High-level data types to represent the domain of the service.
//!
//! The types in this module use the newtype pattern extensively so that invalid values
//! cannot exist once constructed, and so that the different concepts cannot be mixed up
//! with each other in function calls.

mod accesstoken;
pub use accesstoken::AccessToken;
mod passwords;
pub use passwords::{HashedPassword, Password};
mod role;
pub use role::Role;
mod session;
pub use session::Session;
mod user;
pub use user::{User, UserId};
mod username;
pub use username::Username;

/// Errors raised when validating untrusted input data.
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct ModelError(pub String);

/// Result type for this module.
pub type ModelResult<T> = Result<T, ModelError>;
