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

//! API to register a new user.

use crate::driver::Driver;
use crate::model::{Password, Username};
use crate::rest::{RestResult, UserEntry};
use axum::Json;
use axum::extract::State;
use log::info;
use serde::Deserialize;

/// Message of the request.
#[derive(Deserialize)]
pub(crate) struct SignupRequest {
    /// Name of the user to create.
    username: Username,

    /// Cleartext password for the new user.
    password: Password,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Json(request): Json<SignupRequest>,
) -> RestResult<Json<UserEntry>> {
    let user = driver.add_user(request.username, request.password).await?;
    info!("Registered user {} with id {}", user.username().as_str(), user.id());
    Ok(Json(UserEntry::from(&user)))
}
