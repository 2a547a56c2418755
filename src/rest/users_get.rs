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

//! API to list all registered users.

use crate::driver::Driver;
use crate::model::Role;
use crate::rest::httputils::require_role;
use crate::rest::{EmptyBody, RestResult, UserEntry};
use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    headers: HeaderMap,
    _: EmptyBody,
) -> RestResult<Json<Vec<UserEntry>>> {
    require_role(&driver, &headers, Role::Admin).await?;

    let users = driver.list_users().await?;
    Ok(Json(users.iter().map(UserEntry::from).collect()))
}
