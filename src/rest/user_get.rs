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

//! API to get a single user by id.

use crate::driver::Driver;
use crate::model::{Role, UserId};
use crate::rest::httputils::require_role;
use crate::rest::{EmptyBody, RestResult, UserEntry};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;

/// API handler.
///
/// The id is taken as optional so that requests with a malformed id surface the backend's
/// "not presented" failure rather than a routing rejection.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    id: Option<Path<UserId>>,
    headers: HeaderMap,
    _: EmptyBody,
) -> RestResult<Json<UserEntry>> {
    require_role(&driver, &headers, Role::Admin).await?;

    let user = driver.get_user(id.map(|Path(id)| id)).await?;
    Ok(Json(UserEntry::from(&user)))
}
