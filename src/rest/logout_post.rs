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

//! API to log the current user out.

use crate::driver::Driver;
use crate::rest::httputils::{clear_session_cookie, found, get_session_cookie};
use crate::rest::{EmptyBody, RestResult};
use axum::extract::State;
use axum::http::{HeaderMap, header};
use axum::response::Response;

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    headers: HeaderMap,
    _: EmptyBody,
) -> RestResult<Response> {
    let token = get_session_cookie(&headers)?;
    driver.logout(token).await?;

    let mut response = found("/login?logout");
    response.headers_mut().insert(header::SET_COOKIE, clear_session_cookie());
    Ok(response)
}
