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

//! API to log a user in from the login form.

use crate::driver::{Driver, DriverError};
use crate::model::{Password, Username};
use crate::rest::RestResult;
use crate::rest::httputils::{found, session_cookie};
use axum::extract::{Form, State};
use axum::http::header;
use axum::response::Response;
use serde::Deserialize;

/// Message of the request.
#[derive(Deserialize)]
pub(crate) struct LoginRequest {
    /// Name of the user to log in as.
    username: Username,

    /// Cleartext password to validate.
    password: Password,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Form(request): Form<LoginRequest>,
) -> RestResult<Response> {
    match driver.login(request.username, request.password).await {
        Ok(session) => {
            let cookie = session_cookie(session.access_token())?;
            let mut response = found("/");
            response.headers_mut().insert(header::SET_COOKIE, cookie);
            Ok(response)
        }
        Err(DriverError::Unauthorized(_)) => Ok(found("/login?error")),
        Err(e) => Err(e.into()),
    }
}
