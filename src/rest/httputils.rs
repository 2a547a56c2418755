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

//! Utilities to deal with cookie authentication and redirects.

use crate::driver::Driver;
use crate::model::{AccessToken, Role, User};
use crate::rest::{RestError, RestResult, get_unique_header};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

/// Name of the cookie that carries the session access token.
pub(crate) const SESSION_COOKIE: &str = "SESSION";

/// Creates a `302 Found` response that redirects to `location`.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_owned())]).into_response()
}

/// Creates the `Set-Cookie` value that stores `token` as the session cookie.
pub(crate) fn session_cookie(token: &AccessToken) -> RestResult<HeaderValue> {
    format!("{}={}; Path=/; HttpOnly", SESSION_COOKIE, token.as_str())
        .parse()
        .map_err(|e| RestError::InternalError(format!("Cannot encode cookie: {}", e)))
}

/// Creates the `Set-Cookie` value that deletes the session cookie.
pub(crate) fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("SESSION=; Path=/; HttpOnly; Max-Age=0")
}

/// Extracts the session access token from the `Cookie` header in `headers`.
///
/// Any problem extracting the token means we cannot know who the caller is, so all error
/// paths yield `NotLoggedIn` to send the caller through the login flow.
pub(crate) fn get_session_cookie(headers: &HeaderMap) -> RestResult<AccessToken> {
    let cookies = match get_unique_header(headers, "Cookie") {
        Ok(Some(value)) => value,
        Ok(None) => return Err(RestError::NotLoggedIn("Missing Cookie header".to_owned())),
        Err(e) => return Err(RestError::NotLoggedIn(e.to_string())),
    };

    let cookies = match cookies.to_str() {
        Ok(value) => value,
        Err(e) => {
            return Err(RestError::NotLoggedIn(format!(
                "Bad encoding in Cookie header: {}",
                e
            )));
        }
    };

    for cookie in cookies.split(';') {
        match cookie.trim().split_once('=') {
            Some((name, value)) if name == SESSION_COOKIE => {
                return AccessToken::new(value)
                    .map_err(|e| RestError::NotLoggedIn(e.to_string()));
            }
            _ => (),
        }
    }
    Err(RestError::NotLoggedIn(format!("No {} cookie present", SESSION_COOKIE)))
}

/// Ensures that the request in `headers` comes from a logged-in user holding `role` and
/// returns that user.
///
/// A missing or invalid session yields `NotLoggedIn`; a valid session with any other role
/// yields `Forbidden`.
pub(crate) async fn require_role(
    driver: &Driver,
    headers: &HeaderMap,
    role: Role,
) -> RestResult<Arc<User>> {
    let token = get_session_cookie(headers)?;
    let whoami = driver.get_session(token).await?;

    if whoami.role() != Some(role) {
        return Err(RestError::Forbidden(format!(
            "User {} does not have the {} role",
            whoami.username().as_str(),
            role
        )));
    }

    Ok(whoami)
}
