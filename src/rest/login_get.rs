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

//! Page with the login form.

use crate::rest::EmptyBody;
use crate::template;
use axum::extract::Query;
use axum::response::Html;
use serde::Deserialize;

/// Query parameters that the login redirects carry to render a status message.
#[derive(Deserialize)]
pub(crate) struct LoginQuery {
    /// Present after a failed login attempt.  The value is irrelevant.
    error: Option<String>,

    /// Present after a logout.  The value is irrelevant.
    logout: Option<String>,
}

/// API handler.
pub(crate) async fn handler(Query(query): Query<LoginQuery>, _: EmptyBody) -> Html<String> {
    let message = if query.error.is_some() {
        "Invalid username or password."
    } else if query.logout.is_some() {
        "You have been logged out."
    } else {
        ""
    };

    Html(template::apply(include_str!("../templates/login.html"), &[("message", message)]))
}
