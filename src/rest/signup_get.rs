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

//! Page with the signup form.

use crate::rest::EmptyBody;
use axum::response::Html;

/// API handler.
pub(crate) async fn handler(_: EmptyBody) -> Html<&'static str> {
    Html(include_str!("../templates/signup.html"))
}
