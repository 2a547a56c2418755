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

//! Test utilities for the REST server.

use crate::clocks::SystemClock;
use crate::db::{self, Db};
use crate::driver::{Driver, DriverOptions};
use crate::model::{Password, Role, User, Username};
use crate::rest::{ErrorResponse, app};
use axum::Router;
use axum::extract::Request;
use axum::http::{self, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tower::util::ServiceExt;

/// Maximum body size for testing purposes.
const MAX_BODY_SIZE: usize = 4096;

/// State of a running test.
pub(crate) struct TestContext {
    /// The database backing the app.
    db: Arc<dyn Db + Send + Sync>,

    /// The driver backing the app.
    driver: Driver,

    /// The router under test.
    app: Router,
}

impl TestContext {
    /// Initializes the app against an empty in-memory database.
    pub(crate) async fn setup() -> Self {
        let db: Arc<dyn Db + Send + Sync> =
            Arc::from(crate::db::sqlite::testutils::setup().await);
        let driver =
            Driver::new(db.clone(), Arc::from(SystemClock::default()), DriverOptions::default());
        let app = app(driver.clone());
        Self { db, driver, app }
    }

    /// Returns a clone of the router under test.
    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    /// Consumes the context and returns the router under test.
    pub(crate) fn into_app(self) -> Router {
        self.app
    }

    /// Creates a user bypassing the driver.
    pub(crate) async fn create_test_user(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> User {
        let username = Username::new(username).unwrap();
        let password = Password::new(password).unwrap().hash().unwrap();
        let mut ex = self.db.ex().await.unwrap();
        db::create_user(&mut ex, username, password, role.id()).await.unwrap()
    }

    /// Logs `username` in and returns the value of the `Cookie` header that identifies the
    /// new session.
    pub(crate) async fn login(&self, username: &str, password: &str) -> String {
        let session = self
            .driver
            .clone()
            .login(Username::new(username).unwrap(), Password::new(password).unwrap())
            .await
            .unwrap();
        format!("SESSION={}", session.take_access_token().as_str())
    }

    /// Creates a user with the `password` password and the given `role`, logs it in, and
    /// returns the value of the `Cookie` header that identifies the new session.
    pub(crate) async fn do_test_login(&self, username: &str, role: Role) -> String {
        self.create_test_user(username, "password", role).await;
        self.login(username, "password").await
    }

    /// Returns the user named `username` straight from the database.
    pub(crate) async fn get_user_by_username(&self, username: &str) -> User {
        let mut ex = self.db.ex().await.unwrap();
        db::get_user_by_username(&mut ex, &Username::new(username).unwrap()).await.unwrap()
    }
}

/// Builder for a single request to the API server.
#[must_use]
pub(crate) struct OneShotBuilder {
    /// The router for the app being tested.
    app: Router,

    /// Builder for the request that will be sent to the app.
    builder: axum::http::request::Builder,
}

impl OneShotBuilder {
    /// Creates a new request against a given `method`/`uri` pair served by an `app` router.
    pub(crate) fn new<U: AsRef<str>>(app: Router, (method, uri): (http::Method, U)) -> Self {
        let builder = Request::builder().method(method).uri(uri.as_ref());
        Self { app, builder }
    }

    /// Extends the URI in the request with a `query`.
    pub(crate) fn with_query<Q: Serialize>(mut self, query: Q) -> Self {
        let uri = self.builder.uri_ref().unwrap().to_string();
        assert!(!uri.contains('?'), "URI already contains a query: {}", uri);
        assert!(!uri.contains('#'), "URI contains a fragment: {}", uri);
        self.builder = self.builder.uri(format!(
            "{}?{}",
            uri,
            serde_urlencoded::to_string(query).unwrap()
        ));
        self
    }

    /// Sets the header `name` to `value` in the outgoing request.
    pub(crate) fn with_header<K, V>(mut self, name: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Finishes building the request and sends it with an empty payload.
    pub(crate) async fn send_empty(self) -> ResponseChecker {
        let request = self.builder.body(axum::body::Body::empty()).unwrap();
        ResponseChecker::from(self.app.oneshot(request).await.unwrap())
    }

    /// Finishes building the request and sends it with a text payload.
    pub(crate) async fn send_text<T: Into<String>>(self, text: T) -> ResponseChecker {
        let request = self
            .builder
            .header(http::header::CONTENT_TYPE, mime::TEXT_PLAIN.as_ref())
            .body(axum::body::Body::from(text.into()))
            .unwrap();
        ResponseChecker::from(self.app.oneshot(request).await.unwrap())
    }

    /// Finishes building the request and sends it with a form encoded in the body as the
    /// payload.
    pub(crate) async fn send_form<T: Serialize>(self, request: T) -> ResponseChecker {
        let request = self
            .builder
            .header(http::header::CONTENT_TYPE, mime::APPLICATION_WWW_FORM_URLENCODED.as_ref())
            .body(axum::body::Body::from(serde_urlencoded::to_string(&request).unwrap()))
            .unwrap();
        ResponseChecker::from(self.app.oneshot(request).await.unwrap())
    }

    /// Finishes building the request and sends it with a JSON payload.
    pub(crate) async fn send_json<T: Serialize>(self, request: T) -> ResponseChecker {
        let request = self
            .builder
            .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .body(axum::body::Body::from(serde_json::to_vec(&request).unwrap()))
            .unwrap();
        ResponseChecker::from(self.app.oneshot(request).await.unwrap())
    }
}

/// Type alias for the complex type returned by the `oneshot` function.
type HttpResponse = axum::response::Response;

/// Validator for the outcome of a request sent by a `OneShotBuilder`.
#[must_use]
pub(crate) struct ResponseChecker {
    /// Actual response that we received from the app.
    response: HttpResponse,

    /// Expected HTTP status code in the response above.
    exp_status: http::StatusCode,
}

impl From<HttpResponse> for ResponseChecker {
    fn from(response: HttpResponse) -> Self {
        Self { response, exp_status: http::StatusCode::OK }
    }
}

impl ResponseChecker {
    /// Sets the expected exit HTTP status to `status`.
    pub(crate) fn expect_status(mut self, status: http::StatusCode) -> Self {
        self.exp_status = status;
        self
    }

    /// Expects the response to be a `302 Found` redirect to `location`.
    pub(crate) fn expect_redirect(mut self, location: &str) -> Self {
        self.exp_status = http::StatusCode::FOUND;
        let actual = self
            .response
            .headers()
            .get(http::header::LOCATION)
            .expect("Missing Location header in redirect");
        assert_eq!(location, actual.to_str().unwrap());
        self
    }

    /// Performs common validation operations on the response.
    pub(crate) fn verify(&self) {
        assert_eq!(self.exp_status, self.response.status());
    }

    /// Finishes checking the response and expects its body to be an `ErrorResponse` whose
    /// message matches `exp_re` and whose status repeats the response status.
    pub(crate) async fn expect_error(self, exp_re: &str) {
        self.verify();

        let exp_status = self.exp_status;
        let body = axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE).await.unwrap();
        let response: ErrorResponse = match serde_json::from_slice(&body) {
            Ok(response) => response,
            Err(e) => {
                let body = String::from_utf8(body.to_vec()).unwrap();
                panic!("Invalid error response due to {}; content was {}", e, body);
            }
        };
        assert_eq!(exp_status.as_u16(), response.status);
        let re = regex::Regex::new(exp_re).unwrap();
        assert!(
            re.is_match(&response.message),
            "Response content '{:?}' does not match re '{}'",
            response,
            exp_re
        );
    }

    /// Finishes checking the response and expects it to contain a valid JSON object of
    /// type `T`.
    pub(crate) async fn expect_json<T: DeserializeOwned>(self) -> T {
        self.verify();

        let body = axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE).await.unwrap();
        serde_json::from_slice::<T>(&body).unwrap()
    }

    /// Finishes checking the response and expects its body to be valid UTF-8 and to match
    /// `exp_re`.
    pub(crate) async fn expect_text(self, exp_re: &str) {
        self.verify();

        let body = axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        let re = regex::Regex::new(exp_re).unwrap();
        assert!(re.is_match(&body), "Body content '{}' does not match re '{}'", body, exp_re);
    }

    /// Finishes checking the response and returns the body of the response as UTF-8.
    pub(crate) async fn take_body_as_text(self) -> String {
        self.verify();

        let body = axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE).await.unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    /// Finishes checking the response and returns the response itself for out of band
    /// validation of properties not supported by the `ResponseChecker`.
    pub(crate) async fn take_response(self) -> HttpResponse {
        self.verify();

        self.response
    }
}

/// Generates a test to verify that an API that expects JSON fails when it gets something
/// else.
macro_rules! test_payload_must_be_json {
    ( $app:expr, $route:expr $(, $query:expr)? ) => {
        #[tokio::test]
        async fn test_payload_must_be_json() {
            crate::rest::testutils::OneShotBuilder::new($app, $route)
                $( .with_query($query) )?
                .send_text("this is not json")
                .await
                .expect_status(axum::http::StatusCode::UNSUPPORTED_MEDIA_TYPE)
                .expect_text("Content-Type")
                .await;

            crate::rest::testutils::OneShotBuilder::new($app, $route)
                $( .with_query($query) )?
                .with_header(axum::http::header::CONTENT_TYPE, "application/json")
                .send_text("this is not json")
                .await
                .expect_status(axum::http::StatusCode::BAD_REQUEST)
                .expect_text("expected ident")
                .await;
        }
    };
}

pub(crate) use test_payload_must_be_json;

/// Generates a test to verify that an API that does not expect a payload fails as
/// necessary.
macro_rules! test_payload_must_be_empty {
    ( $app:expr, $route:expr $(, $query:expr)? ) => {
        #[tokio::test]
        async fn test_payload_must_be_empty() {
            crate::rest::testutils::OneShotBuilder::new($app, $route)
                $( .with_query($query) )?
                .send_text("should not be here")
                .await
                .expect_status(axum::http::StatusCode::PAYLOAD_TOO_LARGE)
                .expect_error("should be empty")
                .await;
        }
    };
}

pub(crate) use test_payload_must_be_empty;

/// Generates a test to verify that an API that expects a form in its body fails when it
/// gets something else.
macro_rules! test_payload_must_be_form {
    ( $app:expr, $route:expr $(, $query:expr)? ) => {
        #[tokio::test]
        async fn test_payload_must_be_form() {
            crate::rest::testutils::OneShotBuilder::new($app, $route)
                $( .with_query($query) )?
                .send_text("this is not a form")
                .await
                .expect_status(axum::http::StatusCode::UNSUPPORTED_MEDIA_TYPE)
                .expect_text("Content-Type")
                .await;

            crate::rest::testutils::OneShotBuilder::new($app, $route)
                $( .with_query($query) )?
                .with_header(
                    axum::http::header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                )
                .send_text("this is not a form")
                .await
                .expect_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY)
                .expect_text("missing field")
                .await;
        }
    };
}

pub(crate) use test_payload_must_be_form;
