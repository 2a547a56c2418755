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

//! Web service to manage user accounts.
//!
//! The service offers signup, lookup and listing of users over a JSON API, plus a minimal
//! HTML frontend with form-based login.  The listing and lookup APIs are restricted to
//! users holding the `ADMIN` role, which is checked against a cookie-backed session.
//!
//! The code is structured as the following layers, from bottom to top:
//!
//! 1.  `model`: High-level data types that represent concepts in the domain of the
//!     application, with validation at construction time and no logic in them.
//!
//! 1.  `db`: The persistence layer.  Domain operations are free functions that accept an
//!     `Executor` so that they can run against PostgreSQL (production) or SQLite (tests).
//!
//! 1.  `driver`: The business logic layer.  The `Driver` type owns the database and clock
//!     handles and implements one operation per source file.
//!
//! 1.  `rest`: The HTTP layer.  One axum handler per API, with all error translation
//!     funneled through `RestError`.
//!
//! 1.  `main`: The app launcher, which gathers configuration from environment variables
//!     and calls `serve`.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use crate::clocks::SystemClock;
use crate::db::Db;
use crate::driver::{Driver, DriverOptions};
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

pub mod clocks;
pub mod db;
pub mod driver;
pub mod env;
pub mod model;
mod rest;
pub(crate) mod template;

/// Instantiates all resources to serve the application on `bind_addr`.
///
/// While it'd be nice to push this responsibility to `main`, doing so would force us to
/// expose many crate-internal types to the public, which in turn would make dead code
/// detection harder.
pub async fn serve(
    bind_addr: SocketAddr,
    db: Arc<dyn Db + Send + Sync>,
    opts: DriverOptions,
) -> Result<(), Box<dyn Error>> {
    let clock = Arc::from(SystemClock::default());
    let driver = Driver::new(db, clock, opts);
    let app = rest::app(driver);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    log::info!("Listening on {}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
