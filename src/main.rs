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

//! Entry point to the user management service.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use userd::db::postgres::{PostgresDb, PostgresOptions};
use userd::db::{Db, init_schema};
use userd::driver::DriverOptions;
use userd::env::get_required_var;
use userd::serve;

#[tokio::main]
async fn main() {
    env_logger::init();

    let port = get_required_var::<u16>("USERD", "PORT").unwrap();
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));

    let db_opts = PostgresOptions::from_env("USERD_PG").unwrap();
    let db: Arc<dyn Db + Send + Sync> = Arc::from(PostgresDb::connect(db_opts).unwrap());
    init_schema(&mut db.ex().await.unwrap()).await.unwrap();

    let opts = DriverOptions::from_env("USERD").unwrap();
    serve(addr, db, opts).await.unwrap()
}
