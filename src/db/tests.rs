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

//! Common tests for any database implementation.

use crate::clocks::testutils::utc_datetime;
use crate::db::*;
use crate::model::{AccessToken, HashedPassword, Role, Session, User, UserId, Username};

/// Syntactic sugar to create a user with the `USER` role given only its username.
async fn create_simple_user(ex: &mut Executor, username: &'static str) -> User {
    create_user(
        ex,
        Username::from(username),
        HashedPassword::new(format!("hash-for-{}", username)),
        Role::User.id(),
    )
    .await
    .unwrap()
}

pub(crate) async fn test_users_create_and_get(db: Box<dyn Db>) {
    let mut ex = db.ex().await.unwrap();

    let user = create_user(
        &mut ex,
        Username::from("some-username"),
        HashedPassword::new("some-hash"),
        Role::User.id(),
    )
    .await
    .unwrap();
    assert_eq!(&Username::from("some-username"), user.username());
    assert_eq!("some-hash", user.password().as_str());
    assert_eq!(Role::User.id(), user.role_id());

    let user1 = get_user_by_id(&mut ex, user.id()).await.unwrap();
    assert_eq!(user.id(), user1.id());
    assert_eq!(user.username(), user1.username());
    assert_eq!(Some(Role::User), user1.role());
}

pub(crate) async fn test_users_get_by_id_not_found(db: Box<dyn Db>) {
    let mut ex = db.ex().await.unwrap();

    let user = create_simple_user(&mut ex, "someone").await;

    let missing = UserId::from_i64(user.id().as_i64() + 123);
    assert_eq!(DbError::NotFound, get_user_by_id(&mut ex, missing).await.unwrap_err());
}

pub(crate) async fn test_users_get_by_username_resolves_role(db: Box<dyn Db>) {
    let mut ex = db.ex().await.unwrap();

    create_user(
        &mut ex,
        Username::from("the-admin"),
        HashedPassword::new("some-hash"),
        Role::Admin.id(),
    )
    .await
    .unwrap();

    let user = get_user_by_username(&mut ex, &Username::from("the-admin")).await.unwrap();
    assert_eq!(Some(Role::Admin), user.role());
}

pub(crate) async fn test_users_get_by_username_case_insensitive(db: Box<dyn Db>) {
    let mut ex = db.ex().await.unwrap();

    // Bypass username normalization to simulate data written by other tools.
    create_user(
        &mut ex,
        Username::new_invalid("SomeOne"),
        HashedPassword::new("some-hash"),
        Role::User.id(),
    )
    .await
    .unwrap();

    let user = get_user_by_username(&mut ex, &Username::from("someone")).await.unwrap();
    assert_eq!("someone", user.username().as_str());
}

pub(crate) async fn test_users_get_by_username_not_found(db: Box<dyn Db>) {
    let mut ex = db.ex().await.unwrap();

    assert_eq!(
        DbError::NotFound,
        get_user_by_username(&mut ex, &Username::from("missing")).await.unwrap_err()
    );
}

pub(crate) async fn test_users_duplicates_allowed(db: Box<dyn Db>) {
    let mut ex = db.ex().await.unwrap();

    // Uniqueness of usernames is enforced by the business logic, not the schema, so two
    // rows with the same username must coexist at this level.
    let user1 = create_simple_user(&mut ex, "someone").await;
    let user2 = create_simple_user(&mut ex, "someone").await;
    assert_ne!(user1.id(), user2.id());
}

pub(crate) async fn test_users_list_in_id_order(db: Box<dyn Db>) {
    let mut ex = db.ex().await.unwrap();

    assert!(list_users(&mut ex).await.unwrap().is_empty());

    let user1 = create_simple_user(&mut ex, "first").await;
    let user2 = create_simple_user(&mut ex, "second").await;
    let user3 = create_simple_user(&mut ex, "third").await;

    let users = list_users(&mut ex).await.unwrap();
    assert_eq!(
        vec![user1.id(), user2.id(), user3.id()],
        users.iter().map(User::id).collect::<Vec<UserId>>()
    );
    assert_eq!(Some(Role::User), users[0].role());
}

pub(crate) async fn test_users_corrupted_username(db: Box<dyn Db>) {
    let mut ex = db.ex().await.unwrap();

    let invalid = Username::new_invalid("this@is!invalid");
    create_user(&mut ex, invalid.clone(), HashedPassword::new("some-hash"), Role::User.id())
        .await
        .unwrap();
    match get_user_by_username(&mut ex, &invalid).await.unwrap_err() {
        DbError::DataIntegrityError(msg) if msg.contains("Unsupported character") => (),
        e => panic!("Unexpected error: {:?}", e),
    }
}

pub(crate) async fn test_users_tx_commit(db: Box<dyn Db>) {
    {
        let mut tx = db.begin().await.unwrap();
        create_simple_user(tx.ex(), "someone").await;
        tx.commit().await.unwrap();
    }

    let mut ex = db.ex().await.unwrap();
    get_user_by_username(&mut ex, &Username::from("someone")).await.unwrap();
}

pub(crate) async fn test_users_tx_rollback_on_drop(db: Box<dyn Db>) {
    {
        let mut tx = db.begin().await.unwrap();
        create_simple_user(tx.ex(), "someone").await;
    }

    let mut ex = db.ex().await.unwrap();
    assert_eq!(
        DbError::NotFound,
        get_user_by_username(&mut ex, &Username::from("someone")).await.unwrap_err()
    );
}

pub(crate) async fn test_sessions_put_get(db: Box<dyn Db>) {
    let mut ex = db.ex().await.unwrap();

    let session = Session::new(
        AccessToken::generate(),
        Username::from("someone"),
        utc_datetime(2023, 6, 1, 6, 20, 0),
    );
    put_session(&mut ex, &session).await.unwrap();

    let session1 = get_session(&mut ex, session.access_token()).await.unwrap();
    assert_eq!(session, session1);
}

pub(crate) async fn test_sessions_get_not_found(db: Box<dyn Db>) {
    let mut ex = db.ex().await.unwrap();

    assert_eq!(
        DbError::NotFound,
        get_session(&mut ex, &AccessToken::generate()).await.unwrap_err()
    );
}

pub(crate) async fn test_sessions_put_duplicate_token(db: Box<dyn Db>) {
    let mut ex = db.ex().await.unwrap();

    let token = AccessToken::generate();
    let session1 =
        Session::new(token.clone(), Username::from("someone"), utc_datetime(2023, 6, 1, 6, 20, 0));
    let session2 =
        Session::new(token, Username::from("other"), utc_datetime(2023, 6, 1, 6, 25, 0));

    put_session(&mut ex, &session1).await.unwrap();
    assert_eq!(DbError::AlreadyExists, put_session(&mut ex, &session2).await.unwrap_err());
}

pub(crate) async fn test_sessions_delete(db: Box<dyn Db>) {
    let mut ex = db.ex().await.unwrap();

    let session = Session::new(
        AccessToken::generate(),
        Username::from("someone"),
        utc_datetime(2023, 6, 1, 6, 20, 0),
    );
    put_session(&mut ex, &session).await.unwrap();

    delete_session(&mut ex, session.clone(), utc_datetime(2023, 6, 1, 7, 0, 0)).await.unwrap();

    // Logged-out sessions must not be returned any longer.
    assert_eq!(
        DbError::NotFound,
        get_session(&mut ex, session.access_token()).await.unwrap_err()
    );
}

pub(crate) async fn test_sessions_delete_twice(db: Box<dyn Db>) {
    let mut ex = db.ex().await.unwrap();

    let session = Session::new(
        AccessToken::generate(),
        Username::from("someone"),
        utc_datetime(2023, 6, 1, 6, 20, 0),
    );
    put_session(&mut ex, &session).await.unwrap();

    delete_session(&mut ex, session.clone(), utc_datetime(2023, 6, 1, 7, 0, 0)).await.unwrap();
    assert_eq!(
        DbError::NotFound,
        delete_session(&mut ex, session, utc_datetime(2023, 6, 1, 7, 5, 0)).await.unwrap_err()
    );
}

pub(crate) async fn test_sessions_delete_missing(db: Box<dyn Db>) {
    let mut ex = db.ex().await.unwrap();

    let session = Session::new(
        AccessToken::generate(),
        Username::from("someone"),
        utc_datetime(2023, 6, 1, 6, 20, 0),
    );
    assert_eq!(
        DbError::NotFound,
        delete_session(&mut ex, session, utc_datetime(2023, 6, 1, 7, 0, 0)).await.unwrap_err()
    );
}

macro_rules! generate_db_tests [
    ( $setup:expr $(, #[$extra:meta])? ) => {
        crate::db::testutils::generate_tests!(
            $( #[$extra], )?
            $setup,
            crate::db::tests,
            test_users_create_and_get,
            test_users_get_by_id_not_found,
            test_users_get_by_username_resolves_role,
            test_users_get_by_username_case_insensitive,
            test_users_get_by_username_not_found,
            test_users_duplicates_allowed,
            test_users_list_in_id_order,
            test_users_corrupted_username,
            test_users_tx_commit,
            test_users_tx_rollback_on_drop,
            test_sessions_put_get,
            test_sessions_get_not_found,
            test_sessions_put_duplicate_token,
            test_sessions_delete,
            test_sessions_delete_twice,
            test_sessions_delete_missing
        );
    }
];

use generate_db_tests;

mod sqlite {
    use super::generate_db_tests;

    generate_db_tests!(Box::from(crate::db::sqlite::testutils::setup().await));
}

mod postgres {
    use super::generate_db_tests;

    generate_db_tests!(
        Box::from(crate::db::postgres::testutils::setup().await),
        #[ignore = "Requires environment configuration and is expensive"]
    );
}
