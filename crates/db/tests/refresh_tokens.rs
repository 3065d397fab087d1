//! Repository tests against a live PostgreSQL database.
//!
//! Run with `DATABASE_URL` set and `cargo test -p messenger-db -- --ignored`.

use chrono::{Duration, Utc};
use messenger_db::models::refresh_token::CreateRefreshToken;
use messenger_db::models::user::{CreateUser, User};
use messenger_db::repositories::{RefreshTokenRepo, UserRepo};
use sqlx::PgPool;

async fn create_user(pool: &PgPool, username: &str) -> User {
    UserRepo::create_with_profile(
        pool,
        &CreateUser {
            username: username.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
            display_name: format!("{username} display"),
        },
    )
    .await
    .expect("user creation should succeed")
}

async fn create_token(pool: &PgPool, id: &str, user_id: i64, ttl: Duration) {
    RefreshTokenRepo::create(
        pool,
        &CreateRefreshToken {
            id: id.to_string(),
            user_id,
            expires: Utc::now() + ttl,
        },
    )
    .await
    .expect("token creation should succeed");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn consume_deletes_and_returns_once(pool: PgPool) {
    let user = create_user(&pool, "penny").await;
    create_token(&pool, "tok-1", user.id, Duration::days(7)).await;

    let first = RefreshTokenRepo::consume(&pool, "tok-1", Utc::now()).await.unwrap();
    let second = RefreshTokenRepo::consume(&pool, "tok-1", Utc::now()).await.unwrap();

    assert_eq!(first.map(|t| t.user_id), Some(user.id));
    assert!(second.is_none());
    assert_eq!(RefreshTokenRepo::count_for_user(&pool, user.id).await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn consume_ignores_expired_tokens(pool: PgPool) {
    let user = create_user(&pool, "penny").await;
    create_token(&pool, "stale", user.id, Duration::seconds(-5)).await;

    assert!(RefreshTokenRepo::consume(&pool, "stale", Utc::now())
        .await
        .unwrap()
        .is_none());
    assert_eq!(RefreshTokenRepo::count_for_user(&pool, user.id).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn concurrent_consume_has_one_winner(pool: PgPool) {
    let user = create_user(&pool, "penny").await;
    create_token(&pool, "race", user.id, Duration::days(7)).await;

    let now = Utc::now();
    let (a, b) = tokio::join!(
        RefreshTokenRepo::consume(&pool, "race", now),
        RefreshTokenRepo::consume(&pool, "race", now),
    );

    let winners = [a.unwrap(), b.unwrap()].iter().filter(|t| t.is_some()).count();
    assert_eq!(winners, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn delete_expired_is_idempotent(pool: PgPool) {
    let user = create_user(&pool, "penny").await;
    create_token(&pool, "old-1", user.id, Duration::hours(-1)).await;
    create_token(&pool, "old-2", user.id, Duration::hours(-2)).await;
    create_token(&pool, "live", user.id, Duration::days(7)).await;

    assert_eq!(RefreshTokenRepo::delete_expired(&pool, Utc::now()).await.unwrap(), 2);
    assert_eq!(RefreshTokenRepo::delete_expired(&pool, Utc::now()).await.unwrap(), 0);
    let live = RefreshTokenRepo::consume(&pool, "live", Utc::now()).await.unwrap();
    assert_eq!(live.map(|t| t.user_id), Some(user.id));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn delete_all_for_user_is_scoped(pool: PgPool) {
    let penny = create_user(&pool, "penny").await;
    let sam = create_user(&pool, "sam").await;
    for id in ["p-1", "p-2", "p-3"] {
        create_token(&pool, id, penny.id, Duration::days(7)).await;
    }
    create_token(&pool, "s-1", sam.id, Duration::days(7)).await;

    assert_eq!(RefreshTokenRepo::delete_all_for_user(&pool, penny.id).await.unwrap(), 3);
    assert_eq!(RefreshTokenRepo::count_for_user(&pool, sam.id).await.unwrap(), 1);
    assert!(!RefreshTokenRepo::delete(&pool, "s-1", penny.id).await.unwrap());
    assert_eq!(RefreshTokenRepo::count_for_user(&pool, sam.id).await.unwrap(), 1);
    assert!(RefreshTokenRepo::delete(&pool, "s-1", sam.id).await.unwrap());
    assert!(!RefreshTokenRepo::delete(&pool, "s-1", sam.id).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn deleting_a_user_cascades_to_tokens(pool: PgPool) {
    let user = create_user(&pool, "penny").await;
    create_token(&pool, "tok", user.id, Duration::days(7)).await;

    assert!(UserRepo::delete(&pool, user.id).await.unwrap());
    assert!(UserRepo::find_by_id(&pool, user.id).await.unwrap().is_none());
    assert_eq!(RefreshTokenRepo::count_for_user(&pool, user.id).await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn registration_creates_profile_and_enforces_uniqueness(pool: PgPool) {
    let user = create_user(&pool, "penny").await;

    assert_eq!(
        UserRepo::find_by_username(&pool, "penny").await.unwrap().map(|u| u.id),
        Some(user.id)
    );
    assert!(UserRepo::display_name_exists(&pool, "penny display").await.unwrap());

    let duplicate = UserRepo::create_with_profile(
        &pool,
        &CreateUser {
            username: "penny".into(),
            password_hash: "x".into(),
            display_name: "someone else".into(),
        },
    )
    .await;
    let Err(sqlx::Error::Database(db_err)) = duplicate else {
        panic!("expected a unique violation");
    };
    assert_eq!(db_err.constraint(), Some("uq_users_username"));
    assert!(!UserRepo::display_name_exists(&pool, "someone else").await.unwrap());
}
