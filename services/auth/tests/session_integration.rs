//! Session lifecycle against a live MongoDB
//!
//! Run with `cargo test -p auth -- --ignored` and `MONGO_URI` pointing at a
//! disposable server. Each test uses its own database.

use auth::{
    AuthError, JwtConfig, JwtService, KeyPair, SessionManager,
    models::{LoginCredentials, NewUser, Role},
    repositories::{UserRepository, verify_password},
};
use common::database::{DatabaseConfig, init_database};
use mongodb::bson::oid::ObjectId;

fn jwt_service() -> JwtService {
    JwtService::new(JwtConfig {
        access: KeyPair::load(
            include_str!("keys/access-private.pem"),
            include_str!("keys/access-public.pem"),
        )
        .unwrap(),
        refresh: KeyPair::load(
            include_str!("keys/refresh-private.pem"),
            include_str!("keys/refresh-public.pem"),
        )
        .unwrap(),
        access_token_expiry: 30,
        refresh_token_expiry: 60,
    })
    .unwrap()
}

async fn sessions() -> SessionManager {
    let mut config = DatabaseConfig::from_env().unwrap();
    config.name = format!("auth_it_{}", ObjectId::new().to_hex());
    let db = init_database(&config).await.unwrap();
    SessionManager::new(UserRepository::new(&db), jwt_service())
}

fn reader() -> NewUser {
    NewUser {
        name: "Asha Rao".to_string(),
        phone: "9876543210".to_string(),
        email: "asha@example.com".to_string(),
        password: "Str0ng!pass".to_string(),
        location: Vec::new(),
        address: String::new(),
        city: String::new(),
        state: String::new(),
        pincode: String::new(),
        role: None,
    }
}

fn credentials(username: &str, password: &str) -> LoginCredentials {
    LoginCredentials {
        username: username.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn superseded_refresh_tokens_are_rejected() {
    let sessions = sessions().await;
    sessions.users().create(&reader(), Role::User).await.unwrap();

    let first = sessions
        .login(&credentials("9876543210", "Str0ng!pass"))
        .await
        .unwrap();
    assert!(sessions.refresh(&first.refresh.token).await.is_ok());

    let second = sessions
        .login(&credentials("asha@example.com", "Str0ng!pass"))
        .await
        .unwrap();
    assert_ne!(first.refresh.token, second.refresh.token);

    let err = sessions.refresh(&first.refresh.token).await.unwrap_err();
    assert!(matches!(err, AuthError::SessionSuperseded));
    assert!(sessions.refresh(&second.refresh.token).await.is_ok());
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn logout_revokes_the_refresh_token() {
    let sessions = sessions().await;
    let user = sessions.users().create(&reader(), Role::User).await.unwrap();
    let session = sessions
        .login(&credentials("9876543210", "Str0ng!pass"))
        .await
        .unwrap();

    sessions.logout(user.id.unwrap()).await.unwrap();

    assert!(matches!(
        sessions.refresh(&session.refresh.token).await,
        Err(AuthError::SessionSuperseded)
    ));
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn wrong_password_is_rejected() {
    let sessions = sessions().await;
    sessions.users().create(&reader(), Role::User).await.unwrap();

    assert!(matches!(
        sessions.login(&credentials("9876543210", "Wr0ng!pass")).await,
        Err(AuthError::InvalidCredentials)
    ));
    assert!(matches!(
        sessions.login(&credentials("0000000000", "Str0ng!pass")).await,
        Err(AuthError::UserNotFound)
    ));
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn change_password_with_wrong_current_keeps_the_hash() {
    let sessions = sessions().await;
    let user = sessions.users().create(&reader(), Role::User).await.unwrap();
    let id = user.id.unwrap();

    let err = sessions
        .users()
        .change_password(&user, "Wr0ng!pass", "N3w!password")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));

    let stored = sessions.users().find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.password, user.password);
    assert!(verify_password(&stored, "Str0ng!pass").unwrap());
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn duplicate_registration_is_refused() {
    let sessions = sessions().await;
    sessions.users().create(&reader(), Role::User).await.unwrap();

    let mut again = reader();
    again.phone = "9123456780".to_string();
    assert!(matches!(
        sessions.users().create(&again, Role::User).await,
        Err(AuthError::AlreadyRegistered)
    ));
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn access_tokens_resolve_to_users_with_the_same_role() {
    let sessions = sessions().await;
    let user = sessions.users().create(&reader(), Role::User).await.unwrap();
    let session = sessions
        .login(&credentials("9876543210", "Str0ng!pass"))
        .await
        .unwrap();

    let resolved = sessions.authenticate(&session.access.token).await.unwrap();
    assert_eq!(resolved.id, user.id);
}
