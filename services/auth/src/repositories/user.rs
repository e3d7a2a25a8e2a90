//! User repository for database operations

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use common::{database::now_millis, query::sort_by, store::Store};
use mongodb::{
    Database,
    bson::{doc, oid::ObjectId},
};
use tracing::info;

use crate::{
    error::{AuthError, AuthResult},
    models::{NewUser, Role, UpdateUser, User, Verified},
    validation::validate_password,
};

pub const USERS_COLLECTION: &str = "users";

/// Hash a password into an argon2 PHC string
pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Verify a password against a stored PHC string
pub fn verify_password(user: &User, password: &str) -> AuthResult<bool> {
    let parsed_hash =
        PasswordHash::new(&user.password).map_err(|e| AuthError::Hashing(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    store: Store<User>,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(db: &Database) -> Self {
        Self {
            store: Store::new(db, USERS_COLLECTION),
        }
    }

    /// Create a new user with the given role
    pub async fn create(&self, new_user: &NewUser, role: Role) -> AuthResult<User> {
        info!("Creating new {} user", role);
        new_user.validate().map_err(AuthError::Validation)?;

        let phone = new_user.phone.trim();
        let email = new_user.email.trim().to_lowercase();
        let existing = self
            .store
            .find_one(doc! { "$or": [ { "phone": phone }, { "email": email.as_str() } ] })
            .await?;
        if existing.is_some() {
            return Err(AuthError::AlreadyRegistered);
        }

        let now = now_millis();
        let mut user = User {
            id: None,
            role,
            name: new_user.name.trim().to_string(),
            phone: phone.to_string(),
            email,
            password: hash_password(&new_user.password)?,
            location: new_user.location.clone(),
            address: new_user.address.clone(),
            city: new_user.city.clone(),
            state: new_user.state.clone(),
            pincode: new_user.pincode.clone(),
            refresh_token: None,
            refresh_token_expiry: None,
            verified: Verified::default(),
            created_on: now,
            updated_on: now,
        };

        user.id = Some(self.store.insert(&user).await?);
        Ok(user)
    }

    /// Find a user by phone number or email
    pub async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let username = username.trim();
        let user = self
            .store
            .find_one(doc! { "$or": [
                { "phone": username },
                { "email": username.to_lowercase() },
            ] })
            .await?;
        Ok(user)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: ObjectId) -> AuthResult<Option<User>> {
        Ok(self.store.find_by_id(id).await?)
    }

    /// Find a user by ID that still holds `role`
    pub async fn find_by_id_and_role(&self, id: ObjectId, role: Role) -> AuthResult<Option<User>> {
        let user = self
            .store
            .find_one(doc! { "_id": id, "type": role.as_str() })
            .await?;
        Ok(user)
    }

    /// One page of users, oldest first, with the total count
    pub async fn list(&self, skip: u64, limit: u64) -> AuthResult<(Vec<User>, u64)> {
        let users = self
            .store
            .find_many(doc! {}, sort_by("_id", true), skip, limit)
            .await?;
        let total = self.store.count(doc! {}).await?;
        Ok((users, total))
    }

    pub async fn update(&self, id: ObjectId, update: UpdateUser) -> AuthResult<User> {
        update.validate().map_err(AuthError::Validation)?;
        let set = update
            .into_set()
            .map_err(common::DatabaseError::from)?;

        self.store
            .update_by_id(id, set)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    pub async fn delete(&self, id: ObjectId) -> AuthResult<()> {
        if self.store.delete_by_id(id).await? {
            Ok(())
        } else {
            Err(AuthError::UserNotFound)
        }
    }

    /// Replace the password after checking the current one
    ///
    /// A wrong current password leaves the stored hash untouched.
    pub async fn change_password(
        &self,
        user: &User,
        current_password: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        let id = user.id.ok_or(AuthError::UserNotFound)?;

        if !verify_password(user, current_password)? {
            return Err(AuthError::InvalidCredentials);
        }
        validate_password(new_password).map_err(AuthError::Validation)?;

        let hash = hash_password(new_password)?;
        self.store
            .update_by_id(id, doc! { "password": hash })
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(())
    }

    /// Overwrite the single refresh-token slot of a user
    pub async fn set_refresh_token(
        &self,
        id: ObjectId,
        token: &str,
        expires_at: i64,
    ) -> AuthResult<()> {
        self.store
            .update_by_id(
                id,
                doc! { "refresh_token": token, "refresh_token_expiry": expires_at },
            )
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_password(password: &str) -> User {
        User {
            id: Some(ObjectId::new()),
            role: Role::User,
            name: "Reader".to_string(),
            phone: "9876543210".to_string(),
            email: "reader@example.com".to_string(),
            password: hash_password(password).unwrap(),
            location: Vec::new(),
            address: String::new(),
            city: String::new(),
            state: String::new(),
            pincode: String::new(),
            refresh_token: None,
            refresh_token_expiry: None,
            verified: Verified::default(),
            created_on: 0,
            updated_on: 0,
        }
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("Str0ng!pass").unwrap();
        let b = hash_password("Str0ng!pass").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2"));
    }

    #[test]
    fn verify_password_accepts_only_the_original() {
        let user = user_with_password("Str0ng!pass");
        assert!(verify_password(&user, "Str0ng!pass").unwrap());
        assert!(!verify_password(&user, "Str0ng!pasS").unwrap());
    }

    #[test]
    fn corrupt_hash_is_an_error() {
        let mut user = user_with_password("Str0ng!pass");
        user.password = "plaintext".to_string();
        assert!(matches!(
            verify_password(&user, "plaintext"),
            Err(AuthError::Hashing(_))
        ));
    }
}
