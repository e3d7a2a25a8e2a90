//! User model and related functionality

use mongodb::bson::{self, Document, oid::ObjectId};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::validation::{validate_email, validate_length, validate_password, validate_phone};

/// Role carried in access tokens and stored on the user as `type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verified {
    #[serde(default)]
    pub email: bool,
    #[serde(default)]
    pub phone: bool,
}

/// User entity as stored in the `users` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "type")]
    pub role: Role,
    pub name: String,
    pub phone: String,
    pub email: String,
    /// Argon2 PHC string
    pub password: String,
    #[serde(default)]
    pub location: Vec<String>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub pincode: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub refresh_token_expiry: Option<i64>,
    #[serde(default)]
    pub verified: Verified,
    pub created_on: i64,
    pub updated_on: i64,
}

/// New user creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub location: Vec<String>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub pincode: String,
    /// Only honoured when an admin creates the user
    #[serde(default, rename = "type")]
    pub role: Option<Role>,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), String> {
        validate_length("name", &self.name, 3, 40)?;
        validate_phone(&self.phone)?;
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

/// User update payload, absent fields are left untouched
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl UpdateUser {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            validate_length("name", name, 3, 40)?;
        }
        if let Some(phone) = &self.phone {
            validate_phone(phone)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }

    pub fn into_set(self) -> Result<Document, bson::ser::Error> {
        bson::to_document(&self)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePassword {
    pub password: String,
    pub new_password: String,
}

/// User login credentials, `username` is a phone number or an email
#[derive(Debug, Clone, Deserialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

/// Outward view of a user, without password or refresh token
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub role: Role,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub location: Vec<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub verified: Verified,
    pub created_on: i64,
    pub updated_on: i64,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            role: user.role,
            name: user.name,
            phone: user.phone,
            email: user.email,
            location: user.location,
            address: user.address,
            city: user.city,
            state: user.state,
            pincode: user.pincode,
            verified: user.verified,
            created_on: user.created_on,
            updated_on: user.updated_on,
        }
    }
}
