//! Authentication service models

pub mod user;

pub use user::{
    ChangePassword, LoginCredentials, NewUser, Role, UpdateUser, User, UserResponse, Verified,
};
