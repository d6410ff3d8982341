//! Authentication and authorization primitives.
//!
//! This module provides:
//! - Password hashing with Argon2id
//! - Password verification
//! - The organization role model

mod password;
mod role;

pub use password::{hash_password, verify_password, PasswordError};
pub use role::Role;
