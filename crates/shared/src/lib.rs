//! Shared types, errors, and configuration for DeciFrame.

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::{Claims, CurrentUser};
pub use config::{AppConfig, AppSettings, DatabaseConfig, EmailConfig, ServerConfig};
pub use email::{EmailError, EmailService};
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
