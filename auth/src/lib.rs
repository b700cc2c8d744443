//! # Fest Authentication
//!
//! Implementations of the credential capabilities `fest-core` consumes:
//!
//! - [`Argon2Hasher`]: Argon2id password credentials in PHC string format
//! - [`JwtAuthenticator`]: HS256 bearer tokens encoding the
//!   `(user_id, organization_id, role)` triple
//!
//! ## Example
//!
//! ```rust,ignore
//! use fest_auth::{AuthConfig, JwtAuthenticator};
//! use fest_core::Authenticator;
//!
//! let authenticator = JwtAuthenticator::new(AuthConfig::new(secret))?;
//! let issued = authenticator.issue(&identity)?;
//! assert_eq!(authenticator.authenticate(&issued.token)?, identity);
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod config;
pub mod error;
pub mod password;
pub mod token;

// Re-export main types for convenience
pub use config::AuthConfig;
pub use error::{AuthError, Result};
pub use password::Argon2Hasher;
pub use token::{Claims, JwtAuthenticator};
