//! Session verification for the API.
//!
//! Sessions are issued by the identity provider as a private cookie. This
//! module only reads, verifies and refreshes them.

mod cookie;
mod middleware;
mod token;

pub use cookie::{DEFAULT_COOKIE_DURATION, set_auth_cookie};
pub use middleware::auth_guard;

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;
