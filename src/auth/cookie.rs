//! Functions for reading and refreshing the private session cookie.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::{Error, auth::token::Token, user::UserID};

/// The name of the cookie holding the session [Token].
pub(crate) const COOKIE_TOKEN: &str = "auth_token";

/// The default duration for which auth cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(5);

/// Add a session cookie for `user_id` to the cookie jar.
///
/// The session expires `duration` from now. The cookie value is encrypted and
/// signed with the jar's key, so the identity provider that issues sessions
/// must share the server's cookie secret.
///
/// # Errors
///
/// Returns a [Error::TokenSerializationError] if the token could not be serialized.
pub fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserID,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let expires_at = OffsetDateTime::now_utc() + duration;

    set_token(
        jar,
        Token {
            user_id,
            expires_at,
        },
    )
}

fn set_token(jar: PrivateCookieJar, token: Token) -> Result<PrivateCookieJar, Error> {
    let value = serde_json::to_string(&token)
        .map_err(|error| Error::TokenSerializationError(error.to_string()))?;

    Ok(jar.add(
        Cookie::build((COOKIE_TOKEN, value))
            .expires(token.expires_at)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    ))
}

/// Read the session token from `jar`.
///
/// # Errors
///
/// Returns [Error::Unauthorized] if the cookie is missing, cannot be decrypted
/// or parsed, or the session has expired.
pub(crate) fn get_token_from_cookies(jar: &PrivateCookieJar) -> Result<Token, Error> {
    let cookie = jar.get(COOKIE_TOKEN).ok_or(Error::Unauthorized)?;

    let token: Token = serde_json::from_str(cookie.value_trimmed()).map_err(|error| {
        tracing::debug!("could not parse session token: {error}");
        Error::Unauthorized
    })?;

    if token.expires_at <= OffsetDateTime::now_utc() {
        return Err(Error::Unauthorized);
    }

    Ok(token)
}

/// Set the expiry of the session in `jar` to the later of its current expiry
/// and now plus `duration`.
///
/// # Errors
///
/// The cookie jar is not modified if an error is returned.
///
/// Returns a:
/// - [Error::Unauthorized] if there is no valid session in `jar`,
/// - or [Error::TokenSerializationError] if the new token could not be serialized.
pub(crate) fn extend_auth_cookie_duration_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let token = get_token_from_cookies(&jar)?;
    let extended = OffsetDateTime::now_utc() + duration;

    if extended <= token.expires_at {
        return Ok(jar);
    }

    set_token(
        jar,
        Token {
            expires_at: extended,
            ..token
        },
    )
}
