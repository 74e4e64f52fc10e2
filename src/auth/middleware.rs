//! Authentication middleware that validates the session cookie and extends sessions.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use time::Duration;

use crate::{
    AppState, Error,
    auth::cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
    user::{UserID, get_user_by_id},
};

/// The state needed for the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// How far into the future a session is pushed when it is about to lapse.
    pub cookie_duration: Duration,
    /// The database connection used to check the session's user still exists.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Middleware function that checks for a valid session cookie.
///
/// If the cookie holds an unexpired session for a registered user, the user ID
/// is placed into the request and the request is executed normally. Otherwise
/// a 401 response with a JSON error body is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::<Key>::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("Error getting cookie jar: {error:?}");
            return Error::Unauthorized.into_response();
        }
    };

    let user_id = match get_token_from_cookies(&jar) {
        Ok(token) => token.user_id,
        Err(error) => return error.into_response(),
    };

    if let Err(error) = check_user_exists(&state, user_id) {
        return error.into_response();
    }

    parts.extensions.insert(user_id);
    let request = Request::from_parts(parts, body);
    let response = next.run(request).await;

    let (mut parts, body) = response.into_parts();
    let jar = match extend_auth_cookie_duration_if_needed(jar.clone(), state.cookie_duration) {
        Ok(updated_jar) => updated_jar,
        Err(error) => {
            tracing::error!("Error extending cookie duration: {error}. Rolling back cookie jar.");
            jar
        }
    };
    for (key, value) in jar.into_response().headers().iter() {
        if key != SET_COOKIE {
            continue;
        }

        parts.headers.append(key, value.to_owned());
    }

    Response::from_parts(parts, body)
}

fn check_user_exists(state: &AuthState, user_id: UserID) -> Result<(), Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    match get_user_by_id(user_id, &connection) {
        Ok(_) => Ok(()),
        Err(Error::NotFound) => {
            tracing::warn!("session for unknown user {user_id}");
            Err(Error::Unauthorized)
        }
        Err(error) => Err(error),
    }
}
