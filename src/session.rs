//! Cookie-session authentication.
//!
//! The session stores only the authenticated user id. Everything else about
//! the client is resolved per-request into a [`crate::user::Profile`].

use crate::user::Profile;
use actix_session::Session;

const SESSION_USER_KEY: &str = "uid";

/// Resolves the session to a user profile, or None for guests.
/// A stale id (deleted user) is treated as a guest and the key is dropped.
pub async fn authenticate_client_by_session(session: &Session) -> Option<Profile> {
    let uid = match session.get::<i32>(SESSION_USER_KEY) {
        Ok(Some(uid)) => uid,
        Ok(None) => return None,
        Err(err) => {
            log::warn!("Unreadable session payload: {}", err);
            return None;
        }
    };

    match crate::user::get_profile_by_id(uid).await {
        Ok(Some(profile)) => Some(profile),
        Ok(None) => {
            session.remove(SESSION_USER_KEY);
            None
        }
        Err(err) => {
            log::error!("Session user lookup failed: {}", err);
            None
        }
    }
}

/// Marks the session as belonging to the given user.
pub fn log_in(session: &Session, user_id: i32) -> Result<(), actix_web::Error> {
    session
        .insert(SESSION_USER_KEY, user_id)
        .map_err(actix_web::error::ErrorInternalServerError)
}

pub fn log_out(session: &Session) {
    session.remove(SESSION_USER_KEY);
}
