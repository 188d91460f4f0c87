//! One-shot flash messages.
//!
//! Messages queue up in the cookie session and drain the next time a page
//! renders them. Used by the admin screens for "saved", "not found", and
//! rejected-input notices that survive a redirect.

use actix_session::Session;
use serde::{Deserialize, Serialize};

const FLASH_SESSION_KEY: &str = "_flash";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
    Info,
}

impl FlashLevel {
    /// CSS class suffix.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Error => "error",
            FlashLevel::Info => "info",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

fn push(session: &Session, level: FlashLevel, message: &str) {
    let mut queue = session
        .get::<Vec<Flash>>(FLASH_SESSION_KEY)
        .ok()
        .flatten()
        .unwrap_or_default();

    queue.push(Flash {
        level,
        message: message.to_owned(),
    });

    if let Err(err) = session.insert(FLASH_SESSION_KEY, queue) {
        log::error!("Failed to store flash message: {}", err);
    }
}

pub fn flash_success(session: &Session, message: &str) {
    push(session, FlashLevel::Success, message);
}

pub fn flash_error(session: &Session, message: &str) {
    push(session, FlashLevel::Error, message);
}

pub fn flash_info(session: &Session, message: &str) {
    push(session, FlashLevel::Info, message);
}

/// Drains pending messages. Rendering a page consumes them.
pub fn take_flashes(session: &Session) -> Vec<Flash> {
    let queue = session
        .get::<Vec<Flash>>(FLASH_SESSION_KEY)
        .ok()
        .flatten()
        .unwrap_or_default();

    if !queue.is_empty() {
        session.remove(FLASH_SESSION_KEY);
    }

    queue
}
