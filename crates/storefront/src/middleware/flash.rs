//! One-shot flash messages carried in the session.

use tower_sessions::Session;

use crate::models::{FlashLevel, FlashMessage, session_keys};

/// Queue a message for the next rendered page.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn push_flash(
    session: &Session,
    level: FlashLevel,
    text: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    let mut messages = session
        .get::<Vec<FlashMessage>>(session_keys::FLASH)
        .await?
        .unwrap_or_default();
    messages.push(FlashMessage {
        level,
        text: text.into(),
    });
    session.insert(session_keys::FLASH, messages).await
}

/// Take and clear pending messages.
///
/// Read failures yield no messages; a page should still render.
pub async fn take_flash(session: &Session) -> Vec<FlashMessage> {
    session
        .remove::<Vec<FlashMessage>>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}
