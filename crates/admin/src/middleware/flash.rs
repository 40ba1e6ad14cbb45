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
/// A session read failure yields no messages.
pub async fn take_flash(session: &Session) -> Vec<FlashMessage> {
    session
        .remove::<Vec<FlashMessage>>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_flash_is_taken_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        push_flash(&session, FlashLevel::Success, "Saved.").await.unwrap();
        push_flash(&session, FlashLevel::Error, "Oops.").await.unwrap();

        let messages = take_flash(&session).await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "Saved.");
        assert_eq!(messages[1].level, FlashLevel::Error);
        assert!(take_flash(&session).await.is_empty());
    }
}
