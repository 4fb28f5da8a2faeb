//! Driven port for ride chat persistence.

use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::engagement::Message;

use super::RepositoryError;

/// Persistence operations for ride chat messages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persist a new message.
    async fn insert(&self, message: &Message) -> Result<(), RepositoryError>;

    /// All messages on a ride, oldest first.
    async fn list_for_ride(&self, ride_id: Uuid) -> Result<Vec<Message>, RepositoryError>;
}

/// In-memory [`MessageRepository`] for tests and local development.
#[derive(Debug, Default)]
pub struct FixtureMessageRepository {
    messages: Mutex<Vec<Message>>,
}

impl FixtureMessageRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Message>>, RepositoryError> {
        self.messages
            .lock()
            .map_err(|_| RepositoryError::backend("message fixture lock poisoned"))
    }
}

#[async_trait]
impl MessageRepository for FixtureMessageRepository {
    async fn insert(&self, message: &Message) -> Result<(), RepositoryError> {
        self.lock()?.push(message.clone());
        Ok(())
    }

    async fn list_for_ride(&self, ride_id: Uuid) -> Result<Vec<Message>, RepositoryError> {
        let messages = self.lock()?;
        let mut on_ride: Vec<Message> = messages
            .iter()
            .filter(|m| m.ride_id() == ride_id)
            .cloned()
            .collect();
        on_ride.sort_by_key(Message::sent_at);
        Ok(on_ride)
    }
}
