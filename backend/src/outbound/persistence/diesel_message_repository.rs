//! PostgreSQL-backed [`MessageRepository`] using Diesel.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{MessageRepository, RepositoryError};
use crate::domain::Message;

use super::error_map::{map_diesel_error, map_pool_error};
use super::models::{MessageRow, NewMessageRow};
use super::pool::DbPool;
use super::schema::messages;

/// Diesel-backed implementation of the message repository port.
#[derive(Clone)]
pub struct DieselMessageRepository {
    pool: DbPool,
}

impl DieselMessageRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_message(row: MessageRow) -> Result<Message, RepositoryError> {
    Message::new(
        row.id,
        row.ride_id,
        row.sender_id,
        row.receiver_id,
        row.body,
        row.sent_at,
    )
    .map_err(|err| RepositoryError::corrupted(format!("message {}: {err}", row.id)))
}

#[async_trait]
impl MessageRepository for DieselMessageRepository {
    async fn insert(&self, message: &Message) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(messages::table)
            .values(NewMessageRow {
                id: message.id(),
                ride_id: message.ride_id(),
                sender_id: message.sender_id(),
                receiver_id: message.receiver_id(),
                body: message.body(),
                sent_at: message.sent_at(),
            })
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn list_for_ride(&self, ride_id: Uuid) -> Result<Vec<Message>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<MessageRow> = messages::table
            .filter(messages::ride_id.eq(ride_id))
            .order(messages::sent_at.asc())
            .select(MessageRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_message).collect()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for row conversion.

    use chrono::Utc;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn valid_rows_restore() {
        let row = MessageRow {
            id: Uuid::new_v4(),
            ride_id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            receiver_id: Uuid::new_v4(),
            body: "Waiting by the north entrance".into(),
            sent_at: Utc::now(),
        };
        let message = row_to_message(row.clone()).expect("valid row");
        assert_eq!(message.id(), row.id);
        assert_eq!(message.receiver_id(), row.receiver_id);
        assert_eq!(message.body(), row.body);
    }

    #[rstest]
    fn blank_bodies_are_corrupted() {
        let row = MessageRow {
            id: Uuid::new_v4(),
            ride_id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            receiver_id: Uuid::new_v4(),
            body: "   ".into(),
            sent_at: Utc::now(),
        };
        assert!(matches!(
            row_to_message(row),
            Err(RepositoryError::Corrupted(_))
        ));
    }
}
