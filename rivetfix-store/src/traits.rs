/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Message store trait definition.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use rivetfix_core::error::StoreError;

/// Persistence interface used by a session.
///
/// A store holds the next sender and target sequence numbers, every sent
/// message keyed by its sequence number, and the time the current session
/// began. It is used by a single session, so implementations only need to be
/// safe for one logical caller at a time.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persists a sent message under its sequence number.
    ///
    /// # Returns
    /// `false` if the store declined to keep the message.
    ///
    /// # Errors
    /// Returns `StoreError` if the write fails.
    async fn set(&self, seq_num: u64, message: Bytes) -> Result<bool, StoreError>;

    /// Returns the stored messages with `begin <= seq <= end`, ordered by
    /// sequence number. Sequence numbers with nothing stored are skipped.
    ///
    /// # Errors
    /// Returns `StoreError` if the read fails.
    async fn get(&self, begin: u64, end: u64) -> Result<Vec<Bytes>, StoreError>;

    /// Returns the next sender sequence number.
    fn next_sender_seq_num(&self) -> u64;

    /// Returns the next expected target sequence number.
    fn next_target_seq_num(&self) -> u64;

    /// Sets the next sender sequence number.
    ///
    /// # Errors
    /// Returns `StoreError` if the counter cannot be persisted.
    async fn set_next_sender_seq_num(&self, seq_num: u64) -> Result<(), StoreError>;

    /// Sets the next expected target sequence number.
    ///
    /// # Errors
    /// Returns `StoreError` if the counter cannot be persisted.
    async fn set_next_target_seq_num(&self, seq_num: u64) -> Result<(), StoreError>;

    /// Increments the next sender sequence number.
    ///
    /// # Errors
    /// Returns `StoreError` if the counter cannot be persisted.
    async fn incr_next_sender_seq_num(&self) -> Result<(), StoreError> {
        self.set_next_sender_seq_num(self.next_sender_seq_num() + 1)
            .await
    }

    /// Increments the next expected target sequence number.
    ///
    /// # Errors
    /// Returns `StoreError` if the counter cannot be persisted.
    async fn incr_next_target_seq_num(&self) -> Result<(), StoreError> {
        self.set_next_target_seq_num(self.next_target_seq_num() + 1)
            .await
    }

    /// Returns the time the current session began.
    fn creation_time(&self) -> DateTime<Utc>;

    /// Clears every message, sets both sequence numbers to 1 and stamps the
    /// new creation time.
    ///
    /// # Errors
    /// Returns `StoreError` if the reset fails.
    async fn reset(&self, creation_time: DateTime<Utc>) -> Result<(), StoreError>;

    /// Reloads the store from persistent storage.
    ///
    /// # Errors
    /// Returns `StoreError` if the refresh fails.
    async fn refresh(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct CounterStore {
        sender: Mutex<u64>,
        target: Mutex<u64>,
    }

    #[async_trait]
    impl MessageStore for CounterStore {
        async fn set(&self, _seq_num: u64, _message: Bytes) -> Result<bool, StoreError> {
            Ok(false)
        }

        async fn get(&self, _begin: u64, _end: u64) -> Result<Vec<Bytes>, StoreError> {
            Ok(vec![])
        }

        fn next_sender_seq_num(&self) -> u64 {
            *self.sender.lock()
        }

        fn next_target_seq_num(&self) -> u64 {
            *self.target.lock()
        }

        async fn set_next_sender_seq_num(&self, seq_num: u64) -> Result<(), StoreError> {
            *self.sender.lock() = seq_num;
            Ok(())
        }

        async fn set_next_target_seq_num(&self, seq_num: u64) -> Result<(), StoreError> {
            *self.target.lock() = seq_num;
            Ok(())
        }

        fn creation_time(&self) -> DateTime<Utc> {
            DateTime::UNIX_EPOCH
        }

        async fn reset(&self, _creation_time: DateTime<Utc>) -> Result<(), StoreError> {
            *self.sender.lock() = 1;
            *self.target.lock() = 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_default_increments() {
        let store = CounterStore {
            sender: Mutex::new(4),
            target: Mutex::new(9),
        };
        store.incr_next_sender_seq_num().await.unwrap();
        store.incr_next_target_seq_num().await.unwrap();
        assert_eq!(store.next_sender_seq_num(), 5);
        assert_eq!(store.next_target_seq_num(), 10);
        assert!(store.refresh().await.is_ok());
    }
}
