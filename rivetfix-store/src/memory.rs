/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! In-memory message store implementation.
//!
//! Nothing survives the process. Useful for tests and for sessions that reset
//! sequence numbers on every logon.

use crate::traits::MessageStore;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rivetfix_core::error::StoreError;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory message store.
///
/// Messages live in a `BTreeMap` so that resend ranges are ordered range
/// queries.
#[derive(Debug)]
pub struct MemoryStore {
    messages: RwLock<BTreeMap<u64, Bytes>>,
    next_sender_seq_num: AtomicU64,
    next_target_seq_num: AtomicU64,
    creation_time: RwLock<DateTime<Utc>>,
}

impl MemoryStore {
    /// Creates an empty store with both sequence numbers at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::with_initial_seqs(1, 1)
    }

    /// Creates an empty store with the given next sequence numbers.
    ///
    /// # Arguments
    /// * `sender_seq` - Next sender sequence number
    /// * `target_seq` - Next expected target sequence number
    #[must_use]
    pub fn with_initial_seqs(sender_seq: u64, target_seq: u64) -> Self {
        Self {
            messages: RwLock::new(BTreeMap::new()),
            next_sender_seq_num: AtomicU64::new(sender_seq),
            next_target_seq_num: AtomicU64::new(target_seq),
            creation_time: RwLock::new(Utc::now()),
        }
    }

    /// Replaces the creation time.
    #[must_use]
    pub fn with_creation_time(self, creation_time: DateTime<Utc>) -> Self {
        *self.creation_time.write() = creation_time;
        self
    }

    /// Returns the number of stored messages.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.messages.read().len()
    }

    /// Checks if a message with the given sequence number exists.
    #[must_use]
    pub fn contains(&self, seq_num: u64) -> bool {
        self.messages.read().contains_key(&seq_num)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn set(&self, seq_num: u64, message: Bytes) -> Result<bool, StoreError> {
        self.messages.write().insert(seq_num, message);
        Ok(true)
    }

    async fn get(&self, begin: u64, end: u64) -> Result<Vec<Bytes>, StoreError> {
        if begin > end {
            return Ok(Vec::new());
        }
        Ok(self
            .messages
            .read()
            .range(begin..=end)
            .map(|(_, bytes)| bytes.clone())
            .collect())
    }

    fn next_sender_seq_num(&self) -> u64 {
        self.next_sender_seq_num.load(Ordering::SeqCst)
    }

    fn next_target_seq_num(&self) -> u64 {
        self.next_target_seq_num.load(Ordering::SeqCst)
    }

    async fn set_next_sender_seq_num(&self, seq_num: u64) -> Result<(), StoreError> {
        self.next_sender_seq_num.store(seq_num, Ordering::SeqCst);
        Ok(())
    }

    async fn set_next_target_seq_num(&self, seq_num: u64) -> Result<(), StoreError> {
        self.next_target_seq_num.store(seq_num, Ordering::SeqCst);
        Ok(())
    }

    async fn incr_next_sender_seq_num(&self) -> Result<(), StoreError> {
        self.next_sender_seq_num.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn incr_next_target_seq_num(&self) -> Result<(), StoreError> {
        self.next_target_seq_num.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn creation_time(&self) -> DateTime<Utc> {
        *self.creation_time.read()
    }

    async fn reset(&self, creation_time: DateTime<Utc>) -> Result<(), StoreError> {
        self.messages.write().clear();
        self.next_sender_seq_num.store(1, Ordering::SeqCst);
        self.next_target_seq_num.store(1, Ordering::SeqCst);
        *self.creation_time.write() = creation_time;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_memory_store_new() {
        let store = MemoryStore::new();
        assert_eq!(store.next_sender_seq_num(), 1);
        assert_eq!(store.next_target_seq_num(), 1);
        assert_eq!(store.message_count(), 0);
    }

    #[tokio::test]
    async fn test_get_skips_missing_sequence_numbers() {
        let store = MemoryStore::new();
        for seq in [1, 2, 3, 5] {
            let raw = Bytes::from(format!("msg{seq}"));
            assert!(store.set(seq, raw).await.unwrap());
        }

        let range = store.get(2, 5).await.unwrap();
        assert_eq!(
            range,
            vec![
                Bytes::from_static(b"msg2"),
                Bytes::from_static(b"msg3"),
                Bytes::from_static(b"msg5")
            ]
        );
        assert!(store.get(6, 9).await.unwrap().is_empty());
        assert!(store.get(5, 2).await.unwrap().is_empty());
        assert!(store.contains(5));
        assert!(!store.contains(4));
    }

    #[tokio::test]
    async fn test_sequence_numbers() {
        let store = MemoryStore::with_initial_seqs(10, 20);
        store.incr_next_sender_seq_num().await.unwrap();
        store.set_next_target_seq_num(7).await.unwrap();
        assert_eq!(store.next_sender_seq_num(), 11);
        assert_eq!(store.next_target_seq_num(), 7);
    }

    #[tokio::test]
    async fn test_reset_stamps_creation_time() {
        let store = MemoryStore::with_initial_seqs(10, 20);
        store.set(1, Bytes::from_static(b"msg1")).await.unwrap();

        let when = Utc.with_ymd_and_hms(2024, 3, 15, 8, 0, 0).unwrap();
        store.reset(when).await.unwrap();

        assert_eq!(store.message_count(), 0);
        assert_eq!(store.next_sender_seq_num(), 1);
        assert_eq!(store.next_target_seq_num(), 1);
        assert_eq!(store.creation_time(), when);
    }
}
