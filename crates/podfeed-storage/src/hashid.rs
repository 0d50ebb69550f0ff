//! Short, non-sequential feed ids derived from the feed counter.
//!
//! Ids are Hashids of the counter value, so the salt, alphabet and minimum
//! length must stay fixed for ids already handed out to keep resolving.

use harsh::Harsh;

use crate::error::{StorageError, StorageResult};

/// Alphabet used for feed ids.
pub const FEED_ID_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz1234567890";

/// Salted codec between counter values and feed ids.
#[derive(Clone)]
pub struct FeedIdCodec {
    harsh: Harsh,
}

impl FeedIdCodec {
    pub fn new(salt: &str, min_length: usize) -> StorageResult<Self> {
        let harsh = Harsh::builder()
            .salt(salt)
            .length(min_length)
            .alphabet(FEED_ID_ALPHABET)
            .build()
            .map_err(|e| StorageError::config(format!("invalid feed id settings: {}", e)))?;
        Ok(Self { harsh })
    }

    pub fn encode(&self, counter: u64) -> String {
        self.harsh.encode(&[counter])
    }

    /// Counter value behind an id; `None` for ids this codec never issued.
    pub fn decode(&self, id: &str) -> Option<u64> {
        match self.harsh.decode(id).ok()?.as_slice() {
            [counter] => Some(*counter),
            _ => None,
        }
    }
}
