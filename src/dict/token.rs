use serde::{Deserialize, Serialize};

/// An immutable dictionary record: a reading, its surface form, and the
/// connection/cost data the decoder scores it with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// Reading (kana), UTF-8.
    pub key: String,
    /// Surface form (kanji, etc.), UTF-8.
    pub value: String,
    /// Left connection class id.
    pub lid: u16,
    /// Right connection class id.
    pub rid: u16,
    /// Word emission cost (lower = more preferred). Non-negative.
    pub wcost: i16,
}

impl Token {
    pub fn new(key: &str, value: &str, lid: u16, rid: u16, wcost: i16) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            lid,
            rid,
            wcost,
        }
    }
}
