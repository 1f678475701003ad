//! Dictionary adapters and static language-data tables.
//!
//! `SystemDictionary` stores reading → token mappings with prefix, predictive
//! and exact lookup. `Connector` stores POS bigram transition costs for
//! Viterbi scoring. `PosMatcher`/`PosGroup` classify connection ids, and the
//! filters blacklist readings/surfaces.

pub mod connection;
mod filter;
pub mod pos;
mod system;
mod token;

pub use connection::Connector;
pub use filter::{SuggestionFilter, SuppressionDictionary};
pub use pos::{PosGroup, PosMatcher};
pub use system::SystemDictionary;
pub use token::Token;

use std::io;

/// Unified error type for dictionary and connection-matrix binary I/O.
///
/// Covers loading/saving both `SystemDictionary` (KODX) and
/// `Connector` (KOCX) files.
#[derive(Debug, thiserror::Error)]
pub enum DictError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid header (too short)")]
    InvalidHeader,

    #[error("invalid magic bytes (expected KODX or KOCX)")]
    InvalidMagic,

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),

    #[error("serialization error: {0}")]
    Serialize(bincode::Error),

    #[error("deserialization error: {0}")]
    Deserialize(bincode::Error),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Tells a lookup whether to keep yielding tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupControl {
    Continue,
    Stop,
}

/// Receiver for dictionary lookup hits. Lookups yield tokens in no
/// particular order; callers must not depend on iteration order.
pub trait TokenCallback {
    fn on_token(&mut self, token: &Token) -> LookupControl;
}

impl<F> TokenCallback for F
where
    F: FnMut(&Token) -> LookupControl,
{
    fn on_token(&mut self, token: &Token) -> LookupControl {
        self(token)
    }
}

/// Polymorphic dictionary interface.
///
/// `lookup_prefix` yields tokens whose reading is a prefix of `key`;
/// `lookup_predictive` yields tokens whose reading starts with `key`;
/// `lookup_exact` yields tokens whose reading equals `key`.
pub trait Dictionary: Sync {
    fn lookup_prefix(&self, key: &str, callback: &mut dyn TokenCallback);
    fn lookup_predictive(&self, key: &str, callback: &mut dyn TokenCallback);
    fn lookup_exact(&self, key: &str, callback: &mut dyn TokenCallback);

    fn has_key(&self, key: &str) -> bool {
        let mut found = false;
        self.lookup_exact(key, &mut |_: &Token| {
            found = true;
            LookupControl::Stop
        });
        found
    }

    fn has_value(&self, _value: &str) -> bool {
        false
    }
}
