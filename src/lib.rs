//! Immutable kana-to-kanji conversion.
//!
//! The converter is a pure, stateless decoding function over static
//! language data: given a segment sequence (committed history plus one or
//! more conversion readings), it builds a lattice of dictionary hypotheses,
//! decodes the minimum-cost path and its N-best alternatives under a bigram
//! connection model, and rewrites the conversion segments with ranked
//! candidates. It never learns and holds no mutable state, so one instance
//! may serve concurrent calls.

pub mod converter;
pub mod dict;
pub mod numeric;
pub mod request;
pub mod segmenter;
pub mod segments;
pub mod unicode;

pub use converter::{ConvertError, ImmutableConverter};
pub use request::ConversionRequest;
pub use segments::{Candidate, RequestType, Segment, SegmentType, Segments};
