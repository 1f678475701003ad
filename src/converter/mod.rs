//! The immutable converter: a pure decoding function over static language
//! data.
//!
//! A call concatenates the request's history and conversion readings into a
//! lattice key, materialises every dictionary hypothesis over it, decodes
//! the minimum-cost path (plus N-best alternatives) under the connection
//! model, and rewrites the conversion segments with ranked candidates.
//! Nothing is learned and nothing outlives the call.

mod build;
mod candidates;
pub mod lattice;
mod nbest;
pub(crate) mod testutil;
mod viterbi;

#[cfg(test)]
mod tests;

use tracing::{debug, debug_span};

use crate::dict::{Connector, Dictionary, PosGroup, PosMatcher, SuggestionFilter, SuppressionDictionary};
use crate::request::ConversionRequest;
use crate::segmenter::Segmenter;
use crate::segments::{Segment, Segments};

use lattice::{Lattice, EOS};

/// Histories longer than this (in bytes of reading) are dropped wholesale
/// and the conversion proceeds as if standalone.
pub(crate) const MAX_HISTORY_KEY_LEN: usize = 256;

/// How many distinct paths to enumerate for a plain conversion request.
const CONVERSION_NBEST_SIZE: usize = 20;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConvertError {
    #[error("request has no conversion segment")]
    NoConversionSegment,

    #[error("conversion segment has an empty key")]
    EmptyKey,

    #[error("prediction expects a single conversion segment")]
    MultiplePredictionSegments,

    #[error("no path connects the lattice ends")]
    Disconnected,
}

/// The converter proper. Holds shared read-only references to the language
/// data; every call builds and destroys its own lattice, so one instance
/// may serve any number of concurrent calls.
pub struct ImmutableConverter<'a> {
    pub(crate) dictionary: &'a dyn Dictionary,
    pub(crate) suffix_dictionary: &'a dyn Dictionary,
    pub(crate) suppression_dictionary: &'a SuppressionDictionary,
    pub(crate) connector: &'a Connector,
    pub(crate) segmenter: &'a Segmenter,
    pub(crate) pos_matcher: PosMatcher,
    pub(crate) pos_group: &'a PosGroup,
    pub(crate) suggestion_filter: &'a SuggestionFilter,
}

impl<'a> ImmutableConverter<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        dictionary: &'a dyn Dictionary,
        suffix_dictionary: &'a dyn Dictionary,
        suppression_dictionary: &'a SuppressionDictionary,
        connector: &'a Connector,
        segmenter: &'a Segmenter,
        pos_matcher: PosMatcher,
        pos_group: &'a PosGroup,
        suggestion_filter: &'a SuggestionFilter,
    ) -> Self {
        Self {
            dictionary,
            suffix_dictionary,
            suppression_dictionary,
            connector,
            segmenter,
            pos_matcher,
            pos_group,
            suggestion_filter,
        }
    }

    /// Convert with default request options.
    pub fn convert(&self, segments: &mut Segments) -> Result<(), ConvertError> {
        self.convert_for_request(&ConversionRequest::default(), segments)
    }

    /// Primary entry point: validate, recover over-long history, build the
    /// lattice, decode, and rewrite the conversion segments.
    ///
    /// On error the segments are left structurally valid: either untouched,
    /// or (for the history recovery) with the history segments removed.
    pub fn convert_for_request(
        &self,
        request: &ConversionRequest,
        segments: &mut Segments,
    ) -> Result<(), ConvertError> {
        let _span = debug_span!("convert", request_type = ?segments.request_type()).entered();

        self.validate(segments)?;

        let history_key = segments.history_key();
        if history_key.len() > MAX_HISTORY_KEY_LEN {
            debug!(
                history_len = history_key.len(),
                "history too long, converting without it"
            );
            segments.clear_history_segments();
        }

        let key = format!("{}{}", segments.history_key(), segments.conversion_key());
        let mut lattice = Lattice::new(&key);
        self.make_lattice(segments, &mut lattice);
        self.viterbi(segments, &mut lattice);

        if lattice.node(EOS).prev.is_none() {
            return Err(ConvertError::Disconnected);
        }

        let max_paths = if segments.request_type().is_prediction_like() {
            segments.max_prediction_candidates_size() + 10
        } else {
            CONVERSION_NBEST_SIZE
        };
        let paths = nbest::enumerate(self, segments, &lattice, max_paths);
        debug!(path_count = paths.len(), best_cost = paths.first().map(|p| p.cost));

        candidates::insert_candidates(self, request, segments, &lattice, &paths);
        Ok(())
    }

    /// Pad a segment's candidate list with kana-variant candidates derived
    /// from its top candidate. Exposed for callers holding a bare segment.
    pub fn insert_dummy_candidates(&self, segment: &mut Segment, requested_size: usize) {
        candidates::insert_dummy_candidates(segment, requested_size);
    }

    fn validate(&self, segments: &Segments) -> Result<(), ConvertError> {
        if segments.conversion_segments_size() == 0 {
            return Err(ConvertError::NoConversionSegment);
        }
        for i in 0..segments.conversion_segments_size() {
            if segments.conversion_segment(i).key().is_empty() {
                return Err(ConvertError::EmptyKey);
            }
        }
        if segments.request_type().is_prediction_like() && segments.conversion_segments_size() != 1
        {
            return Err(ConvertError::MultiplePredictionSegments);
        }
        Ok(())
    }

    /// Map every byte position of the lattice key to the index of the
    /// segment containing it. The extra trailing entry keeps position
    /// `key_len` attributed to the last segment.
    pub(crate) fn make_group(&self, segments: &Segments) -> Vec<u16> {
        let mut group = Vec::new();
        for i in 0..segments.segments_size() {
            let len = segments.segment(i).key().len();
            group.extend(std::iter::repeat(i as u16).take(len));
        }
        let last = segments.segments_size().saturating_sub(1) as u16;
        group.push(last);
        group
    }
}
