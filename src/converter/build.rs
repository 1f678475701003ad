//! Lattice population: every dictionary hypothesis over every position of
//! the key, plus the synthetic nodes (history, unknown, number, fixed-value,
//! predictive) that keep the lattice connected and constrained.

use tracing::{debug, debug_span};

use crate::dict::{LookupControl, Token};
use crate::numeric;
use crate::segments::{RequestType, SegmentType, Segments};
use crate::unicode;

use super::lattice::{Lattice, Node, NodeKind};
use super::ImmutableConverter;

/// Emission cost of the single-character fallback node.
const UNKNOWN_WORD_COST: i16 = 10000;

/// Emission cost of a fused number node.
const NUMBER_WORD_COST: i16 = 2000;

impl ImmutableConverter<'_> {
    /// Populate the lattice for the given segment sequence.
    ///
    /// The node set produced is deterministic for a given key and data.
    pub(crate) fn make_lattice(&self, segments: &Segments, lattice: &mut Lattice) {
        let _span = debug_span!("make_lattice", key_len = lattice.key().len()).entered();

        let history_len = self.insert_history_nodes(segments, lattice);
        let key = lattice.key().to_string();

        // Byte ranges of FIXED_VALUE conversion segments; no normal, unknown
        // or number hypotheses are generated inside them.
        let fixed_value_ranges = fixed_value_ranges(segments);

        let mut number_covered_until = 0;
        for (pos, _) in key.char_indices() {
            if pos < history_len {
                continue;
            }
            if fixed_value_ranges.iter().any(|r| r.contains(&pos)) {
                continue;
            }

            let rest = &key[pos..];

            // Dictionary hypotheses whose reading is a prefix of the rest.
            let mut tokens = Vec::new();
            self.dictionary.lookup_prefix(rest, &mut |t: &Token| {
                tokens.push(t.clone());
                LookupControl::Continue
            });
            for token in &tokens {
                lattice.insert(Node::new(
                    pos,
                    &token.key,
                    &token.value,
                    token.lid,
                    token.rid,
                    token.wcost,
                ));
            }

            // Single-character fallback keeps every position reachable even
            // when the dictionary has no entry here.
            let first_char_len = rest.chars().next().map_or(0, |c| c.len_utf8());
            let ch = &rest[..first_char_len];
            let unknown_id = self.pos_matcher.unknown_id();
            lattice.insert(
                Node::new(pos, ch, ch, unknown_id, unknown_id, UNKNOWN_WORD_COST)
                    .with_kind(NodeKind::Unknown),
            );

            // Fuse consecutive digits or a kana-numeral expression into one
            // number node at the run's left-most position.
            if pos >= number_covered_until {
                if let Some(end) = self.insert_number_node(pos, rest, lattice) {
                    number_covered_until = end;
                }
            }
        }

        self.insert_fixed_value_nodes(segments, lattice);

        if segments.request_type() == RequestType::Prediction {
            self.make_lattice_nodes_for_predictive_nodes(segments, lattice);
        }

        debug!(node_count = lattice.nodes().len());
    }

    /// Chain one node per history segment over the pre-conversion region.
    /// Returns the byte length of the history reading.
    fn insert_history_nodes(&self, segments: &Segments, lattice: &mut Lattice) -> usize {
        let mut pos = 0;
        for i in 0..segments.history_segments_size() {
            let segment = segments.segment(i);
            let (value, lid, rid) = if segment.candidates_size() > 0 {
                let c = segment.candidate(0);
                (c.value.clone(), c.lid, c.rid)
            } else {
                (segment.key().to_string(), 0, 0)
            };
            lattice.insert(
                Node::new(pos, segment.key(), &value, lid, rid, 0).with_kind(NodeKind::History),
            );
            pos += segment.key().len();
        }
        pos
    }

    /// One node per FIXED_VALUE conversion segment, carrying its committed
    /// surface over the whole range.
    fn insert_fixed_value_nodes(&self, segments: &Segments, lattice: &mut Lattice) {
        let mut pos = segments.history_key().len();
        for i in 0..segments.conversion_segments_size() {
            let segment = segments.conversion_segment(i);
            if segment.segment_type() == SegmentType::FixedValue && segment.candidates_size() > 0 {
                let c = segment.candidate(0);
                lattice.insert(Node::new(
                    pos,
                    segment.key(),
                    &c.value,
                    c.lid,
                    c.rid,
                    0,
                ));
            }
            pos += segment.key().len();
        }
    }

    /// Insert a number node at `pos` if `rest` starts with a digit run or a
    /// kana-numeral expression of at least two characters. Returns the byte
    /// position just past the fused run.
    fn insert_number_node(&self, pos: usize, rest: &str, lattice: &mut Lattice) -> Option<usize> {
        let number_id = self.pos_matcher.number_id();

        let digit_len: usize = rest
            .chars()
            .take_while(|&c| unicode::is_digit(c))
            .map(|c| c.len_utf8())
            .sum();
        if digit_len > 0 {
            let run = &rest[..digit_len];
            let surface: String = run.chars().map(unicode::digit_to_ascii).collect();
            lattice.insert(
                Node::new(pos, run, &surface, number_id, number_id, NUMBER_WORD_COST)
                    .with_kind(NodeKind::Number),
            );
            return Some(pos + digit_len);
        }

        if let Some((value, len)) = numeric::parse_japanese_number_prefix(rest) {
            let run = &rest[..len];
            if run.chars().count() >= 2 {
                lattice.insert(
                    Node::new(
                        pos,
                        run,
                        &numeric::to_halfwidth(value),
                        number_id,
                        number_id,
                        NUMBER_WORD_COST,
                    )
                    .with_kind(NodeKind::Number),
                );
                return Some(pos + len);
            }
        }

        None
    }

    /// Predictive completions: for every position inside the **last
    /// conversion segment**, yield dictionary entries whose reading extends
    /// past the end of the key. History tail positions are never queried.
    pub(crate) fn make_lattice_nodes_for_predictive_nodes(
        &self,
        segments: &Segments,
        lattice: &mut Lattice,
    ) {
        if segments.conversion_segments_size() == 0 {
            return;
        }
        let key = lattice.key().to_string();
        let key_len = key.len();

        let mut last_start = segments.history_key().len();
        for i in 0..segments.conversion_segments_size() - 1 {
            last_start += segments.conversion_segment(i).key().len();
        }
        if last_start >= key_len {
            return;
        }

        let _span = debug_span!("predictive_nodes", last_start).entered();

        for (offset, _) in key[last_start..].char_indices() {
            let pos = last_start + offset;
            let rest = &key[pos..];
            let remaining = key_len - pos;

            let mut tokens = Vec::new();
            for dict in [self.dictionary, self.suffix_dictionary] {
                dict.lookup_predictive(rest, &mut |t: &Token| {
                    if t.key.len() > remaining {
                        tokens.push(t.clone());
                    }
                    LookupControl::Continue
                });
            }
            for token in tokens {
                let mut node = Node::new(
                    pos,
                    &token.key,
                    &token.value,
                    token.lid,
                    token.rid,
                    token.wcost,
                )
                .with_kind(NodeKind::Predictive);
                // The reading extends past the input; the node ends at EOS.
                node.end_pos = key_len;
                lattice.insert(node);
            }
        }
    }
}

fn fixed_value_ranges(segments: &Segments) -> Vec<std::ops::Range<usize>> {
    let mut ranges = Vec::new();
    let mut pos = segments.history_key().len();
    for i in 0..segments.conversion_segments_size() {
        let segment = segments.conversion_segment(i);
        let end = pos + segment.key().len();
        if segment.segment_type() == SegmentType::FixedValue {
            ranges.push(pos..end);
        }
        pos = end;
    }
    ranges
}
