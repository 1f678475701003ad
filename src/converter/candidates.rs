//! Projection of decoded paths into ranked segment candidates.
//!
//! Conversion requests split each path at the caller's segment boundaries;
//! prediction-shaped requests turn each whole path into one candidate for
//! the single conversion segment, annotated with inner word boundaries.
//! Sparse results are padded with kana-variant dummy candidates.

use std::collections::HashSet;

use tracing::{debug, debug_span};

use crate::request::ConversionRequest;
use crate::segments::{Candidate, InnerSegmentBoundary, Segment, Segments};
use crate::unicode::{hiragana_to_katakana, katakana_to_halfwidth};

use super::lattice::{Lattice, Node, NodeKind};
use super::nbest::NBestPath;
use super::ImmutableConverter;

/// Cost step between a candidate and the dummies derived from it.
const DUMMY_WCOST_OFFSET: i32 = 90;

/// Conversion segments are padded up to this many candidates.
const CONVERSION_DUMMY_SIZE: usize = 3;

/// Partial candidates appended per request.
const MAX_PARTIAL_CANDIDATES: usize = 3;

pub(crate) fn insert_candidates(
    converter: &ImmutableConverter<'_>,
    request: &ConversionRequest,
    segments: &mut Segments,
    lattice: &Lattice,
    paths: &[NBestPath],
) {
    let _span = debug_span!("insert_candidates", path_count = paths.len()).entered();
    if segments.request_type().is_prediction_like() {
        fill_prediction_segment(converter, request, segments, lattice, paths);
    } else {
        fill_conversion_segments(converter, segments, lattice, paths);
    }
}

fn fill_conversion_segments(
    converter: &ImmutableConverter<'_>,
    segments: &mut Segments,
    lattice: &Lattice,
    paths: &[NBestPath],
) {
    let history_len = segments.history_key().len();

    // Absolute byte ranges of the conversion segments.
    let mut ranges = Vec::new();
    let mut pos = history_len;
    for i in 0..segments.conversion_segments_size() {
        let end = pos + segments.conversion_segment(i).key().len();
        ranges.push(pos..end);
        pos = end;
    }

    for i in 0..segments.conversion_segments_size() {
        segments.mut_conversion_segment(i).clear_candidates();
    }

    for path in paths {
        let nodes: Vec<&Node> = path
            .node_ids
            .iter()
            .map(|&id| lattice.node(id))
            .filter(|n| n.begin_pos >= history_len)
            .collect();

        // Paths whose words straddle a segment boundary cannot be projected
        // onto the caller's segmentation.
        let aligned = nodes.iter().all(|n| {
            ranges
                .iter()
                .any(|r| r.start <= n.begin_pos && n.end_pos <= r.end)
        });
        if !aligned {
            continue;
        }

        for (i, range) in ranges.iter().enumerate() {
            let segment_nodes: Vec<&Node> = nodes
                .iter()
                .copied()
                .filter(|n| range.start <= n.begin_pos && n.end_pos <= range.end)
                .collect();
            if segment_nodes.is_empty() {
                continue;
            }
            let candidate = candidate_from_nodes(converter, &segment_nodes, path.cost);
            if converter
                .suppression_dictionary
                .suppresses(&candidate.key, &candidate.value)
            {
                continue;
            }
            let segment = segments.mut_conversion_segment(i);
            if segment.candidates().iter().any(|c| c.value == candidate.value) {
                continue;
            }
            segment.add_candidate(candidate);
        }
    }

    for i in 0..segments.conversion_segments_size() {
        let segment = segments.mut_conversion_segment(i);
        insert_dummy_candidates(segment, CONVERSION_DUMMY_SIZE);
        debug!(segment = i, candidates = segment.candidates_size());
    }
}

fn fill_prediction_segment(
    converter: &ImmutableConverter<'_>,
    request: &ConversionRequest,
    segments: &mut Segments,
    lattice: &Lattice,
    paths: &[NBestPath],
) {
    let history_len = segments.history_key().len();
    let max_candidates = segments.max_prediction_candidates_size();
    let request_type = segments.request_type();
    let original_key = segments.conversion_segment(0).key().to_string();

    let mut candidates: Vec<Candidate> = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for path in paths {
        if candidates.len() >= max_candidates {
            break;
        }
        let nodes: Vec<&Node> = path
            .node_ids
            .iter()
            .map(|&id| lattice.node(id))
            .filter(|n| n.begin_pos >= history_len)
            .collect();
        if nodes.is_empty() {
            continue;
        }

        let mut candidate = candidate_from_nodes(converter, &nodes, path.cost);
        candidate.inner_segment_boundary = inner_boundaries(converter, &nodes);
        debug_assert!(candidate.is_valid());

        if converter
            .suppression_dictionary
            .suppresses(&candidate.key, &candidate.value)
        {
            continue;
        }
        if converter.suggestion_filter.is_bad_suggestion(&candidate.value) {
            continue;
        }
        if !seen.insert((candidate.key.clone(), candidate.value.clone())) {
            continue;
        }
        candidates.push(candidate);
    }

    if request.create_partial_candidates {
        append_partial_candidates(converter, lattice, paths, history_len, &original_key, &mut seen, &mut candidates);
    }

    let segment = segments.mut_conversion_segment(0);
    segment.clear_candidates();
    for candidate in candidates {
        segment.add_candidate(candidate);
    }
    // The segment keeps the requested reading even when every candidate
    // completes past it.
    segment.set_key(&original_key);

    insert_dummy_candidates(segment, max_candidates);
    debug!(request_type = ?request_type, candidates = segment.candidates_size());
}

/// Candidates consuming a strict prefix of the reading, built from the best
/// path's word boundaries.
fn append_partial_candidates(
    converter: &ImmutableConverter<'_>,
    lattice: &Lattice,
    paths: &[NBestPath],
    history_len: usize,
    original_key: &str,
    seen: &mut HashSet<(String, String)>,
    candidates: &mut Vec<Candidate>,
) {
    let Some(best) = paths.first() else {
        return;
    };
    let nodes: Vec<&Node> = best
        .node_ids
        .iter()
        .map(|&id| lattice.node(id))
        .filter(|n| n.begin_pos >= history_len && n.kind != NodeKind::Predictive)
        .collect();

    let mut appended = 0;
    for end in 1..nodes.len() {
        if appended >= MAX_PARTIAL_CANDIDATES {
            break;
        }
        let prefix = &nodes[..end];
        let key: String = prefix.iter().map(|n| n.key.as_str()).collect();
        if key.len() >= original_key.len() || !original_key.starts_with(&key) {
            continue;
        }
        let last = prefix[prefix.len() - 1];
        let mut candidate = candidate_from_nodes(converter, prefix, last.cost);
        candidate.attributes |= Candidate::PARTIALLY_KEY_CONSUMED;
        if converter
            .suppression_dictionary
            .suppresses(&candidate.key, &candidate.value)
        {
            continue;
        }
        if !seen.insert((candidate.key.clone(), candidate.value.clone())) {
            continue;
        }
        candidates.push(candidate);
        appended += 1;
    }
}

/// Build one candidate from a run of path nodes.
fn candidate_from_nodes(
    converter: &ImmutableConverter<'_>,
    nodes: &[&Node],
    path_cost: i32,
) -> Candidate {
    let key: String = nodes.iter().map(|n| n.key.as_str()).collect();
    let value: String = nodes.iter().map(|n| n.value.as_str()).collect();
    let wcost = nodes.iter().map(|n| n.wcost as i32).sum();
    let structure_cost = nodes
        .windows(2)
        .map(|w| converter.connector.transition_cost(w[0].rid, w[1].lid) as i32)
        .sum();

    // Content excludes the trailing functional-word run; a candidate made
    // entirely of functional words is its own content.
    let trailing_functional: usize = nodes
        .iter()
        .rev()
        .take_while(|n| converter.pos_matcher.is_functional(n.lid))
        .count();
    let content_nodes = if trailing_functional == nodes.len() {
        nodes
    } else {
        &nodes[..nodes.len() - trailing_functional]
    };
    let content_key: String = content_nodes.iter().map(|n| n.key.as_str()).collect();
    let content_value: String = content_nodes.iter().map(|n| n.value.as_str()).collect();

    Candidate {
        key,
        value,
        content_key,
        content_value,
        wcost,
        cost: path_cost,
        structure_cost,
        lid: nodes[0].lid,
        rid: nodes[nodes.len() - 1].rid,
        attributes: 0,
        inner_segment_boundary: Vec::new(),
    }
}

/// Inner word boundaries for a prediction candidate.
///
/// An inner segment is a content word plus its trailing functional words; a
/// new one opens when a content word follows a functional word. Junctions
/// touching a predictive node never open a boundary. Single-segment
/// candidates get no boundary list at all.
fn inner_boundaries(
    converter: &ImmutableConverter<'_>,
    nodes: &[&Node],
) -> Vec<InnerSegmentBoundary> {
    let mut boundaries = Vec::new();
    let mut current = InnerSegmentBoundary {
        key_len: 0,
        value_len: 0,
        content_key_len: 0,
        content_value_len: 0,
    };
    let mut in_functional_tail = false;

    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            let prev = nodes[i - 1];
            let opens = prev.kind != NodeKind::Predictive
                && node.kind != NodeKind::Predictive
                && converter.pos_matcher.is_functional(prev.lid)
                && !converter.pos_matcher.is_functional(node.lid);
            if opens {
                push_segment(&mut boundaries, current);
                current = InnerSegmentBoundary {
                    key_len: 0,
                    value_len: 0,
                    content_key_len: 0,
                    content_value_len: 0,
                };
                in_functional_tail = false;
            }
        }

        current.key_len += node.key.len();
        current.value_len += node.value.len();
        if converter.pos_matcher.is_functional(node.lid) {
            in_functional_tail = true;
        } else if !in_functional_tail {
            current.content_key_len = current.key_len;
            current.content_value_len = current.value_len;
        }
    }
    push_segment(&mut boundaries, current);

    if boundaries.len() >= 2 {
        boundaries
    } else {
        Vec::new()
    }
}

fn push_segment(boundaries: &mut Vec<InnerSegmentBoundary>, mut segment: InnerSegmentBoundary) {
    if segment.key_len == 0 {
        return;
    }
    // All-functional inner segments are their own content.
    if segment.content_key_len == 0 {
        segment.content_key_len = segment.key_len;
        segment.content_value_len = segment.value_len;
    }
    boundaries.push(segment);
}

/// Pad a sparse candidate list with kana variants of the top candidate:
/// hiragana, katakana, and half-width katakana surfaces.
/// Every dummy ranks strictly below it and carries no inner boundaries.
pub(crate) fn insert_dummy_candidates(segment: &mut Segment, requested_size: usize) {
    if segment.candidates_size() == 0 || segment.candidates_size() >= requested_size {
        return;
    }
    let base = segment.candidate(0).clone();
    if base.key.is_empty() {
        return;
    }

    let katakana = hiragana_to_katakana(&base.key);
    let halfwidth = katakana_to_halfwidth(&katakana);
    let variants = [base.key.clone(), katakana, halfwidth];
    let mut offset = DUMMY_WCOST_OFFSET;
    for value in variants {
        if segment.candidates().iter().any(|c| c.value == value) {
            continue;
        }
        segment.add_candidate(Candidate {
            key: base.key.clone(),
            value: value.clone(),
            content_key: base.key.clone(),
            content_value: value,
            wcost: base.wcost + offset,
            cost: base.cost + offset,
            structure_cost: 0,
            lid: base.lid,
            rid: base.rid,
            attributes: Candidate::DUMMY_CANDIDATE,
            inner_segment_boundary: Vec::new(),
        });
        offset += DUMMY_WCOST_OFFSET;
        if segment.candidates_size() >= requested_size {
            break;
        }
    }
}
