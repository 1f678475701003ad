//! Forward minimum-cost propagation over the lattice.
//!
//! Edge costs combine the bigram connection cost, a boundary penalty that
//! favors longer words inside a segment, and small POS-group adjustments.
//! Nodes straddling a fixed segment boundary are cut out of the search but
//! left in the lattice; the unknown-character chain routes around them.

use tracing::debug_span;

use crate::dict::pos::group;
use crate::dict::Connector;
use crate::segmenter::BoundaryClass;
use crate::segments::{SegmentType, Segments};

use super::lattice::{Lattice, Node, NodeKind, UNREACHABLE_COST};
use super::ImmutableConverter;

/// Cost of opening a word boundary the segmenter merely allows.
/// Discourages paths of many short words over fewer, longer ones.
pub(crate) const SEGMENT_PENALTY: i32 = 5000;

/// Bonus for functional words following functional words.
const FUNCTIONAL_ADJACENCY_BONUS: i32 = 500;

/// Penalty for a number compound directly after a stand-alone content word.
const CONTENT_NUMBER_PENALTY: i32 = 1000;

impl ImmutableConverter<'_> {
    /// Forward pass: compute the best accumulated cost and back-pointer of
    /// every reachable node, BOS to EOS.
    pub(crate) fn viterbi(&self, segments: &Segments, lattice: &mut Lattice) {
        let _span = debug_span!("viterbi", key_len = lattice.key().len()).entered();

        let group = self.make_group(segments);
        let hard_boundaries = hard_boundaries(segments);
        let key_len = lattice.key().len();

        for pos in 0..=key_len {
            let rnodes = lattice.begin_nodes(pos).to_vec();
            for ridx in rnodes {
                if lattice.node(ridx).kind == NodeKind::Bos {
                    continue;
                }

                if straddles_any(lattice.node(ridx), &hard_boundaries) {
                    let node = lattice.node_mut(ridx);
                    node.kind = NodeKind::WeakConnected;
                    node.cost = UNREACHABLE_COST;
                    node.prev = None;
                    continue;
                }

                let mut best = UNREACHABLE_COST;
                let mut best_prev = None;
                for &lidx in lattice.end_nodes(pos) {
                    let lnode = lattice.node(lidx);
                    if lnode.cost == UNREACHABLE_COST {
                        continue;
                    }
                    let Some(edge) = self.edge_cost(lnode, lattice.node(ridx), &group) else {
                        continue;
                    };
                    let cost = lnode
                        .cost
                        .saturating_add(edge)
                        .saturating_add(lattice.node(ridx).wcost as i32);
                    if cost < best {
                        best = cost;
                        best_prev = Some(lidx);
                    }
                }

                let node = lattice.node_mut(ridx);
                node.cost = best;
                node.prev = best_prev;
            }
        }
    }

    /// Cost of the transition `lnode` → `rnode`, or `None` when the pair is
    /// forbidden (connection sentinel, segmenter veto, or a cut-out node).
    pub(crate) fn edge_cost(&self, lnode: &Node, rnode: &Node, group: &[u16]) -> Option<i32> {
        if lnode.kind == NodeKind::WeakConnected || rnode.kind == NodeKind::WeakConnected {
            return None;
        }

        let transition = self.connector.transition_cost(lnode.rid, rnode.lid);
        if Connector::is_forbidden(transition) {
            return None;
        }

        let boundary_penalty = if matches!(lnode.kind, NodeKind::Bos | NodeKind::History)
            || rnode.kind == NodeKind::Eos
        {
            // Sentinel edges and the history→conversion junction carry a
            // boundary by definition; it is never penalized or vetoed.
            0
        } else {
            match self.segmenter.classify(lnode.rid, rnode.lid) {
                BoundaryClass::Forbidden => return None,
                BoundaryClass::Required => 0,
                BoundaryClass::Allowed => {
                    if is_preexisting_boundary(rnode.begin_pos, group) {
                        0
                    } else {
                        SEGMENT_PENALTY
                    }
                }
            }
        };

        Some(
            (transition as i32)
                .saturating_add(boundary_penalty)
                .saturating_add(self.pos_group_penalty(lnode, rnode)),
        )
    }

    fn pos_group_penalty(&self, lnode: &Node, rnode: &Node) -> i32 {
        if matches!(lnode.kind, NodeKind::Bos | NodeKind::History) || rnode.kind == NodeKind::Eos {
            return 0;
        }
        let lg = self.pos_group.group(lnode.rid);
        let rg = self.pos_group.group(rnode.lid);
        if lg == group::FUNCTIONAL && rg == group::FUNCTIONAL {
            -FUNCTIONAL_ADJACENCY_BONUS
        } else if lg == group::CONTENT && rnode.kind == NodeKind::Number {
            CONTENT_NUMBER_PENALTY
        } else {
            0
        }
    }
}

/// A boundary the caller imposed (segment junction) rather than one the
/// decoder may choose; crossing it costs nothing.
fn is_preexisting_boundary(pos: usize, group: &[u16]) -> bool {
    pos > 0 && pos < group.len() && group[pos] != group[pos - 1]
}

/// Byte positions no node may straddle: the edges of FIXED_BOUNDARY and
/// FIXED_VALUE segments.
fn hard_boundaries(segments: &Segments) -> Vec<usize> {
    let mut boundaries = Vec::new();
    let mut pos = 0;
    for i in 0..segments.segments_size() {
        let segment = segments.segment(i);
        let end = pos + segment.key().len();
        if matches!(
            segment.segment_type(),
            SegmentType::FixedBoundary | SegmentType::FixedValue
        ) {
            boundaries.push(pos);
            boundaries.push(end);
        }
        pos = end;
    }
    boundaries.sort_unstable();
    boundaries.dedup();
    boundaries
}

fn straddles_any(node: &Node, boundaries: &[usize]) -> bool {
    boundaries
        .iter()
        .any(|&b| node.begin_pos < b && b < node.end_pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::lattice::{Lattice, Node, EOS};
    use crate::converter::testutil::TestData;
    use crate::segments::Segments;

    fn decode(data: &TestData, key: &str) -> Vec<String> {
        let converter = data.converter();
        let mut segments = Segments::new();
        segments.add_segment().set_key(key);
        let mut lattice = Lattice::new(key);
        converter.make_lattice(&segments, &mut lattice);
        converter.viterbi(&segments, &mut lattice);

        // Walk back-pointers from EOS.
        let mut surfaces = Vec::new();
        let mut idx = lattice.node(EOS).prev.expect("EOS must be reachable");
        while lattice.node(idx).kind != NodeKind::Bos {
            surfaces.push(lattice.node(idx).value.clone());
            idx = lattice.node(idx).prev.expect("chain must reach BOS");
        }
        surfaces.reverse();
        surfaces
    }

    #[test]
    fn test_best_path_prefers_dictionary_words() {
        let data = TestData::new();
        assert_eq!(decode(&data, "きょうはいいてんき"), vec![
            "今日", "は", "良い", "天気"
        ]);
    }

    #[test]
    fn test_unknown_only_input() {
        let data = TestData::new();
        assert_eq!(decode(&data, "ぬ"), vec!["ぬ"]);
    }

    #[test]
    fn test_deterministic_tie_break() {
        let data = TestData::new();
        let first = decode(&data, "きょう");
        for _ in 0..5 {
            assert_eq!(decode(&data, "きょう"), first);
        }
    }

    #[test]
    fn test_forbidden_transition_disconnects() {
        // Forbid unknown→unknown; a key decodable only through two unknown
        // nodes then has no path at all.
        use crate::converter::testutil::{NUM_IDS, UNKNOWN_ID};
        let mut data = TestData::new();
        let n = NUM_IDS as usize;
        let mut costs = vec![0i16; n * n];
        costs[UNKNOWN_ID as usize * n + UNKNOWN_ID as usize] =
            crate::dict::connection::INVALID_COST;
        data.connector = crate::dict::Connector::new_owned(NUM_IDS, costs);

        let converter = data.converter();
        let mut segments = Segments::new();
        segments.add_segment().set_key("ぬぬ");
        let mut lattice = Lattice::new("ぬぬ");
        converter.make_lattice(&segments, &mut lattice);
        converter.viterbi(&segments, &mut lattice);
        assert!(lattice.node(EOS).prev.is_none());

        // With the default table the same key decodes fine.
        let data = TestData::new();
        let converter = data.converter();
        let mut lattice = Lattice::new("ぬぬ");
        converter.make_lattice(&segments, &mut lattice);
        converter.viterbi(&segments, &mut lattice);
        assert!(lattice.node(EOS).prev.is_some());
    }

    #[test]
    fn test_weak_connected_marking() {
        let data = TestData::new();
        let converter = data.converter();

        let mut segments = Segments::new();
        let segment = segments.add_segment();
        segment.set_key("きょう");
        segment.set_segment_type(crate::segments::SegmentType::FixedBoundary);
        segments.add_segment().set_key("は");

        let key = "きょうは";
        let mut lattice = Lattice::new(key);
        converter.make_lattice(&segments, &mut lattice);
        // A hypothesis spanning the fixed boundary.
        let straddler = lattice.insert(Node::new(6, "うは", "宇破", 10, 10, 1000));
        converter.viterbi(&segments, &mut lattice);

        assert_eq!(lattice.node(straddler).kind, NodeKind::WeakConnected);
        assert_eq!(lattice.node(straddler).prev, None);
        assert!(lattice.node(EOS).prev.is_some());
    }

    #[test]
    fn test_preexisting_boundary_is_free() {
        let group = vec![0, 0, 0, 1, 1];
        assert!(is_preexisting_boundary(3, &group));
        assert!(!is_preexisting_boundary(2, &group));
        assert!(!is_preexisting_boundary(0, &group));
    }
}
