//! N-best path enumeration.
//!
//! Backward A* from EOS: the forward pass's accumulated costs are an exact
//! (hence admissible) heuristic for the remaining distance to BOS, so paths
//! pop off the heap in total-cost order. Enumeration stops at the caller's
//! bound, at a fixed cost gap above the best path, or on exhaustion.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tracing::{debug, debug_span};

use crate::segments::Segments;

use super::lattice::{Lattice, BOS, EOS, UNREACHABLE_COST};
use super::ImmutableConverter;

/// Paths costing more than this above the best one are not enumerated.
const NBEST_COST_GAP: i32 = 16000;

/// Hard cap on heap expansions, against adversarial lattices.
const MAX_EXPANSIONS: usize = 10_000;

/// One decoded path: interior node ids (BOS/EOS excluded) in reading order,
/// plus the total path cost.
pub(crate) struct NBestPath {
    pub node_ids: Vec<usize>,
    pub cost: i32,
}

/// A partial reverse path: a node, the exact cost of the suffix from it to
/// EOS, and the search-arena index of the state it extends.
struct SearchState {
    node: usize,
    suffix_cost: i32,
    next: Option<usize>,
}

pub(crate) fn enumerate(
    converter: &ImmutableConverter<'_>,
    segments: &Segments,
    lattice: &Lattice,
    max_paths: usize,
) -> Vec<NBestPath> {
    let _span = debug_span!("nbest", max_paths).entered();

    let best_total = lattice.node(EOS).cost;
    if best_total == UNREACHABLE_COST || max_paths == 0 {
        return Vec::new();
    }
    let group = converter.make_group(segments);

    let mut states = vec![SearchState {
        node: EOS,
        suffix_cost: 0,
        next: None,
    }];
    let mut heap: BinaryHeap<Reverse<(i32, usize)>> = BinaryHeap::new();
    heap.push(Reverse((best_total, 0)));

    let mut paths = Vec::new();
    let mut expansions = 0;

    while let Some(Reverse((total, state_idx))) = heap.pop() {
        if paths.len() >= max_paths {
            break;
        }
        if total.saturating_sub(best_total) > NBEST_COST_GAP {
            break;
        }

        let state_node = states[state_idx].node;
        if state_node == BOS {
            paths.push(NBestPath {
                node_ids: collect_path(&states, state_idx),
                cost: total,
            });
            continue;
        }

        let rnode = lattice.node(state_node);
        for &lidx in lattice.end_nodes(rnode.begin_pos) {
            let lnode = lattice.node(lidx);
            if lnode.cost == UNREACHABLE_COST {
                continue;
            }
            let Some(edge) = converter.edge_cost(lnode, rnode, &group) else {
                continue;
            };
            let suffix_cost = states[state_idx]
                .suffix_cost
                .saturating_add(edge)
                .saturating_add(rnode.wcost as i32);
            let estimate = lnode.cost.saturating_add(suffix_cost);

            states.push(SearchState {
                node: lidx,
                suffix_cost,
                next: Some(state_idx),
            });
            heap.push(Reverse((estimate, states.len() - 1)));

            expansions += 1;
            if expansions >= MAX_EXPANSIONS {
                debug!(expansions, "expansion cap hit");
                return paths;
            }
        }
    }

    debug!(path_count = paths.len());
    paths
}

/// Walk the state chain from a BOS state towards EOS, collecting interior
/// node ids in reading order.
fn collect_path(states: &[SearchState], bos_state: usize) -> Vec<usize> {
    let mut node_ids = Vec::new();
    let mut cursor = states[bos_state].next;
    while let Some(idx) = cursor {
        if states[idx].node != EOS {
            node_ids.push(states[idx].node);
        }
        cursor = states[idx].next;
    }
    node_ids
}
