/// Connection-id classification constants, loaded from the data blob at
/// construction and held immutably.
///
/// The converter needs only a handful of distinctions: the id used for
/// unknown single-character fallback nodes, the id for synthesized number
/// nodes, and the id range of functional words (助詞/助動詞 and friends).
#[derive(Debug, Clone, Copy)]
pub struct PosMatcher {
    unknown_id: u16,
    number_id: u16,
    functional_min: u16,
    functional_max: u16,
}

impl PosMatcher {
    pub fn new(unknown_id: u16, number_id: u16, functional_min: u16, functional_max: u16) -> Self {
        Self {
            unknown_id,
            number_id,
            functional_min,
            functional_max,
        }
    }

    pub fn unknown_id(&self) -> u16 {
        self.unknown_id
    }

    pub fn number_id(&self) -> u16 {
        self.number_id
    }

    /// Whether an id falls in the functional-word range.
    /// Returns `false` when no range is set (both 0).
    pub fn is_functional(&self, id: u16) -> bool {
        self.functional_min != 0 && self.functional_min <= id && id <= self.functional_max
    }

    pub fn is_number(&self, id: u16) -> bool {
        id == self.number_id
    }
}

/// Coarse POS buckets used for small additive decoding adjustments.
pub mod group {
    pub const CONTENT: u8 = 0;
    pub const FUNCTIONAL: u8 = 1;
    pub const NUMBER: u8 = 2;
    pub const PREFIX: u8 = 3;
}

/// Maps connection ids to coarse POS groups.
/// Ids beyond the table default to `group::CONTENT`.
pub struct PosGroup {
    groups: Vec<u8>,
}

impl PosGroup {
    pub fn new(groups: Vec<u8>) -> Self {
        Self { groups }
    }

    /// Build a group table straight from a `PosMatcher`'s ranges.
    pub fn from_matcher(matcher: &PosMatcher, num_ids: u16) -> Self {
        let mut groups = vec![group::CONTENT; num_ids as usize];
        for (id, g) in groups.iter_mut().enumerate() {
            let id = id as u16;
            if matcher.is_functional(id) {
                *g = group::FUNCTIONAL;
            } else if matcher.is_number(id) {
                *g = group::NUMBER;
            }
        }
        Self { groups }
    }

    pub fn group(&self, id: u16) -> u8 {
        self.groups.get(id as usize).copied().unwrap_or(group::CONTENT)
    }
}
