//! The segment sequence a conversion call operates on.
//!
//! A `Segments` holds zero or more committed history segments followed by
//! one or more conversion segments. The converter rewrites the conversion
//! segments' candidate lists and leaves history untouched (unless the
//! history-too-long recovery fires).

/// What kind of output the caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestType {
    #[default]
    Conversion,
    Prediction,
    Suggestion,
    PartialPrediction,
    PartialSuggestion,
}

impl RequestType {
    /// Prediction-shaped requests share one synthesis path: a single
    /// conversion segment receives ranked whole-reading candidates.
    pub fn is_prediction_like(self) -> bool {
        !matches!(self, RequestType::Conversion)
    }
}

/// How a segment constrains the lattice around its boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SegmentType {
    /// Boundary may move freely.
    #[default]
    Free,
    /// The segment's extent is fixed; no node may straddle its edges.
    FixedBoundary,
    /// Both the extent and the surface are fixed.
    FixedValue,
    /// Committed by the user in a previous conversion.
    History,
    /// Submitted to the application already.
    Submitted,
}

/// Byte lengths of one inner segment of a candidate:
/// (key, value, content key, content value). Content excludes the
/// trailing functional-word span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InnerSegmentBoundary {
    pub key_len: usize,
    pub value_len: usize,
    pub content_key_len: usize,
    pub content_value_len: usize,
}

/// One ranked conversion result for a segment.
#[derive(Debug, Clone, Default)]
pub struct Candidate {
    /// Reading consumed by this candidate. May be longer than the segment
    /// key for predictive completions, or shorter for partial candidates.
    pub key: String,
    /// Surface form.
    pub value: String,
    /// Reading of the content part (without trailing functional words).
    pub content_key: String,
    /// Surface of the content part.
    pub content_value: String,
    /// Word cost of the candidate (emission only).
    pub wcost: i32,
    /// Total path cost this candidate came from.
    pub cost: i32,
    /// Sum of the transition costs between the candidate's inner words.
    pub structure_cost: i32,
    /// Left connection id of the first word.
    pub lid: u16,
    /// Right connection id of the last word.
    pub rid: u16,
    /// Attribute bitset (`Candidate::PARTIALLY_KEY_CONSUMED`, ...).
    pub attributes: u32,
    /// Inner word boundaries, present only on prediction candidates that
    /// span multiple content words.
    pub inner_segment_boundary: Vec<InnerSegmentBoundary>,
}

impl Candidate {
    /// The candidate consumes only a prefix of the segment's reading.
    pub const PARTIALLY_KEY_CONSUMED: u32 = 1 << 0;
    /// Synthesized from another candidate rather than decoded.
    pub const DUMMY_CANDIDATE: u32 = 1 << 1;

    pub fn push_inner_segment_boundary(
        &mut self,
        key_len: usize,
        value_len: usize,
        content_key_len: usize,
        content_value_len: usize,
    ) {
        self.inner_segment_boundary.push(InnerSegmentBoundary {
            key_len,
            value_len,
            content_key_len,
            content_value_len,
        });
    }

    /// Check the inner-segment boundary invariant: content lengths are
    /// bounded by their totals and the totals sum to the candidate's key and
    /// value lengths. An empty list is always valid.
    pub fn is_valid(&self) -> bool {
        if self.inner_segment_boundary.is_empty() {
            return true;
        }
        let mut key_sum = 0;
        let mut value_sum = 0;
        for b in &self.inner_segment_boundary {
            if b.content_key_len > b.key_len || b.content_value_len > b.value_len {
                return false;
            }
            key_sum += b.key_len;
            value_sum += b.value_len;
        }
        key_sum == self.key.len() && value_sum == self.value.len()
    }

    /// Iterate inner segments as (key, value, content_key, content_value)
    /// string slices. Yields nothing when the boundary list is empty.
    pub fn inner_segments(&self) -> impl Iterator<Item = (&str, &str, &str, &str)> + '_ {
        let mut key_pos = 0;
        let mut value_pos = 0;
        self.inner_segment_boundary.iter().map(move |b| {
            let key = &self.key[key_pos..key_pos + b.key_len];
            let value = &self.value[value_pos..value_pos + b.value_len];
            let content_key = &key[..b.content_key_len];
            let content_value = &value[..b.content_value_len];
            key_pos += b.key_len;
            value_pos += b.value_len;
            (key, value, content_key, content_value)
        })
    }
}

/// One conversion unit: a reading plus (after conversion) its ranked
/// candidates.
#[derive(Debug, Clone, Default)]
pub struct Segment {
    key: String,
    segment_type: SegmentType,
    candidates: Vec<Candidate>,
}

impl Segment {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn set_key(&mut self, key: &str) {
        self.key = key.to_string();
    }

    pub fn segment_type(&self) -> SegmentType {
        self.segment_type
    }

    pub fn set_segment_type(&mut self, segment_type: SegmentType) {
        self.segment_type = segment_type;
    }

    pub fn candidates_size(&self) -> usize {
        self.candidates.len()
    }

    pub fn candidate(&self, i: usize) -> &Candidate {
        &self.candidates[i]
    }

    pub fn mut_candidate(&mut self, i: usize) -> &mut Candidate {
        &mut self.candidates[i]
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn add_candidate(&mut self, candidate: Candidate) {
        self.candidates.push(candidate);
    }

    pub fn clear_candidates(&mut self) {
        self.candidates.clear();
    }

    pub fn is_history(&self) -> bool {
        matches!(
            self.segment_type,
            SegmentType::History | SegmentType::Submitted
        )
    }
}

/// The in/out structure of a conversion call: request options that live on
/// the segment sequence, plus the ordered segments themselves. History
/// segments always form a prefix.
#[derive(Debug, Clone)]
pub struct Segments {
    request_type: RequestType,
    max_prediction_candidates_size: usize,
    segments: Vec<Segment>,
}

impl Default for Segments {
    fn default() -> Self {
        Self {
            request_type: RequestType::Conversion,
            max_prediction_candidates_size: 10,
            segments: Vec::new(),
        }
    }
}

impl Segments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_type(&self) -> RequestType {
        self.request_type
    }

    pub fn set_request_type(&mut self, request_type: RequestType) {
        self.request_type = request_type;
    }

    pub fn max_prediction_candidates_size(&self) -> usize {
        self.max_prediction_candidates_size
    }

    pub fn set_max_prediction_candidates_size(&mut self, size: usize) {
        self.max_prediction_candidates_size = size;
    }

    pub fn segments_size(&self) -> usize {
        self.segments.len()
    }

    pub fn segment(&self, i: usize) -> &Segment {
        &self.segments[i]
    }

    pub fn mut_segment(&mut self, i: usize) -> &mut Segment {
        &mut self.segments[i]
    }

    /// Append an empty segment and return it for initialization.
    pub fn add_segment(&mut self) -> &mut Segment {
        self.segments.push(Segment::default());
        self.segments.last_mut().unwrap()
    }

    /// Number of leading history/submitted segments.
    pub fn history_segments_size(&self) -> usize {
        self.segments
            .iter()
            .take_while(|s| s.is_history())
            .count()
    }

    pub fn conversion_segments_size(&self) -> usize {
        self.segments_size() - self.history_segments_size()
    }

    pub fn conversion_segment(&self, i: usize) -> &Segment {
        &self.segments[self.history_segments_size() + i]
    }

    pub fn mut_conversion_segment(&mut self, i: usize) -> &mut Segment {
        let offset = self.history_segments_size();
        &mut self.segments[offset + i]
    }

    /// Drop every history segment, keeping conversion segments in place.
    pub fn clear_history_segments(&mut self) {
        let n = self.history_segments_size();
        self.segments.drain(..n);
    }

    /// Concatenated reading of the history segments.
    pub fn history_key(&self) -> String {
        self.segments
            .iter()
            .take(self.history_segments_size())
            .map(|s| s.key())
            .collect()
    }

    /// Concatenated reading of the conversion segments.
    pub fn conversion_key(&self) -> String {
        self.segments
            .iter()
            .skip(self.history_segments_size())
            .map(|s| s.key())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(key: &str, value: &str) -> Candidate {
        Candidate {
            key: key.to_string(),
            value: value.to_string(),
            content_key: key.to_string(),
            content_value: value.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_history_and_conversion_counts() {
        let mut segments = Segments::new();
        let seg = segments.add_segment();
        seg.set_key("きょう");
        seg.set_segment_type(SegmentType::History);
        let seg = segments.add_segment();
        seg.set_key("は");

        assert_eq!(segments.segments_size(), 2);
        assert_eq!(segments.history_segments_size(), 1);
        assert_eq!(segments.conversion_segments_size(), 1);
        assert_eq!(segments.conversion_segment(0).key(), "は");
        assert_eq!(segments.history_key(), "きょう");
        assert_eq!(segments.conversion_key(), "は");
    }

    #[test]
    fn test_clear_history() {
        let mut segments = Segments::new();
        for key in ["a", "b"] {
            let seg = segments.add_segment();
            seg.set_key(key);
            seg.set_segment_type(SegmentType::History);
        }
        segments.add_segment().set_key("c");

        segments.clear_history_segments();
        assert_eq!(segments.history_segments_size(), 0);
        assert_eq!(segments.segments_size(), 1);
        assert_eq!(segments.segment(0).key(), "c");
    }

    #[test]
    fn test_inner_segment_boundary_valid() {
        let mut c = candidate("てすと", "test");
        assert!(c.is_valid());

        c.push_inner_segment_boundary(3, 2, 3, 2);
        c.push_inner_segment_boundary(6, 2, 6, 2);
        assert!(c.is_valid());

        // Sums no longer match after another push
        c.push_inner_segment_boundary(3, 1, 3, 1);
        assert!(!c.is_valid());
    }

    #[test]
    fn test_inner_segment_boundary_content_exceeds_total() {
        let mut c = candidate("てすと", "test");
        c.push_inner_segment_boundary(9, 4, 12, 4);
        assert!(!c.is_valid());
    }

    #[test]
    fn test_inner_segments_iterator() {
        let mut c = candidate("わたしの", "私の");
        c.push_inner_segment_boundary(12, 6, 9, 3);
        assert!(c.is_valid());

        let parts: Vec<_> = c.inner_segments().collect();
        assert_eq!(parts, vec![("わたしの", "私の", "わたし", "私")]);
    }

    #[test]
    fn test_prediction_like() {
        assert!(!RequestType::Conversion.is_prediction_like());
        assert!(RequestType::Prediction.is_prediction_like());
        assert!(RequestType::Suggestion.is_prediction_like());
        assert!(RequestType::PartialPrediction.is_prediction_like());
        assert!(RequestType::PartialSuggestion.is_prediction_like());
    }
}
