/// Per-call conversion options supplied by the session layer.
///
/// Everything here defaults to the plain conversion behavior; the session
/// opts in to extras per input field.
#[derive(Debug, Clone, Default)]
pub struct ConversionRequest {
    /// Also emit candidates consuming only a prefix of the reading,
    /// flagged `Candidate::PARTIALLY_KEY_CONSUMED`.
    pub create_partial_candidates: bool,
}

impl ConversionRequest {
    pub fn new() -> Self {
        Self::default()
    }
}
