#![cfg(test)]

use crate::dict::{
    Connector, PosGroup, PosMatcher, SuggestionFilter, SuppressionDictionary, SystemDictionary,
    Token,
};
use crate::segmenter::Segmenter;

use super::ImmutableConverter;

/// Connection-id space of the mock data.
pub const NUM_IDS: u16 = 100;
/// Id of unknown-character fallback nodes.
pub const UNKNOWN_ID: u16 = 1;
/// Id of fused number nodes.
pub const NUMBER_ID: u16 = 2;
/// Functional-word id range.
pub const FUNCTIONAL_MIN: u16 = 90;
pub const FUNCTIONAL_MAX: u16 = 99;

/// Shared mock language data for converter tests.
///
/// Fields are public so a test can swap in a custom table before borrowing
/// a converter from `converter()`.
pub struct TestData {
    pub dictionary: SystemDictionary,
    pub suffix_dictionary: SystemDictionary,
    pub suppression_dictionary: SuppressionDictionary,
    pub connector: Connector,
    pub segmenter: Segmenter,
    pub pos_matcher: PosMatcher,
    pub pos_group: PosGroup,
    pub suggestion_filter: SuggestionFilter,
}

impl TestData {
    pub fn new() -> Self {
        let pos_matcher = PosMatcher::new(UNKNOWN_ID, NUMBER_ID, FUNCTIONAL_MIN, FUNCTIONAL_MAX);
        Self {
            dictionary: test_dictionary(),
            suffix_dictionary: test_suffix_dictionary(),
            suppression_dictionary: SuppressionDictionary::new(),
            connector: zero_connector(NUM_IDS),
            segmenter: Segmenter::all_allowed(NUM_IDS),
            pos_matcher,
            pos_group: PosGroup::from_matcher(&pos_matcher, NUM_IDS),
            suggestion_filter: SuggestionFilter::new(),
        }
    }

    pub fn converter(&self) -> ImmutableConverter<'_> {
        ImmutableConverter::new(
            &self.dictionary,
            &self.suffix_dictionary,
            &self.suppression_dictionary,
            &self.connector,
            &self.segmenter,
            self.pos_matcher,
            &self.pos_group,
            &self.suggestion_filter,
        )
    }
}

/// A zero-cost connection table: path choice is driven purely by word costs
/// and the decoder's own penalties.
pub fn zero_connector(num_ids: u16) -> Connector {
    let n = num_ids as usize;
    Connector::new_owned(num_ids, vec![0; n * n])
}

fn token(key: &str, value: &str, id: u16, wcost: i16) -> (String, Vec<Token>) {
    (key.to_string(), vec![Token::new(key, value, id, id, wcost)])
}

fn test_dictionary() -> SystemDictionary {
    let entries = vec![
        // Content words
        token("わたし", "私", 10, 2900),
        token("なまえ", "名前", 11, 3100),
        token("なかの", "中ノ", 12, 3400),
        (
            "きょう".to_string(),
            vec![
                Token::new("きょう", "今日", 13, 13, 2800),
                Token::new("きょう", "京", 14, 14, 4600),
            ],
        ),
        token("てんき", "天気", 15, 3600),
        token("いい", "良い", 16, 3200),
        token("しょうめい", "証明", 17, 2900),
        token("できる", "出来る", 18, 3300),
        token("めい", "明", 19, 3800),
        token("いか", "以下", 20, 2900),
        token("よろしく", "宜しく", 21, 3000),
        token("おねがい", "お願い", 22, 3000),
        token("しま", "島", 23, 3400),
        token("あ", "亜", 25, 3900),
        token("てん", "天", 27, 4800),
        token("き", "木", 28, 4200),
        token("い", "胃", 29, 5600),
        // Functional words
        token("の", "の", 90, 400),
        token("は", "は", 91, 450),
        token("です", "です", 92, 550),
    ];
    SystemDictionary::from_entries(entries)
}

fn test_suffix_dictionary() -> SystemDictionary {
    let entries = vec![
        token("します", "します", 94, 2400),
        token("ます", "ます", 94, 2400),
    ];
    SystemDictionary::from_entries(entries)
}
