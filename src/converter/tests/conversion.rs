use crate::converter::testutil::TestData;
use crate::converter::ConvertError;
use crate::dict::{SystemDictionary, Token};
use crate::segments::{RequestType, Segments};

fn conversion_segments(key: &str) -> Segments {
    let mut segments = Segments::new();
    segments.set_request_type(RequestType::Conversion);
    segments.add_segment().set_key(key);
    segments
}

#[test]
fn test_basic_conversion() {
    let data = TestData::new();
    let converter = data.converter();
    let mut segments = conversion_segments("きょうはいいてんき");
    converter.convert(&mut segments).unwrap();

    assert_eq!(segments.segments_size(), 1);
    let segment = segments.segment(0);
    assert!(segment.candidates_size() > 0);
    assert_eq!(segment.candidate(0).value, "今日は良い天気");
    assert_eq!(segment.candidate(0).key, "きょうはいいてんき");
}

#[test]
fn test_no_inner_segment_boundary_for_conversion() {
    let data = TestData::new();
    let converter = data.converter();
    let mut segments = conversion_segments("わたしのなまえはなかのです");
    converter.convert(&mut segments).unwrap();

    assert!(segments.segments_size() >= 1);
    let segment = segments.segment(0);
    assert!(segment.candidates_size() > 0);
    for candidate in segment.candidates() {
        assert!(
            candidate.inner_segment_boundary.is_empty(),
            "conversion candidate {:?} must carry no inner boundary",
            candidate.value
        );
    }
}

#[test]
fn test_segment_count_preserved() {
    let data = TestData::new();
    let converter = data.converter();
    let mut segments = Segments::new();
    segments.add_segment().set_key("きょうは");
    segments.add_segment().set_key("いいてんき");
    converter.convert(&mut segments).unwrap();

    assert_eq!(segments.segments_size(), 2);
    assert_eq!(segments.segment(0).key(), "きょうは");
    assert_eq!(segments.segment(1).key(), "いいてんき");
    assert_eq!(segments.segment(0).candidate(0).value, "今日は");
    assert_eq!(segments.segment(1).candidate(0).value, "良い天気");
}

#[test]
fn test_content_excludes_trailing_functional() {
    let data = TestData::new();
    let converter = data.converter();
    let mut segments = conversion_segments("わたしの");
    converter.convert(&mut segments).unwrap();

    let top = segments.segment(0).candidate(0);
    assert_eq!(top.value, "私の");
    assert_eq!(top.content_key, "わたし");
    assert_eq!(top.content_value, "私");
}

#[test]
fn test_alternative_candidates() {
    let data = TestData::new();
    let converter = data.converter();
    let mut segments = conversion_segments("きょう");
    converter.convert(&mut segments).unwrap();

    let values: Vec<&str> = segments
        .segment(0)
        .candidates()
        .iter()
        .map(|c| c.value.as_str())
        .collect();
    assert_eq!(values[0], "今日");
    assert!(values.contains(&"京"));
}

#[test]
fn test_candidates_deduplicated() {
    let data = TestData::new();
    let converter = data.converter();
    let mut segments = conversion_segments("きょうは");
    converter.convert(&mut segments).unwrap();

    let values: Vec<&str> = segments
        .segment(0)
        .candidates()
        .iter()
        .map(|c| c.value.as_str())
        .collect();
    let unique: std::collections::HashSet<&&str> = values.iter().collect();
    assert_eq!(values.len(), unique.len());
}

#[test]
fn test_empty_dictionary_falls_back_to_reading() {
    let mut data = TestData::new();
    let empty: Vec<(String, Vec<Token>)> = Vec::new();
    data.dictionary = SystemDictionary::from_entries(empty.clone());
    data.suffix_dictionary = SystemDictionary::from_entries(empty);
    let converter = data.converter();

    let mut segments = conversion_segments("てすと");
    converter.convert(&mut segments).unwrap();

    let segment = segments.segment(0);
    assert!(segment.candidates_size() > 0);
    assert_eq!(segment.candidate(0).value, "てすと");
}

#[test]
fn test_number_conversion() {
    let data = TestData::new();
    let converter = data.converter();
    let mut segments = conversion_segments("にじゅうさん");
    converter.convert(&mut segments).unwrap();

    let values: Vec<&str> = segments
        .segment(0)
        .candidates()
        .iter()
        .map(|c| c.value.as_str())
        .collect();
    assert!(values.contains(&"23"), "missing 23 in {values:?}");
}

#[test]
fn test_fullwidth_digits_fused() {
    let data = TestData::new();
    let converter = data.converter();
    let mut segments = conversion_segments("１２３");
    converter.convert(&mut segments).unwrap();

    assert_eq!(segments.segment(0).candidate(0).value, "123");
}

#[test]
fn test_suppression_filters_candidates() {
    let mut data = TestData::new();
    data.suppression_dictionary.add_entry("きょう", "京");
    let converter = data.converter();

    let mut segments = conversion_segments("きょう");
    converter.convert(&mut segments).unwrap();

    let values: Vec<&str> = segments
        .segment(0)
        .candidates()
        .iter()
        .map(|c| c.value.as_str())
        .collect();
    assert!(values.contains(&"今日"));
    assert!(!values.contains(&"京"), "suppressed value leaked: {values:?}");
}

#[test]
fn test_no_conversion_segment_is_an_error() {
    let data = TestData::new();
    let converter = data.converter();

    let mut segments = Segments::new();
    assert_eq!(
        converter.convert(&mut segments),
        Err(ConvertError::NoConversionSegment)
    );

    // History alone is not convertible either.
    let mut segments = Segments::new();
    let segment = segments.add_segment();
    segment.set_key("きょう");
    segment.set_segment_type(crate::segments::SegmentType::History);
    assert_eq!(
        converter.convert(&mut segments),
        Err(ConvertError::NoConversionSegment)
    );
    assert_eq!(segments.segments_size(), 1, "segments must be untouched");
}

#[test]
fn test_empty_key_is_an_error() {
    let data = TestData::new();
    let converter = data.converter();
    let mut segments = Segments::new();
    segments.add_segment();
    assert_eq!(converter.convert(&mut segments), Err(ConvertError::EmptyKey));
    assert_eq!(segments.segment(0).candidates_size(), 0);
}

#[test]
fn test_conversion_is_deterministic() {
    let data = TestData::new();
    let converter = data.converter();
    let mut first = conversion_segments("きょうはいいてんき");
    converter.convert(&mut first).unwrap();
    for _ in 0..5 {
        let mut again = conversion_segments("きょうはいいてんき");
        converter.convert(&mut again).unwrap();
        assert_eq!(
            first.segment(0).candidate(0).value,
            again.segment(0).candidate(0).value
        );
    }
}
