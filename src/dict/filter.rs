use std::collections::HashSet;

/// Blacklist of readings and surfaces that must never be emitted as
/// candidates. Entries with both a key and a value match as a pair; entries
/// with only one side match any candidate sharing that side.
#[derive(Default)]
pub struct SuppressionDictionary {
    keys: HashSet<String>,
    values: HashSet<String>,
    pairs: HashSet<(String, String)>,
}

impl SuppressionDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&mut self, key: &str, value: &str) {
        match (key.is_empty(), value.is_empty()) {
            (false, false) => {
                self.pairs.insert((key.to_string(), value.to_string()));
            }
            (false, true) => {
                self.keys.insert(key.to_string());
            }
            (true, false) => {
                self.values.insert(value.to_string());
            }
            (true, true) => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.values.is_empty() && self.pairs.is_empty()
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn has_value(&self, value: &str) -> bool {
        self.values.contains(value)
    }

    pub fn suppresses(&self, key: &str, value: &str) -> bool {
        self.keys.contains(key)
            || self.values.contains(value)
            || self
                .pairs
                .contains(&(key.to_string(), value.to_string()))
    }
}

/// Surfaces that are valid conversions but bad suggestions (vulgar words,
/// unstable spellings). Checked only for prediction/suggestion requests.
#[derive(Default)]
pub struct SuggestionFilter {
    bad_values: HashSet<String>,
}

impl SuggestionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: impl IntoIterator<Item = String>) -> Self {
        Self {
            bad_values: values.into_iter().collect(),
        }
    }

    pub fn is_bad_suggestion(&self, value: &str) -> bool {
        self.bad_values.contains(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suppression_pair() {
        let mut d = SuppressionDictionary::new();
        d.add_entry("きょう", "今日");
        assert!(d.suppresses("きょう", "今日"));
        assert!(!d.suppresses("きょう", "京"));
        assert!(!d.suppresses("は", "は"));
    }

    #[test]
    fn test_suppression_key_only() {
        let mut d = SuppressionDictionary::new();
        d.add_entry("ばか", "");
        assert!(d.suppresses("ばか", "馬鹿"));
        assert!(d.suppresses("ばか", "バカ"));
        assert!(d.has_key("ばか"));
        assert!(!d.has_value("馬鹿"));
    }

    #[test]
    fn test_suppression_value_only() {
        let mut d = SuppressionDictionary::new();
        d.add_entry("", "馬鹿");
        assert!(d.suppresses("ばか", "馬鹿"));
        assert!(d.suppresses("うま", "馬鹿"));
        assert!(!d.suppresses("ばか", "バカ"));
    }

    #[test]
    fn test_empty() {
        let d = SuppressionDictionary::new();
        assert!(d.is_empty());
        assert!(!d.suppresses("あ", "亜"));
    }

    #[test]
    fn test_suggestion_filter() {
        let f = SuggestionFilter::from_values(vec!["下品".to_string()]);
        assert!(f.is_bad_suggestion("下品"));
        assert!(!f.is_bad_suggestion("上品"));
        assert!(!SuggestionFilter::new().is_bad_suggestion("下品"));
    }
}
