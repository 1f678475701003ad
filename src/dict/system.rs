use std::collections::HashSet;
use std::fs::{self, File};
use std::path::Path;

use memmap2::Mmap;

use super::{DictError, Dictionary, LookupControl, Token, TokenCallback};

const MAGIC: &[u8; 4] = b"KODX";
const VERSION: u8 = 1;
const HEADER_SIZE: usize = 4 + 1 + 4; // magic + version + payload_len = 9

/// The system dictionary: an immutable reading → tokens store.
///
/// Keys are held sorted by their UTF-8 bytes, so exact lookup is a binary
/// search, prefix lookup is one probe per char boundary of the query, and
/// predictive lookup is a contiguous scan of the matching key range.
pub struct SystemDictionary {
    keys: Vec<String>,
    tokens: Vec<Vec<Token>>,
    values: HashSet<String>,
}

impl SystemDictionary {
    pub fn from_entries(entries: impl IntoIterator<Item = (String, Vec<Token>)>) -> Self {
        let mut pairs: Vec<(String, Vec<Token>)> = entries.into_iter().collect();
        for (_, tokens) in &mut pairs {
            tokens.sort_by_key(|t| t.wcost);
        }
        pairs.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

        let values = pairs
            .iter()
            .flat_map(|(_, tokens)| tokens.iter().map(|t| t.value.clone()))
            .collect();
        let (keys, tokens) = pairs.into_iter().unzip();

        Self {
            keys,
            tokens,
            values,
        }
    }

    /// Build directly from flat tokens, grouping by reading.
    pub fn from_tokens(tokens: impl IntoIterator<Item = Token>) -> Self {
        let mut grouped: std::collections::BTreeMap<String, Vec<Token>> =
            std::collections::BTreeMap::new();
        for token in tokens {
            grouped.entry(token.key.clone()).or_default().push(token);
        }
        Self::from_entries(grouped)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DictError> {
        let payload = bincode::serialize(&(&self.keys, &self.tokens)).map_err(DictError::Serialize)?;
        let payload_len = payload.len() as u32;

        let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
        buf.extend_from_slice(MAGIC);
        buf.push(VERSION);
        buf.extend_from_slice(&payload_len.to_le_bytes());
        buf.extend_from_slice(&payload);

        Ok(buf)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, DictError> {
        if data.len() < 5 {
            return Err(DictError::InvalidHeader);
        }
        if &data[..4] != MAGIC {
            return Err(DictError::InvalidMagic);
        }
        if data[4] != VERSION {
            return Err(DictError::UnsupportedVersion(data[4]));
        }
        if data.len() < HEADER_SIZE {
            return Err(DictError::InvalidHeader);
        }

        let payload_len = u32::from_le_bytes(data[5..9].try_into().unwrap()) as usize;
        if data.len() < HEADER_SIZE + payload_len {
            return Err(DictError::InvalidHeader);
        }

        let (keys, tokens): (Vec<String>, Vec<Vec<Token>>) =
            bincode::deserialize(&data[HEADER_SIZE..HEADER_SIZE + payload_len])
                .map_err(DictError::Deserialize)?;

        let values = tokens
            .iter()
            .flat_map(|ts| ts.iter().map(|t| t.value.clone()))
            .collect();
        Ok(Self {
            keys,
            tokens,
            values,
        })
    }

    /// Open a dictionary file, using mmap to avoid doubling peak memory.
    ///
    /// The entries are deserialized from the mapped region (avoiding a
    /// separate heap allocation for the raw file bytes), then the mapping is
    /// dropped.
    pub fn open(path: &Path) -> Result<Self, DictError> {
        let file = File::open(path)?;
        // SAFETY: The file is opened read-only and the mapping is immutable.
        // The Mmap is dropped after deserialization completes below.
        let mmap = unsafe { Mmap::map(&file)? };
        Self::from_bytes(&mmap)
    }

    pub fn save(&self, path: &Path) -> Result<(), DictError> {
        Ok(fs::write(path, self.to_bytes()?)?)
    }

    /// Returns (reading_count, token_count).
    pub fn stats(&self) -> (usize, usize) {
        let readings = self.keys.len();
        let tokens: usize = self.tokens.iter().map(|v| v.len()).sum();
        (readings, tokens)
    }

    fn exact_index(&self, key: &str) -> Option<usize> {
        self.keys
            .binary_search_by(|k| k.as_bytes().cmp(key.as_bytes()))
            .ok()
    }

    fn emit(&self, index: usize, callback: &mut dyn TokenCallback) -> LookupControl {
        for token in &self.tokens[index] {
            if callback.on_token(token) == LookupControl::Stop {
                return LookupControl::Stop;
            }
        }
        LookupControl::Continue
    }
}

impl Dictionary for SystemDictionary {
    fn lookup_prefix(&self, key: &str, callback: &mut dyn TokenCallback) {
        for (end, _) in key.char_indices().skip(1) {
            if let Some(index) = self.exact_index(&key[..end]) {
                if self.emit(index, callback) == LookupControl::Stop {
                    return;
                }
            }
        }
        if let Some(index) = self.exact_index(key) {
            self.emit(index, callback);
        }
    }

    fn lookup_predictive(&self, key: &str, callback: &mut dyn TokenCallback) {
        let start = self
            .keys
            .partition_point(|k| k.as_bytes() < key.as_bytes());
        for index in start..self.keys.len() {
            if !self.keys[index].as_bytes().starts_with(key.as_bytes()) {
                break;
            }
            if self.emit(index, callback) == LookupControl::Stop {
                return;
            }
        }
    }

    fn lookup_exact(&self, key: &str, callback: &mut dyn TokenCallback) {
        if let Some(index) = self.exact_index(key) {
            self.emit(index, callback);
        }
    }

    fn has_key(&self, key: &str) -> bool {
        self.exact_index(key).is_some()
    }

    fn has_value(&self, value: &str) -> bool {
        self.values.contains(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Readings around the は/はし/はな prefix cluster, deliberately handed
    /// over unsorted to exercise the construction path.
    fn bridge_dict() -> SystemDictionary {
        SystemDictionary::from_entries(vec![
            (
                "はなし".to_string(),
                vec![Token::new("はなし", "話", 36, 36, 2300)],
            ),
            (
                "はし".to_string(),
                vec![
                    Token::new("はし", "箸", 31, 31, 2400),
                    Token::new("はし", "橋", 30, 30, 2100),
                    Token::new("はし", "端", 32, 32, 3100),
                ],
            ),
            (
                "くも".to_string(),
                vec![
                    Token::new("くも", "雲", 38, 38, 2700),
                    Token::new("くも", "蜘蛛", 39, 39, 3300),
                ],
            ),
            (
                "はしる".to_string(),
                vec![Token::new("はしる", "走る", 33, 33, 2600)],
            ),
            (
                "はな".to_string(),
                vec![
                    Token::new("はな", "花", 34, 34, 2200),
                    Token::new("はな", "鼻", 35, 35, 2500),
                ],
            ),
            ("は".to_string(), vec![Token::new("は", "歯", 37, 37, 2900)]),
        ])
    }

    fn exact_surfaces(dict: &SystemDictionary, key: &str) -> Vec<String> {
        let mut surfaces = Vec::new();
        dict.lookup_exact(key, &mut |t: &Token| {
            surfaces.push(t.value.clone());
            LookupControl::Continue
        });
        surfaces
    }

    fn prefix_hits(dict: &SystemDictionary, key: &str) -> Vec<(String, String)> {
        let mut hits = Vec::new();
        dict.lookup_prefix(key, &mut |t: &Token| {
            hits.push((t.key.clone(), t.value.clone()));
            LookupControl::Continue
        });
        hits
    }

    #[test]
    fn exact_match_hits_and_misses() {
        let dict = bridge_dict();
        // Construction sorts homophones by cost: 橋(2100) < 箸(2400) < 端(3100)
        assert_eq!(exact_surfaces(&dict, "はし"), ["橋", "箸", "端"]);
        assert!(exact_surfaces(&dict, "かわ").is_empty());
        assert!(dict.has_key("はしる"));
        assert!(!dict.has_key("はしご"));
    }

    #[test]
    fn prefix_walk_visits_every_covering_reading() {
        let dict = bridge_dict();
        let hits = prefix_hits(&dict, "はなしか");
        // は, はな and はなし all prefix the query; はし must not appear.
        assert_eq!(hits.len(), 4);
        assert!(hits.contains(&("は".into(), "歯".into())));
        assert!(hits.contains(&("はな".into(), "花".into())));
        assert!(hits.contains(&("はな".into(), "鼻".into())));
        assert!(hits.contains(&("はなし".into(), "話".into())));
        assert!(hits.iter().all(|(k, _)| k != "はし"));
    }

    #[test]
    fn prefix_walk_stops_on_request() {
        let dict = bridge_dict();
        let mut seen = 0;
        dict.lookup_prefix("はなし", &mut |_: &Token| {
            seen += 1;
            LookupControl::Stop
        });
        assert_eq!(seen, 1, "Stop must end the walk at the first hit");
    }

    #[test]
    fn predictive_scans_key_range() {
        let dict = bridge_dict();
        let mut readings = Vec::new();
        dict.lookup_predictive("はし", &mut |t: &Token| {
            readings.push(t.key.clone());
            LookupControl::Continue
        });
        // はし itself (3 tokens) plus はしる; はな is outside the range.
        assert_eq!(readings.len(), 4);
        assert!(readings.iter().any(|k| k == "はしる"));
        assert!(readings.iter().all(|k| k.starts_with("はし")));

        let mut none = 0;
        dict.lookup_predictive("そら", &mut |_: &Token| {
            none += 1;
            LookupControl::Continue
        });
        assert_eq!(none, 0);
    }

    #[test]
    fn has_value_covers_all_tokens() {
        let dict = bridge_dict();
        assert!(dict.has_value("蜘蛛"));
        assert!(dict.has_value("走る"));
        assert!(!dict.has_value("馬"));
    }

    #[test]
    fn from_tokens_groups_by_reading() {
        let dict = SystemDictionary::from_tokens(vec![
            Token::new("はし", "箸", 31, 31, 2400),
            Token::new("はし", "橋", 30, 30, 2100),
        ]);
        assert_eq!(exact_surfaces(&dict, "はし"), ["橋", "箸"]);
        assert_eq!(dict.stats(), (1, 2));
    }

    #[test]
    fn blob_roundtrip_preserves_lookups() {
        let dict = bridge_dict();
        let reloaded = SystemDictionary::from_bytes(&dict.to_bytes().unwrap()).unwrap();

        assert_eq!(dict.stats(), reloaded.stats());
        assert_eq!(dict.stats(), (6, 10));
        assert_eq!(
            prefix_hits(&dict, "はなしか"),
            prefix_hits(&reloaded, "はなしか")
        );
        assert!(reloaded.has_value("蜘蛛"));
    }

    #[test]
    fn blob_rejects_bad_input() {
        // Foreign magic
        assert!(matches!(
            SystemDictionary::from_bytes(b"ABCD\x01rest"),
            Err(DictError::InvalidMagic)
        ));
        // Shorter than the magic itself
        assert!(matches!(
            SystemDictionary::from_bytes(b"KO"),
            Err(DictError::InvalidHeader)
        ));
        // Version from the future
        assert!(matches!(
            SystemDictionary::from_bytes(b"KODX\x07"),
            Err(DictError::UnsupportedVersion(7))
        ));
        // Payload cut short
        let mut bytes = bridge_dict().to_bytes().unwrap();
        bytes.truncate(bytes.len() - 1);
        assert!(matches!(
            SystemDictionary::from_bytes(&bytes),
            Err(DictError::InvalidHeader)
        ));
    }
}
