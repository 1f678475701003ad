use std::fs::{self, File};
use std::path::Path;

use memmap2::Mmap;

use super::DictError;

const MAGIC: &[u8; 4] = b"KOCX";
const VERSION: u8 = 1;
const HEADER_SIZE: usize = 4 + 1 + 2; // magic + version + num_ids = 7

/// Sentinel cost marking a forbidden transition. Any stored cost at or above
/// this value must be treated as +∞ and never enter cost arithmetic.
pub const INVALID_COST: i16 = 30000;

/// Backing storage for cost data: either owned or memory-mapped.
enum CostStorage {
    Owned(Vec<i16>),
    Mapped(Mmap),
}

/// The connection-cost table: bigram transition costs between the right
/// connection id of the left word and the left connection id of the right
/// word. Lookup is O(1) into a dense row-major array.
pub struct Connector {
    num_ids: u16,
    storage: CostStorage,
}

impl Connector {
    pub fn new_owned(num_ids: u16, costs: Vec<i16>) -> Self {
        debug_assert_eq!(costs.len(), num_ids as usize * num_ids as usize);
        Self {
            num_ids,
            storage: CostStorage::Owned(costs),
        }
    }

    /// Look up the transition cost between two connection classes.
    /// Index: rid * num_ids + lid. Out-of-bounds returns 0.
    pub fn transition_cost(&self, rid: u16, lid: u16) -> i16 {
        let idx = (rid as usize)
            .saturating_mul(self.num_ids as usize)
            .saturating_add(lid as usize);
        match &self.storage {
            CostStorage::Owned(costs) => {
                debug_assert!(
                    idx < costs.len(),
                    "connection table OOB: rid={rid}, lid={lid}, num_ids={}",
                    self.num_ids
                );
                costs.get(idx).copied().unwrap_or(0)
            }
            CostStorage::Mapped(mmap) => {
                let byte_offset = HEADER_SIZE + idx * 2;
                debug_assert!(
                    byte_offset + 2 <= mmap.len(),
                    "connection table mmap OOB: rid={rid}, lid={lid}, num_ids={}",
                    self.num_ids
                );
                mmap.get(byte_offset..byte_offset + 2)
                    .map(|b| i16::from_le_bytes([b[0], b[1]]))
                    .unwrap_or(0)
            }
        }
    }

    /// Whether a stored cost marks a forbidden transition.
    pub fn is_forbidden(cost: i16) -> bool {
        cost >= INVALID_COST
    }

    /// Number of connection ids in this table.
    pub fn num_ids(&self) -> u16 {
        self.num_ids
    }

    /// Parse a connection table from its text form.
    ///
    /// The size line gives the id count, either `N` or `N N`. The body is
    /// either the dense grid (one cost per line, row-major by rid) or sparse
    /// triplets (`rid lid cost`, unlisted pairs cost 0); the field count of
    /// the first body line decides which.
    pub fn from_text(text: &str) -> Result<Self, DictError> {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

        let size_line = lines
            .next()
            .ok_or_else(|| DictError::Parse("missing size line".to_string()))?;
        let dims: Vec<u16> = size_line
            .split_whitespace()
            .map(|field| {
                field
                    .parse::<u16>()
                    .map_err(|_| DictError::Parse(format!("bad size line {size_line:?}")))
            })
            .collect::<Result<_, _>>()?;
        let num_ids = match dims[..] {
            [n] => n,
            [rows, cols] if rows == cols => rows,
            [rows, cols] => {
                return Err(DictError::Parse(format!(
                    "table must be square, got {rows}x{cols}"
                )));
            }
            _ => return Err(DictError::Parse(format!("bad size line {size_line:?}"))),
        };
        let slots = num_ids as usize * num_ids as usize;

        let body: Vec<&str> = lines.collect();
        let sparse = body
            .first()
            .is_some_and(|line| line.split_whitespace().count() == 3);

        let costs = if sparse {
            let mut grid = vec![0i16; slots];
            for line in body {
                let mut fields = line.split_whitespace();
                let (Some(r), Some(l), Some(c), None) =
                    (fields.next(), fields.next(), fields.next(), fields.next())
                else {
                    return Err(DictError::Parse(format!("bad triplet {line:?}")));
                };
                let triplet_err = || DictError::Parse(format!("bad triplet {line:?}"));
                let rid: usize = r.parse().map_err(|_| triplet_err())?;
                let lid: usize = l.parse().map_err(|_| triplet_err())?;
                let cost: i16 = c.parse().map_err(|_| triplet_err())?;
                if rid >= num_ids as usize || lid >= num_ids as usize {
                    return Err(DictError::Parse(format!(
                        "pair ({rid}, {lid}) outside {num_ids}-id table"
                    )));
                }
                grid[rid * num_ids as usize + lid] = cost;
            }
            grid
        } else {
            if body.len() != slots {
                return Err(DictError::Parse(format!(
                    "dense table has {} costs, want {slots}",
                    body.len()
                )));
            }
            body.iter()
                .map(|line| {
                    line.parse::<i16>()
                        .map_err(|_| DictError::Parse(format!("bad cost {line:?}")))
                })
                .collect::<Result<_, _>>()?
        };

        Ok(Self::new_owned(num_ids, costs))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DictError> {
        let n = self.num_ids as usize * self.num_ids as usize;
        let mut buf = Vec::with_capacity(HEADER_SIZE + n * 2);
        buf.extend_from_slice(MAGIC);
        buf.push(VERSION);
        buf.extend_from_slice(&self.num_ids.to_le_bytes());
        for rid in 0..self.num_ids {
            for lid in 0..self.num_ids {
                buf.extend_from_slice(&self.transition_cost(rid, lid).to_le_bytes());
            }
        }
        Ok(buf)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, DictError> {
        let num_ids = Self::validate_header(data)?;
        let n = num_ids as usize * num_ids as usize;
        let costs = data[HEADER_SIZE..HEADER_SIZE + n * 2]
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        Ok(Self::new_owned(num_ids, costs))
    }

    /// Open a connection file as a memory-mapped table. Costs are read
    /// directly from the mapping; nothing is copied to the heap.
    pub fn open(path: &Path) -> Result<Self, DictError> {
        let file = File::open(path)?;
        // SAFETY: The file is opened read-only and the mapping is immutable
        // for the lifetime of the Connector.
        let mmap = unsafe { Mmap::map(&file)? };
        let num_ids = Self::validate_header(&mmap)?;
        Ok(Self {
            num_ids,
            storage: CostStorage::Mapped(mmap),
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), DictError> {
        Ok(fs::write(path, self.to_bytes()?)?)
    }

    fn validate_header(data: &[u8]) -> Result<u16, DictError> {
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
        let num_ids = u16::from_le_bytes(data[5..7].try_into().unwrap());
        let expected = HEADER_SIZE + num_ids as usize * num_ids as usize * 2;
        if data.len() < expected {
            return Err(DictError::InvalidHeader);
        }
        Ok(num_ids)
    }
}
