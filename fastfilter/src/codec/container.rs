//! Per-chunk storage of the low 16 bits of set members.
//!
//! Every container covers the 65536 values sharing one high 16-bit key and
//! stores its members in whichever representation the encoder found
//! smallest:
//!
//! | Store  | Layout                          | Membership      |
//! |--------|---------------------------------|-----------------|
//! | Array  | sorted `u16` values (≤ 4096)    | binary search   |
//! | Bitmap | 1024 × `u64` words              | bit test        |
//! | Run    | sorted `(start, length)` ranges | binary search   |

use bytes::BufMut;

/// Largest cardinality an array container may hold. Containers with more
/// members are bitmaps unless run encoded.
pub(crate) const ARRAY_MAX_CARDINALITY: usize = 4096;

/// Number of 64-bit words in a bitmap container.
pub(crate) const BITMAP_WORDS: usize = 1024;

/// Serialized size of a bitmap container body.
pub(crate) const BITMAP_BYTES: usize = BITMAP_WORDS * 8;

/// A contiguous range `start..=start + length` of container values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Run {
    pub start: u16,
    pub length: u16,
}

impl Run {
    /// Last value covered by the run.
    #[inline]
    pub fn end(&self) -> u32 {
        self.start as u32 + self.length as u32
    }

    #[inline]
    pub fn cardinality(&self) -> u32 {
        self.length as u32 + 1
    }
}

/// Members of one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Store {
    Array(Vec<u16>),
    Bitmap(Box<[u64; BITMAP_WORDS]>),
    Run(Vec<Run>),
}

impl Store {
    /// Builds the smallest store for a strictly increasing slice of values.
    pub fn from_sorted(values: &[u16]) -> Self {
        let runs = collect_runs(values);
        let run_bytes = 2 + 4 * runs.len();
        let plain_bytes = if values.len() <= ARRAY_MAX_CARDINALITY {
            2 * values.len()
        } else {
            BITMAP_BYTES
        };

        if run_bytes < plain_bytes {
            Store::Run(runs)
        } else if values.len() <= ARRAY_MAX_CARDINALITY {
            Store::Array(values.to_vec())
        } else {
            let mut words = Box::new([0u64; BITMAP_WORDS]);
            for &value in values {
                words[(value / 64) as usize] |= 1u64 << (value % 64);
            }
            Store::Bitmap(words)
        }
    }

    /// Returns whether `low` is a member of this container.
    #[inline]
    pub fn contains(&self, low: u16) -> bool {
        match self {
            Store::Array(values) => values.binary_search(&low).is_ok(),
            Store::Bitmap(words) => (words[(low / 64) as usize] >> (low % 64)) & 1 == 1,
            Store::Run(runs) => {
                // first run starting after `low`; its predecessor is the only candidate
                let idx = runs.partition_point(|run| run.start <= low);
                idx > 0 && low as u32 <= runs[idx - 1].end()
            }
        }
    }

    /// Number of members in this container (1..=65536).
    pub fn cardinality(&self) -> u32 {
        match self {
            Store::Array(values) => values.len() as u32,
            Store::Bitmap(words) => words.iter().map(|w| w.count_ones()).sum(),
            Store::Run(runs) => runs.iter().map(Run::cardinality).sum(),
        }
    }

    pub fn is_run(&self) -> bool {
        matches!(self, Store::Run(_))
    }

    /// Size in bytes of the serialized container body.
    pub fn serialized_size(&self) -> usize {
        match self {
            Store::Array(values) => 2 * values.len(),
            Store::Bitmap(_) => BITMAP_BYTES,
            Store::Run(runs) => 2 + 4 * runs.len(),
        }
    }

    /// Writes the container body in the portable format.
    pub fn write_to(&self, buf: &mut impl BufMut) {
        match self {
            Store::Array(values) => {
                for &value in values {
                    buf.put_u16_le(value);
                }
            }
            Store::Bitmap(words) => {
                for &word in words.iter() {
                    buf.put_u64_le(word);
                }
            }
            Store::Run(runs) => {
                buf.put_u16_le(runs.len() as u16);
                for run in runs {
                    buf.put_u16_le(run.start);
                    buf.put_u16_le(run.length);
                }
            }
        }
    }

    /// Iterates over the container members in increasing order.
    pub fn iter(&self) -> StoreIter<'_> {
        match self {
            Store::Array(values) => StoreIter::Array(values.iter()),
            Store::Bitmap(words) => StoreIter::Bitmap {
                words: &words[..],
                index: 0,
                current: words[0],
            },
            Store::Run(runs) => StoreIter::Run {
                runs: runs.iter(),
                next: 0,
                end: 0,
                open: false,
            },
        }
    }
}

/// Splits strictly increasing values into maximal runs.
fn collect_runs(values: &[u16]) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for &value in values {
        match runs.last_mut() {
            Some(run) if run.end() + 1 == value as u32 => run.length += 1,
            _ => runs.push(Run {
                start: value,
                length: 0,
            }),
        }
    }
    runs
}

pub(crate) enum StoreIter<'a> {
    Array(std::slice::Iter<'a, u16>),
    Bitmap {
        words: &'a [u64],
        index: usize,
        current: u64,
    },
    Run {
        runs: std::slice::Iter<'a, Run>,
        next: u32,
        end: u32,
        open: bool,
    },
}

impl Iterator for StoreIter<'_> {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        match self {
            StoreIter::Array(values) => values.next().copied(),
            StoreIter::Bitmap {
                words,
                index,
                current,
            } => loop {
                if *current != 0 {
                    let bit = current.trailing_zeros() as usize;
                    *current &= *current - 1;
                    return Some((*index * 64 + bit) as u16);
                }
                *index += 1;
                if *index >= words.len() {
                    return None;
                }
                *current = words[*index];
            },
            StoreIter::Run {
                runs,
                next,
                end,
                open,
            } => {
                if !*open || *next > *end {
                    let run = runs.next()?;
                    *next = run.start as u32;
                    *end = run.end();
                    *open = true;
                }
                let value = *next as u16;
                *next += 1;
                Some(value)
            }
        }
    }
}
