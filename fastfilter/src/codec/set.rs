//! Decoded, queryable form of a compressed integer set.
//!
//! # Wire Format
//!
//! The Roaring portable serialization, all integers little-endian:
//!
//! ```text
//! | cookie (u32) | [size (u32)] | [run flags] | n × (key u16, card-1 u16) | [n × offset u32] | bodies |
//! ```
//!
//! - cookie `12346`: no run containers; `size` follows the cookie.
//! - cookie low 16 bits `12347`: `size = (cookie >> 16) + 1`, followed by a
//!   run flag bitset of `ceil(size / 8)` bytes.
//! - offsets are present when there are no run containers or `size >= 4`.
//! - bodies: run containers hold a `u16` run count and `(start, length - 1)`
//!   pairs; other containers are arrays when `card <= 4096`, else 8 KiB
//!   bitmaps.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::container::{
    ARRAY_MAX_CARDINALITY, BITMAP_BYTES, BITMAP_WORDS, Run, Store, StoreIter,
};
use crate::error::{Error, Result};

/// Cookie of a serialization holding at least one run container.
pub const SERIAL_COOKIE: u16 = 12347;

/// Cookie of a serialization without run containers.
pub const SERIAL_COOKIE_NO_RUNCONTAINER: u32 = 12346;

/// Below this many containers, a run-cookie serialization omits offsets.
const NO_OFFSET_THRESHOLD: usize = 4;

/// Maximum number of containers in a 32-bit set.
const MAX_CONTAINERS: usize = 1 << 16;

/// One container with its high 16-bit key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Container {
    pub key: u16,
    pub store: Store,
}

/// A compressed set of `u32` values supporting membership queries.
///
/// Containers are kept in their compressed form and sorted by key, so a
/// lookup is a binary search on the key followed by a container-specific
/// test. Run containers are never expanded.
///
/// The set is immutable once built and is shared across threads by the
/// filter factory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedSet {
    containers: Vec<Container>,
}

impl DecodedSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from arbitrary values. Duplicates are ignored.
    pub fn from_values(values: impl IntoIterator<Item = u32>) -> Self {
        let mut values: Vec<u32> = values.into_iter().collect();
        values.sort_unstable();
        values.dedup();

        let mut containers = Vec::new();
        let mut lows: Vec<u16> = Vec::new();
        let mut current_key: Option<u16> = None;
        for value in values {
            let key = (value >> 16) as u16;
            if current_key != Some(key) {
                if let Some(prev) = current_key {
                    containers.push(Container {
                        key: prev,
                        store: Store::from_sorted(&lows),
                    });
                    lows.clear();
                }
                current_key = Some(key);
            }
            lows.push(value as u16);
        }
        if let Some(key) = current_key {
            containers.push(Container {
                key,
                store: Store::from_sorted(&lows),
            });
        }

        Self { containers }
    }

    /// Returns whether `value` is a member of the set.
    #[inline]
    pub fn contains(&self, value: u32) -> bool {
        let key = (value >> 16) as u16;
        match self.containers.binary_search_by_key(&key, |c| c.key) {
            Ok(idx) => self.containers[idx].store.contains(value as u16),
            Err(_) => false,
        }
    }

    /// Returns the number of members.
    pub fn len(&self) -> u64 {
        self.containers
            .iter()
            .map(|c| c.store.cardinality() as u64)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Returns the number of containers (distinct high 16-bit keys).
    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    /// Returns the number of run-encoded containers.
    pub fn run_container_count(&self) -> usize {
        self.containers.iter().filter(|c| c.store.is_run()).count()
    }

    /// Iterates over the members in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.containers.iter().flat_map(|c| {
            let high = (c.key as u32) << 16;
            let lows: StoreIter<'_> = c.store.iter();
            lows.map(move |low| high | low as u32)
        })
    }

    /// Serializes the set in the portable format.
    pub fn serialize(&self) -> Bytes {
        let size = self.containers.len();
        let has_run = self.containers.iter().any(|c| c.store.is_run());

        let mut buf = BytesMut::new();
        let mut header_len;
        if has_run {
            buf.put_u32_le(SERIAL_COOKIE as u32 | (((size - 1) as u32) << 16));
            let mut flags = vec![0u8; size.div_ceil(8)];
            for (i, c) in self.containers.iter().enumerate() {
                if c.store.is_run() {
                    flags[i / 8] |= 1 << (i % 8);
                }
            }
            buf.put_slice(&flags);
            header_len = 4 + flags.len();
        } else {
            buf.put_u32_le(SERIAL_COOKIE_NO_RUNCONTAINER);
            buf.put_u32_le(size as u32);
            header_len = 8;
        }

        for c in &self.containers {
            buf.put_u16_le(c.key);
            buf.put_u16_le((c.store.cardinality() - 1) as u16);
        }
        header_len += 4 * size;

        if !has_run || size >= NO_OFFSET_THRESHOLD {
            let mut offset = header_len + 4 * size;
            for c in &self.containers {
                buf.put_u32_le(offset as u32);
                offset += c.store.serialized_size();
            }
        }

        for c in &self.containers {
            c.store.write_to(&mut buf);
        }

        buf.freeze()
    }

    /// Deserializes a set from the portable format.
    ///
    /// Bytes following the last container are ignored.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        let mut buf = data;

        let cookie = read_u32(&mut buf, "cookie")?;
        let (size, run_flags) = if cookie & 0xFFFF == SERIAL_COOKIE as u32 {
            let size = (cookie >> 16) as usize + 1;
            let flags = read_bytes(&mut buf, size.div_ceil(8), "run flags")?;
            (size, Some(flags))
        } else if cookie == SERIAL_COOKIE_NO_RUNCONTAINER {
            let size = read_u32(&mut buf, "container count")? as usize;
            if size > MAX_CONTAINERS {
                return Err(malformed(format!(
                    "container count {} exceeds {}",
                    size, MAX_CONTAINERS
                )));
            }
            (size, None)
        } else {
            return Err(malformed(format!("unknown cookie 0x{:08x}", cookie)));
        };

        let is_run =
            |i: usize| run_flags.is_some_and(|flags| flags[i / 8] & (1 << (i % 8)) != 0);

        let mut headers: Vec<(u16, usize)> = Vec::with_capacity(size);
        for i in 0..size {
            let key = read_u16(&mut buf, "container key")?;
            let cardinality = read_u16(&mut buf, "container cardinality")? as usize + 1;
            if let Some(&(prev, _)) = headers.last() {
                if key <= prev {
                    return Err(malformed(format!(
                        "container {} key {} does not follow key {}",
                        i, key, prev
                    )));
                }
            }
            headers.push((key, cardinality));
        }

        let offsets = if run_flags.is_none() || size >= NO_OFFSET_THRESHOLD {
            let mut offsets = Vec::with_capacity(size);
            for _ in 0..size {
                offsets.push(read_u32(&mut buf, "container offset")? as usize);
            }
            Some(offsets)
        } else {
            None
        };

        let mut containers = Vec::with_capacity(size);
        for (i, &(key, cardinality)) in headers.iter().enumerate() {
            let position = data.len() - buf.len();
            if let Some(offsets) = &offsets {
                if offsets[i] != position {
                    return Err(malformed(format!(
                        "container {} offset {} does not match position {}",
                        i, offsets[i], position
                    )));
                }
            }

            let store = if is_run(i) {
                read_run_store(&mut buf, key, cardinality)?
            } else if cardinality <= ARRAY_MAX_CARDINALITY {
                read_array_store(&mut buf, key, cardinality)?
            } else {
                read_bitmap_store(&mut buf, key, cardinality)?
            };
            containers.push(Container { key, store });
        }

        if buf.has_remaining() {
            tracing::debug!(
                trailing = buf.remaining(),
                "ignoring trailing bytes after last container"
            );
        }

        Ok(Self { containers })
    }
}

impl FromIterator<u32> for DecodedSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self::from_values(iter)
    }
}

fn read_run_store(buf: &mut &[u8], key: u16, cardinality: usize) -> Result<Store> {
    let count = read_u16(buf, "run count")? as usize;
    let mut runs: Vec<Run> = Vec::with_capacity(count);
    let mut total = 0usize;
    let mut last_end: Option<u32> = None;
    for _ in 0..count {
        let run = Run {
            start: read_u16(buf, "run start")?,
            length: read_u16(buf, "run length")?,
        };
        if run.end() > u16::MAX as u32 {
            return Err(malformed(format!(
                "container {} run at {} overflows the container",
                key, run.start
            )));
        }
        if let Some(end) = last_end {
            if run.start as u32 <= end {
                return Err(malformed(format!(
                    "container {} runs overlap or are unsorted at {}",
                    key, run.start
                )));
            }
        }
        last_end = Some(run.end());
        total += run.cardinality() as usize;
        runs.push(run);
    }
    if total != cardinality {
        return Err(malformed(format!(
            "container {} runs cover {} values, header says {}",
            key, total, cardinality
        )));
    }
    Ok(Store::Run(runs))
}

fn read_array_store(buf: &mut &[u8], key: u16, cardinality: usize) -> Result<Store> {
    ensure_remaining(buf, 2 * cardinality, "array container")?;
    let mut values: Vec<u16> = Vec::with_capacity(cardinality);
    for _ in 0..cardinality {
        let value = buf.get_u16_le();
        if values.last().is_some_and(|&prev| value <= prev) {
            return Err(malformed(format!(
                "container {} array is not strictly increasing at {}",
                key, value
            )));
        }
        values.push(value);
    }
    Ok(Store::Array(values))
}

fn read_bitmap_store(buf: &mut &[u8], key: u16, cardinality: usize) -> Result<Store> {
    ensure_remaining(buf, BITMAP_BYTES, "bitmap container")?;
    let mut words = Box::new([0u64; BITMAP_WORDS]);
    for word in words.iter_mut() {
        *word = buf.get_u64_le();
    }
    let store = Store::Bitmap(words);
    let actual = store.cardinality() as usize;
    if actual != cardinality {
        return Err(malformed(format!(
            "container {} bitmap holds {} values, header says {}",
            key, actual, cardinality
        )));
    }
    Ok(store)
}

fn malformed(message: String) -> Error {
    Error::MalformedEncoding(message)
}

fn ensure_remaining(buf: &&[u8], needed: usize, what: &str) -> Result<()> {
    if buf.remaining() < needed {
        return Err(malformed(format!(
            "truncated {}: need {} bytes, have {}",
            what,
            needed,
            buf.remaining()
        )));
    }
    Ok(())
}

fn read_u16(buf: &mut &[u8], what: &str) -> Result<u16> {
    ensure_remaining(buf, 2, what)?;
    Ok(buf.get_u16_le())
}

fn read_u32(buf: &mut &[u8], what: &str) -> Result<u32> {
    ensure_remaining(buf, 4, what)?;
    Ok(buf.get_u32_le())
}

fn read_bytes<'a>(buf: &mut &'a [u8], len: usize, what: &str) -> Result<&'a [u8]> {
    ensure_remaining(buf, len, what)?;
    let (head, tail) = buf.split_at(len);
    *buf = tail;
    Ok(head)
}
