use std::cmp::{min, Ordering};
use std::fmt::{self, Debug, Formatter};
use std::ops::RangeBounds;

use crate::error::{Error, Result};
use crate::utils::{normalize_index, range_to_endpoints, slice_bounds, slice_indices};

/// Byte written into unused gap positions. Purely a debugging aid; it is
/// never reachable through the public interface.
const GAP_FILL: u8 = 0xff;

/// Granularity by which the gap is regrown once exhausted.
const GAP_BLOCK: usize = 4 << 10;

/// A mutable byte sequence stored as a prefix, a movable run of spare
/// capacity (the gap), and a suffix. Insertions and deletions at or near
/// the gap are O(1); edits elsewhere first move the gap, which costs a
/// single overlapping copy. That makes the buffer cheap for the clustered
/// edit patterns of a text editor.
///
/// Indices follow extended-slice conventions throughout: negative values
/// count back from the end, range bounds clamp, and only single-element
/// access can fail.
#[derive(Clone)]
pub struct GapBuffer {
    storage: Vec<u8>,
    gap_start: usize,
    gap_end: usize,
}

impl GapBuffer {
    /// Creates an empty buffer with a small initial gap.
    pub fn new() -> Self {
        Self::from_seed(&[])
    }

    fn from_seed(seed: &[u8]) -> Self {
        // Heuristic initial gap: half the seed, within [8, GAP_BLOCK].
        let gap = (seed.len() / 2).clamp(8, GAP_BLOCK);
        Self::with_gap_size(seed, gap)
    }

    /// Creates a buffer seeded with `bytes` and an explicit initial gap,
    /// placed after the seed.
    pub fn with_gap_size(bytes: &[u8], gap: usize) -> Self {
        let mut storage = Vec::with_capacity(bytes.len() + gap);
        storage.extend_from_slice(bytes);
        storage.resize(bytes.len() + gap, GAP_FILL);
        GapBuffer {
            storage,
            gap_start: bytes.len(),
            gap_end: bytes.len() + gap,
        }
    }

    /// Logical length in bytes, excluding the gap.
    pub fn len(&self) -> usize {
        self.storage.len() - self.gap_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn gap_len(&self) -> usize {
        self.gap_end - self.gap_start
    }

    /// The two contiguous halves of the logical content, either side of
    /// the gap.
    pub fn as_slices(&self) -> (&[u8], &[u8]) {
        (
            &self.storage[..self.gap_start],
            &self.storage[self.gap_end..],
        )
    }

    fn storage_index(&self, index: usize) -> usize {
        if index < self.gap_start {
            index
        } else {
            index + self.gap_len()
        }
    }

    /// Byte at `index`.
    ///
    /// # Example
    ///
    /// ```
    /// # use runebuf::GapBuffer;
    /// let buf = GapBuffer::from(b"hello");
    /// assert_eq!(buf.get(0), Ok(b'h'));
    /// assert_eq!(buf.get(-1), Ok(b'o'));
    /// assert!(buf.get(5).is_err());
    /// ```
    pub fn get(&self, index: isize) -> Result<u8> {
        let i = normalize_index(index, self.len())?;
        Ok(self.storage[self.storage_index(i)])
    }

    /// Replaces the byte at `index`.
    pub fn set(&mut self, index: isize, byte: u8) -> Result<()> {
        let i = normalize_index(index, self.len())?;
        let at = self.storage_index(i);
        self.storage[at] = byte;
        Ok(())
    }

    /// Repositions the gap so it starts at logical index `new_start`.
    /// Content and gap size are unchanged; only the bookkeeping moves.
    pub fn move_gap(&mut self, new_start: usize) {
        assert!(
            new_start <= self.len(),
            "gap position {new_start} out of range for length {}",
            self.len()
        );
        let gap = self.gap_len();
        match new_start.cmp(&self.gap_start) {
            Ordering::Equal => return,
            Ordering::Less => self
                .storage
                .copy_within(new_start..self.gap_start, new_start + gap),
            Ordering::Greater => self
                .storage
                .copy_within(self.gap_end..new_start + gap, self.gap_start),
        }
        self.gap_start = new_start;
        self.gap_end = new_start + gap;
        if cfg!(debug_assertions) {
            // Unnecessary, but makes stale bytes obvious in a debugger.
            self.storage[self.gap_start..self.gap_end].fill(GAP_FILL);
        }
    }

    fn grow_gap(&mut self) {
        self.storage.splice(
            self.gap_start..self.gap_start,
            std::iter::repeat(GAP_FILL).take(GAP_BLOCK),
        );
        self.gap_end += GAP_BLOCK;
    }

    /// Inserts `byte` before `index`. Out-of-range positions clamp to the
    /// nearest end.
    ///
    /// # Example
    ///
    /// ```
    /// # use runebuf::GapBuffer;
    /// let mut buf = GapBuffer::from(b"hi");
    /// buf.insert(1, b'!');
    /// buf.insert(-100, b'>');
    /// assert_eq!(buf.to_vec(), b">h!i");
    /// ```
    pub fn insert(&mut self, index: isize, byte: u8) {
        let len = self.len();
        let mut index = if index < 0 {
            (index + len as isize).max(0) as usize
        } else {
            index as usize
        };
        index = index.min(len);

        if self.gap_len() == 0 {
            self.grow_gap();
        }
        if index != self.gap_start {
            self.move_gap(index);
        }
        self.storage[self.gap_start] = byte;
        self.gap_start += 1;
    }

    /// Appends a byte.
    pub fn push(&mut self, byte: u8) {
        let len = self.len();
        self.insert(len as isize, byte);
    }

    /// Deletes the byte at `index`.
    pub fn remove(&mut self, index: isize) -> Result<()> {
        let i = normalize_index(index, self.len())?;
        self.delete_range(i, i + 1);
        Ok(())
    }

    /// Deletes a byte range. Bounds clamp; an empty range is a no-op.
    pub fn delete<R: RangeBounds<isize>>(&mut self, range: R) {
        let (start, stop) = slice_bounds(&range, self.len());
        self.delete_range(start, stop);
    }

    fn delete_range(&mut self, start: usize, stop: usize) {
        if stop <= start {
            return;
        }
        let n = stop - start;
        if stop == self.gap_start {
            // Grow the gap towards the front.
            self.gap_start -= n;
        } else if start == self.gap_start {
            // Grow the gap towards the back.
            self.gap_end += n;
        } else {
            self.move_gap(start);
            self.gap_end += n;
        }
        if cfg!(debug_assertions) {
            self.storage[self.gap_start..self.gap_end].fill(GAP_FILL);
        }
    }

    /// Replaces a byte range with `bytes` (of any length).
    ///
    /// # Example
    ///
    /// ```
    /// # use runebuf::GapBuffer;
    /// let mut buf = GapBuffer::from(b"hello");
    /// buf.splice(1..-1, b"iberat");
    /// assert_eq!(buf.to_vec(), b"hiberato");
    /// ```
    pub fn splice<R: RangeBounds<isize>>(&mut self, range: R, bytes: &[u8]) {
        let (start, stop) = slice_bounds(&range, self.len());
        self.delete_range(start, stop);
        self.insert_all(start, bytes);
    }

    fn insert_all(&mut self, at: usize, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        while self.gap_len() < bytes.len() {
            self.grow_gap();
        }
        if at != self.gap_start {
            self.move_gap(at);
        }
        self.storage[self.gap_start..self.gap_start + bytes.len()].copy_from_slice(bytes);
        self.gap_start += bytes.len();
    }

    /// Copies out a byte range.
    ///
    /// # Example
    ///
    /// ```
    /// # use runebuf::GapBuffer;
    /// let buf = GapBuffer::from(b"hello");
    /// assert_eq!(buf.slice(1..-1), b"ell");
    /// assert_eq!(buf.slice(3..100), b"lo");
    /// ```
    pub fn slice<R: RangeBounds<isize>>(&self, range: R) -> Vec<u8> {
        let (start, stop) = slice_bounds(&range, self.len());
        self.copy_range(start, stop)
    }

    fn copy_range(&self, start: usize, stop: usize) -> Vec<u8> {
        if stop <= start {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(stop - start);
        if start < self.gap_start {
            out.extend_from_slice(&self.storage[start..min(self.gap_start, stop)]);
        }
        if stop > self.gap_start {
            let gap = self.gap_len();
            let lo = start.max(self.gap_start);
            out.extend_from_slice(&self.storage[lo + gap..stop + gap]);
        }
        out
    }

    /// Copies out every `step`-th byte of the range, walking backwards for
    /// negative steps.
    ///
    /// # Example
    ///
    /// ```
    /// # use runebuf::GapBuffer;
    /// let buf = GapBuffer::from(b"hello");
    /// assert_eq!(buf.slice_step(.., 2), b"hlo");
    /// assert_eq!(buf.slice_step(.., -1), b"olleh");
    /// ```
    pub fn slice_step<R: RangeBounds<isize>>(&self, range: R, step: isize) -> Vec<u8> {
        if step == 1 {
            return self.slice(range);
        }
        let (start, stop) = range_to_endpoints(&range, self.len());
        let (start, stop) = slice_indices(start, stop, step, self.len());
        let mut out = Vec::new();
        let mut i = start;
        while (step > 0 && i < stop) || (step < 0 && i > stop) {
            out.push(self.storage[self.storage_index(i as usize)]);
            i += step;
        }
        out
    }

    /// The whole logical content as a fresh vector.
    pub fn to_vec(&self) -> Vec<u8> {
        let (front, back) = self.as_slices();
        let mut out = Vec::with_capacity(front.len() + back.len());
        out.extend_from_slice(front);
        out.extend_from_slice(back);
        out
    }

    /// Smallest logical index where `sub` occurs, if any.
    ///
    /// # Example
    ///
    /// ```
    /// # use runebuf::GapBuffer;
    /// let mut buf = GapBuffer::from(b"hello");
    /// buf.move_gap(2);
    /// assert_eq!(buf.find(b"ell"), Some(1));
    /// assert_eq!(buf.find(b"zz"), None);
    /// ```
    pub fn find(&self, sub: &[u8]) -> Option<usize> {
        self.find_in(sub, ..)
    }

    /// As [`find`](Self::find), restricted to a logical range. The search
    /// runs over at most three windows (before the gap, straddling it, and
    /// after it), so the buffer is never materialized.
    pub fn find_in<R: RangeBounds<isize>>(&self, sub: &[u8], range: R) -> Option<usize> {
        let (start, stop) = slice_bounds(&range, self.len());
        if start >= stop {
            return None;
        }
        let gs = self.gap_start;
        let gap = self.gap_len();

        // Entirely before the gap: a plain contiguous search.
        if start < gs {
            if let Some(f) = find_window(&self.storage, sub, start, min(gs, stop)) {
                return Some(f);
            }
        }

        // Positions whose match would straddle the gap.
        if start < gs && stop >= gs && !sub.is_empty() {
            let search_start = start.max(gs.saturating_sub(sub.len()));
            for at in search_start..search_start + sub.len() {
                if at + sub.len() <= stop && self.matches_at(at, sub) {
                    return Some(at);
                }
            }
        }

        // After the gap, searched in storage coordinates.
        if stop >= gs {
            if let Some(f) = find_window(
                &self.storage,
                sub,
                (start + gap).max(self.gap_end),
                stop + gap,
            ) {
                return Some(f - gap);
            }
        }
        None
    }

    fn matches_at(&self, at: usize, sub: &[u8]) -> bool {
        if at + sub.len() > self.len() {
            return false;
        }
        sub.iter()
            .enumerate()
            .all(|(k, &b)| self.storage[self.storage_index(at + k)] == b)
    }

    /// As [`find`](Self::find), but failing with [`Error::NotFound`].
    pub fn index(&self, sub: &[u8]) -> Result<usize> {
        self.find(sub).ok_or(Error::NotFound)
    }

    /// As [`find_in`](Self::find_in), but failing with [`Error::NotFound`].
    pub fn index_in<R: RangeBounds<isize>>(&self, sub: &[u8], range: R) -> Result<usize> {
        self.find_in(sub, range).ok_or(Error::NotFound)
    }

    pub fn contains(&self, sub: &[u8]) -> bool {
        self.find(sub).is_some()
    }

    /// A fresh cursor over the logical bytes, in order.
    pub fn iter(&self) -> Bytes<'_> {
        let (front, back) = self.as_slices();
        Bytes { front, back }
    }

    /// Element-wise equality against a plain byte slice.
    pub fn eq_bytes(&self, other: &[u8]) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let (front, back) = self.as_slices();
        let (of, ob) = other.split_at(front.len());
        front == of && back == ob
    }

    /// Element-wise equality against any byte iterator, lengths included.
    pub fn eq_iter<I>(&self, other: I) -> bool
    where
        I: IntoIterator<Item = u8>,
    {
        let mut other = other.into_iter();
        for b in self.iter() {
            if other.next() != Some(b) {
                return false;
            }
        }
        other.next().is_none()
    }

    pub(crate) fn check(&self) {
        assert!(self.gap_start <= self.gap_end);
        assert!(self.gap_end <= self.storage.len());
    }
}

/// `bytearray.find`-style search in `hay[start..stop]`, window-clamped.
fn find_window(hay: &[u8], sub: &[u8], start: usize, stop: usize) -> Option<usize> {
    let stop = stop.min(hay.len());
    if start > stop {
        return None;
    }
    if sub.is_empty() {
        return Some(start);
    }
    if sub.len() > stop - start {
        return None;
    }
    hay[start..stop]
        .windows(sub.len())
        .position(|w| w == sub)
        .map(|p| p + start)
}

impl Default for GapBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&[u8]> for GapBuffer {
    fn from(bytes: &[u8]) -> Self {
        Self::from_seed(bytes)
    }
}

impl<const N: usize> From<&[u8; N]> for GapBuffer {
    fn from(bytes: &[u8; N]) -> Self {
        Self::from_seed(bytes)
    }
}

impl From<Vec<u8>> for GapBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_seed(&bytes)
    }
}

impl From<&str> for GapBuffer {
    fn from(s: &str) -> Self {
        Self::from_seed(s.as_bytes())
    }
}

impl Extend<u8> for GapBuffer {
    fn extend<T: IntoIterator<Item = u8>>(&mut self, iter: T) {
        for b in iter {
            self.push(b);
        }
    }
}

impl PartialEq for GapBuffer {
    // Contents can agree while the gaps sit at different offsets, so walk
    // the two pairs of halves in step.
    fn eq(&self, other: &GapBuffer) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let (a0, a1) = self.as_slices();
        let (b0, b1) = other.as_slices();
        let mut chunks = [b0, b1].into_iter();
        let mut os: &[u8] = chunks.next().unwrap_or(&[]);
        for mut s in [a0, a1] {
            while !s.is_empty() {
                while os.is_empty() {
                    match chunks.next() {
                        Some(c) => os = c,
                        None => return false,
                    }
                }
                let n = min(s.len(), os.len());
                let (sh, st) = s.split_at(n);
                let (oh, ot) = os.split_at(n);
                if sh != oh {
                    return false;
                }
                s = st;
                os = ot;
            }
        }
        true
    }
}

impl Eq for GapBuffer {}

impl PartialEq<[u8]> for GapBuffer {
    fn eq(&self, other: &[u8]) -> bool {
        self.eq_bytes(other)
    }
}

impl PartialEq<&[u8]> for GapBuffer {
    fn eq(&self, other: &&[u8]) -> bool {
        self.eq_bytes(other)
    }
}

impl PartialEq<Vec<u8>> for GapBuffer {
    fn eq(&self, other: &Vec<u8>) -> bool {
        self.eq_bytes(other)
    }
}

impl Debug for GapBuffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("GapBuffer")
            .field("content", &self.to_vec())
            .field("gap_start", &self.gap_start)
            .field("gap_end", &self.gap_end)
            .finish()
    }
}

/// Restartable cursor over a buffer's logical bytes.
pub struct Bytes<'a> {
    front: &'a [u8],
    back: &'a [u8],
}

impl<'a> Iterator for Bytes<'a> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if let Some((&b, rest)) = self.front.split_first() {
            self.front = rest;
            return Some(b);
        }
        if let Some((&b, rest)) = self.back.split_first() {
            self.back = rest;
            return Some(b);
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.front.len() + self.back.len();
        (n, Some(n))
    }
}

impl ExactSizeIterator for Bytes<'_> {}
