//! Index arithmetic shared by the byte and rune sequences.
//!
//! Both structures follow the classic extended-slice conventions: negative
//! indices count back from the end, slice bounds clamp instead of failing,
//! and a step walks the selected range in either direction.

use std::ops::{Bound, RangeBounds};

use crate::error::Error;

/// Resolve a single element index, supporting negative offsets from the end.
/// Fails for anything outside `[-len, len)`.
pub(crate) fn normalize_index(index: isize, len: usize) -> Result<usize, Error> {
    let shifted = if index < 0 { index + len as isize } else { index };
    if shifted < 0 || shifted as usize >= len {
        return Err(Error::OutOfRange { index, len });
    }
    Ok(shifted as usize)
}

/// Turn a `RangeBounds<isize>` into optional slice endpoints, where `None`
/// means "default for the step direction".
///
/// An inclusive end of `-1` means "through the last element", which is the
/// unbounded default; any other inclusive end just shifts by one.
pub(crate) fn range_to_endpoints<R: RangeBounds<isize>>(
    range: &R,
    len: usize,
) -> (Option<isize>, Option<isize>) {
    let start = match range.start_bound() {
        Bound::Unbounded => None,
        Bound::Included(&i) => Some(i),
        Bound::Excluded(&i) => Some(if i == -1 { len as isize } else { i + 1 }),
    };
    let stop = match range.end_bound() {
        Bound::Unbounded => None,
        Bound::Excluded(&i) => Some(i),
        Bound::Included(&i) => {
            if i == -1 {
                None
            } else {
                Some(i + 1)
            }
        }
    };
    (start, stop)
}

/// Clamp optional endpoints for a given step, producing the same `(start,
/// stop)` pair `slice.indices()` would. The results are element indices for
/// `step > 0` and may be `-1` (one before the front) for `step < 0`.
pub(crate) fn slice_indices(
    start: Option<isize>,
    stop: Option<isize>,
    step: isize,
    len: usize,
) -> (isize, isize) {
    assert!(step != 0, "slice step cannot be zero");
    let len = len as isize;
    let resolve = |endpoint: Option<isize>, fwd_default: isize, rev_default: isize| -> isize {
        match endpoint {
            None => {
                if step > 0 {
                    fwd_default
                } else {
                    rev_default
                }
            }
            Some(mut i) => {
                if i < 0 {
                    i += len;
                    if i < 0 {
                        i = if step > 0 { 0 } else { -1 };
                    }
                } else if i >= len {
                    i = if step > 0 { len } else { len - 1 };
                }
                i
            }
        }
    };
    let start = resolve(start, 0, len - 1);
    let stop = resolve(stop, len, -1);
    (start, stop)
}

/// Step-1 clamp of a range to `[0, len]`, with `stop` pulled up to `start`
/// so callers can treat the pair as an ordinary empty-when-equal window.
pub(crate) fn slice_bounds<R: RangeBounds<isize>>(range: &R, len: usize) -> (usize, usize) {
    let (start, stop) = range_to_endpoints(range, len);
    let (start, stop) = slice_indices(start, stop, 1, len);
    (start as usize, stop.max(start) as usize)
}
