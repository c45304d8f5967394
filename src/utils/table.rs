//! Position-indexed function tables.
//!
//! A [`JumpTable`] is a fixed slice of plain functions, one per position, typically produced as an
//! associated `const` from a list of types (see [`crate::ParamList`]). Looking up position `i`
//! calls the `i`-th function after a bounds check, so per-position type information can be
//! recovered from a runtime index without any runtime type switch.

use std::fmt;

use crate::{Error::RangeError, Result};

/// A bounds-checked table of functions producing an `R`
///
/// # Examples
///
/// ```rust
/// use metascope::{Error, JumpTable};
///
/// const SIZES: &[fn() -> usize] = &[std::mem::size_of::<u8>, std::mem::size_of::<u64>];
/// let table = JumpTable::new(SIZES);
///
/// assert_eq!(table.call(1)?, 8);
/// assert_eq!(table.call(2), Err(Error::RangeError { index: 2, len: 2 }));
/// assert!(JumpTable::<usize>::EMPTY.call(0).is_err());
/// # Ok::<(), metascope::Error>(())
/// ```
pub struct JumpTable<R: 'static> {
    entries: &'static [fn() -> R],
}

impl<R: 'static> JumpTable<R> {
    /// The table of a zero-length list, every lookup fails
    pub const EMPTY: JumpTable<R> = JumpTable { entries: &[] };

    /// Wraps a slice of functions
    #[must_use]
    pub const fn new(entries: &'static [fn() -> R]) -> Self {
        JumpTable { entries }
    }

    /// Calls the function at `index`
    ///
    /// # Errors
    /// Returns [`crate::Error::RangeError`] if `index` is not in `[0, len)`.
    pub fn call(&self, index: usize) -> Result<R> {
        match self.entries.get(index) {
            Some(entry) => Ok(entry()),
            None => Err(RangeError {
                index,
                len: self.entries.len(),
            }),
        }
    }

    /// Number of positions
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no positions
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Calls every function in order
    pub fn iter(&self) -> impl Iterator<Item = R> + '_ {
        self.entries.iter().map(|entry| entry())
    }
}

impl<R: 'static> Clone for JumpTable<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: 'static> Copy for JumpTable<R> {}

impl<R: 'static> fmt::Debug for JumpTable<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JumpTable")
            .field("len", &self.entries.len())
            .finish()
    }
}
