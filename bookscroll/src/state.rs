use alloc::vec::Vec;

use crate::{BookRecord, LoadError};

/// The list owned by a [`crate::Pager`].
///
/// `offset` always equals the number of records received from the catalog for the current
/// subject. Both reset together on a subject change.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListState {
    pub(crate) items: Vec<BookRecord>,
    pub(crate) offset: u64,
    pub(crate) is_loading: bool,
    pub(crate) error: Option<LoadError>,
    pub(crate) exhausted: bool,
}

impl ListState {
    pub fn items(&self) -> &[BookRecord] {
        &self.items
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// The error left by the last failed load, cleared by a retry or a subject change.
    pub fn error(&self) -> Option<&LoadError> {
        self.error.as_ref()
    }

    /// `true` when the last page the catalog returned was empty.
    ///
    /// Further loads are refused only when the pager was built with `stop_at_end`.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub(crate) fn reset(&mut self) {
        self.items.clear();
        self.offset = 0;
        self.is_loading = false;
        self.error = None;
        self.exhausted = false;
    }
}
