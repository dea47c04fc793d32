//! A headless infinite-scroll pager.
//!
//! For the Open Library adapter (HTTP client, async controller, terminal renderer), see the
//! `bookscroll-openlibrary` crate.
//!
//! This crate owns the two pieces of state an infinite list needs:
//! - [`Pager`]: the loaded items, the fetch offset and the loading flag. It decides when the
//!   next page is due and hands out [`PageRequest`]s, but never performs I/O itself.
//! - [`VisibilityDetector`]: a single-node observation that reports when the last rendered
//!   item enters or leaves the viewport.
//!
//! It is UI-agnostic. A host is expected to provide:
//! - the page fetches (any transport)
//! - intersection reports for the observed node (or item/viewport geometry)
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod error;
mod options;
mod pager;
mod state;
mod types;
mod visibility;

#[cfg(test)]
mod tests;

pub use error::{LoadError, LoadErrorKind};
pub use options::{OnChangeCallback, PagerOptions};
pub use pager::{Completion, PageRequest, Pager};
pub use state::ListState;
pub use types::{BookRecord, InvalidRecord, Page, RawBook, RawDescription, Span};
pub use visibility::{IntersectionSource, ObserverStats, VisibilityCallback, VisibilityDetector};
