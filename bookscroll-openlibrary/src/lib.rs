//! Open Library adapter for the `bookscroll` crate.
//!
//! The `bookscroll` crate is transport-agnostic and owns the list and visibility state. This
//! crate connects it to the Open Library catalog:
//!
//! - [`CatalogClient`]: the `query.json` endpoint over `reqwest`
//! - [`Controller`]: runs page fetches on tokio and feeds results back into the pager
//! - [`ListView`]: a plain-text frame of the list and its loading indicator
//! - [`cli`]: the `bookscroll` command-line front-end
#![forbid(unsafe_code)]

pub mod cli;
mod client;
mod config;
mod controller;
mod error;
mod source;
mod view;


pub use client::{CatalogClient, page_url, parse_page};
pub use config::{CatalogConfig, DEFAULT_BASE_URL, DEFAULT_SUBJECT, DEFAULT_TIMEOUT};
pub use controller::Controller;
pub use error::{FetchError, Result};
pub use source::PageSource;
pub use view::{LOADING_TEXT, ListView, RowView};
