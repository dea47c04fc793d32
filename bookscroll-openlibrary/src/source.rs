use std::future::Future;
use std::sync::Arc;

use bookscroll::Page;

use crate::error::Result;

/// Where pages come from.
///
/// [`crate::CatalogClient`] is the network implementation; tests and embedders can provide
/// their own.
pub trait PageSource: Send + Sync + 'static {
    fn fetch_page(&self, subject: &str, offset: u64) -> impl Future<Output = Result<Page>> + Send;
}

impl<S: PageSource> PageSource for Arc<S> {
    fn fetch_page(&self, subject: &str, offset: u64) -> impl Future<Output = Result<Page>> + Send {
        S::fetch_page(self, subject, offset)
    }
}
