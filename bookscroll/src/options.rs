use alloc::string::String;
use alloc::sync::Arc;

use crate::pager::Pager;

/// A callback fired after a pager state update.
pub type OnChangeCallback = Arc<dyn Fn(&Pager) + Send + Sync>;

/// Configuration for [`crate::Pager`].
///
/// Cheap to clone: the callback lives in an `Arc`.
#[derive(Clone)]
pub struct PagerOptions {
    /// The catalog subject to page through.
    pub subject: String,

    /// Optional callback fired when the pager's state changes.
    pub on_change: Option<OnChangeCallback>,

    /// Stop issuing visibility-triggered loads once the catalog returns an empty page.
    ///
    /// The catalog never signals the end of results explicitly. With `false`, every trigger
    /// on an exhausted list asks again.
    pub stop_at_end: bool,
}

impl PagerOptions {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            on_change: None,
            stop_at_end: true,
        }
    }

    pub fn with_on_change(
        mut self,
        on_change: Option<impl Fn(&Pager) + Send + Sync + 'static>,
    ) -> Self {
        self.on_change = on_change.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_stop_at_end(mut self, stop_at_end: bool) -> Self {
        self.stop_at_end = stop_at_end;
        self
    }
}

impl core::fmt::Debug for PagerOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PagerOptions")
            .field("subject", &self.subject)
            .field("stop_at_end", &self.stop_at_end)
            .finish_non_exhaustive()
    }
}
