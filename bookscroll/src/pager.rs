use alloc::string::String;
use alloc::sync::Arc;
use core::cell::Cell;

use crate::{BookRecord, ListState, LoadError, Page, PagerOptions};

/// A page load the host must perform.
///
/// Returned by the [`Pager`] operations that trigger a load. Hand it back to
/// [`Pager::complete`] together with the result once the fetch resolves.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageRequest {
    pub subject: String,
    pub offset: u64,
    /// Monotonic request id. Only the latest issued id is accepted by `complete`.
    pub seq: u64,
}

/// What [`Pager::complete`] did with a result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    /// The page was appended; `received` raw records advanced the offset.
    Applied { received: usize },
    /// The load failed; the error is now pending on the list.
    Failed,
    /// The request was superseded (newer request or subject change) and its result dropped.
    Stale,
}

/// A headless infinite-scroll pager.
///
/// The pager owns the list and decides when a page must be loaded, but performs no I/O:
/// - `mount`, `set_subject`, `on_visibility`, `load_next` and `retry` may return a
///   [`PageRequest`].
/// - The host fetches it and reports back with `complete`.
///
/// At most one request is outstanding at a time. Results of superseded requests are
/// discarded, so a slow response can never overwrite a newer one.
#[derive(Clone, Debug)]
pub struct Pager {
    options: PagerOptions,
    state: ListState,
    mounted: bool,
    last_seq: u64,
    in_flight: Option<u64>,
    revision: u64,

    notify_depth: Cell<usize>,
    notify_pending: Cell<bool>,
}

impl Pager {
    pub fn new(options: PagerOptions) -> Self {
        bdebug!(subject = %options.subject, "Pager::new");
        Self {
            options,
            state: ListState::default(),
            mounted: false,
            last_seq: 0,
            in_flight: None,
            revision: 0,
            notify_depth: Cell::new(0),
            notify_pending: Cell::new(false),
        }
    }

    pub fn options(&self) -> &PagerOptions {
        &self.options
    }

    pub fn set_on_change(&mut self, on_change: Option<impl Fn(&Pager) + Send + Sync + 'static>) {
        self.options.on_change = on_change.map(|f| Arc::new(f) as _);
        self.notify();
    }

    pub fn set_stop_at_end(&mut self, stop_at_end: bool) {
        self.options.stop_at_end = stop_at_end;
    }

    fn notify_now(&self) {
        if let Some(cb) = &self.options.on_change {
            cb(self);
        }
    }

    fn notify(&self) {
        if self.notify_depth.get() > 0 {
            self.notify_pending.set(true);
            return;
        }
        self.notify_now();
    }

    /// Batches multiple updates into a single `on_change` notification.
    pub fn batch_update<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let depth = self.notify_depth.get();
        self.notify_depth.set(depth.saturating_add(1));

        let out = f(self);

        let depth = self.notify_depth.get();
        debug_assert!(depth > 0, "notify_depth underflow");
        let next = depth.saturating_sub(1);
        self.notify_depth.set(next);

        if next == 0 && self.notify_pending.replace(false) {
            self.notify_now();
        }
        out
    }

    pub fn subject(&self) -> &str {
        &self.options.subject
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    pub fn items(&self) -> &[BookRecord] {
        self.state.items()
    }

    pub fn offset(&self) -> u64 {
        self.state.offset()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn error(&self) -> Option<&LoadError> {
        self.state.error()
    }

    pub fn is_exhausted(&self) -> bool {
        self.state.is_exhausted()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// A counter bumped whenever the subject or the list contents change.
    ///
    /// Hosts pass it to [`crate::VisibilityDetector::set_dependencies`] so the last-item
    /// observation is re-established after every list change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Key of the last loaded item: the node the visibility detector should observe.
    pub fn last_key(&self) -> Option<&str> {
        self.state.items.last().map(BookRecord::key)
    }

    /// Starts the list: loads page 0 of the current subject.
    ///
    /// Returns `None` if the pager is already mounted.
    pub fn mount(&mut self) -> Option<PageRequest> {
        if self.mounted {
            return None;
        }
        self.mounted = true;
        bdebug!(subject = %self.options.subject, "Pager::mount");
        Some(self.issue())
    }

    /// Switches to another subject.
    ///
    /// The list is cleared, the offset reset to 0, and page 0 of the new subject is requested.
    /// Any request still in flight for the previous subject becomes stale. Before `mount`, only
    /// the subject is replaced.
    pub fn set_subject(&mut self, subject: impl Into<String>) -> Option<PageRequest> {
        let subject = subject.into();
        if subject == self.options.subject {
            return None;
        }
        bdebug!(from = %self.options.subject, to = %subject, "Pager::set_subject");
        self.options.subject = subject;
        self.state.reset();
        self.in_flight = None;
        self.revision = self.revision.wrapping_add(1);
        if !self.mounted {
            self.notify();
            return None;
        }
        Some(self.issue())
    }

    /// Visibility callback for the last rendered item.
    ///
    /// `visible = true` requests the next page unless a load is already in flight, an error
    /// is waiting for `retry`, or the list is exhausted. `visible = false` is ignored.
    pub fn on_visibility(&mut self, visible: bool) -> Option<PageRequest> {
        btrace!(visible, offset = self.state.offset, "Pager::on_visibility");
        if !visible {
            return None;
        }
        self.load_next()
    }

    /// Requests the next page, subject to the same guards as `on_visibility(true)`.
    pub fn load_next(&mut self) -> Option<PageRequest> {
        if !self.mounted {
            return None;
        }
        if let Some(_seq) = self.in_flight {
            btrace!(seq = _seq, "load already in flight");
            return None;
        }
        if self.state.error.is_some() {
            btrace!("load blocked by pending error");
            return None;
        }
        if self.state.exhausted && self.options.stop_at_end {
            btrace!(offset = self.state.offset, "list exhausted");
            return None;
        }
        Some(self.issue())
    }

    /// Clears a pending error and requests the page that failed.
    pub fn retry(&mut self) -> Option<PageRequest> {
        if self.in_flight.is_some() || self.state.error.is_none() {
            return None;
        }
        bdebug!(offset = self.state.offset, "Pager::retry");
        self.state.error = None;
        Some(self.issue())
    }

    /// Applies the result of `request`.
    ///
    /// On success the page is appended in order, the offset advances by `page.received` and
    /// loading stops. On failure loading stops and the error is kept until `retry`.
    pub fn complete(
        &mut self,
        request: &PageRequest,
        result: Result<Page, LoadError>,
    ) -> Completion {
        if self.in_flight != Some(request.seq) {
            bdebug!(
                seq = request.seq,
                subject = %request.subject,
                offset = request.offset,
                "discarding stale page result"
            );
            return Completion::Stale;
        }
        self.in_flight = None;
        self.state.is_loading = false;

        let completion = match result {
            Ok(page) => {
                let received = page.received;
                self.state.offset = self.state.offset.saturating_add(received as u64);
                self.state.items.extend(page.books);
                self.state.exhausted = received == 0;
                self.revision = self.revision.wrapping_add(1);
                bdebug!(
                    received,
                    offset = self.state.offset,
                    len = self.state.items.len(),
                    "page applied"
                );
                Completion::Applied { received }
            }
            Err(err) => {
                bwarn!(error = %err, offset = request.offset, "page load failed");
                self.state.error = Some(err);
                Completion::Failed
            }
        };
        self.notify();
        completion
    }

    fn issue(&mut self) -> PageRequest {
        self.last_seq = self.last_seq.wrapping_add(1);
        let seq = self.last_seq;
        self.in_flight = Some(seq);
        self.state.is_loading = true;
        btrace!(seq, offset = self.state.offset, "issuing page request");
        self.notify();
        PageRequest {
            subject: self.options.subject.clone(),
            offset: self.state.offset,
            seq,
        }
    }
}
