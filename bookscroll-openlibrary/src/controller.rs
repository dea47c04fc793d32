use std::collections::HashMap;
use std::sync::Arc;

use bookscroll::{
    Completion, LoadError, Page, PageRequest, Pager, PagerOptions, Span, VisibilityDetector,
};
use tokio::task::{Id, JoinSet};
use tracing::{debug, error};

use crate::source::PageSource;
use crate::view::ListView;

type Resolved = (PageRequest, Result<Page, LoadError>);

/// Drives a [`Pager`] and a [`VisibilityDetector`] against a [`PageSource`].
///
/// This type does not hold any UI objects. Hosts drive it by calling:
/// - `mount` once, and `set_subject` when the subject prop changes
/// - `on_intersection` / `on_viewport` when the last row's visibility may have changed
/// - `next_completion` / `settle` to apply fetch results
///
/// Fetches run as tokio tasks, so several may be in flight (a superseded one plus the
/// current one); the pager drops results that are no longer current. Every applied result
/// re-renders the view and re-binds the detector to the new last row.
pub struct Controller<S> {
    pager: Pager,
    detector: VisibilityDetector<String>,
    source: Arc<S>,
    tasks: JoinSet<Resolved>,
    // Requests by task, so a task that panics or is cancelled still completes its request.
    requests: HashMap<Id, PageRequest>,
    view: ListView,
}

impl<S: PageSource> Controller<S> {
    pub fn new(source: S, options: PagerOptions) -> Self {
        Self::from_shared(Arc::new(source), options)
    }

    pub fn from_shared(source: Arc<S>, options: PagerOptions) -> Self {
        Self {
            pager: Pager::new(options),
            detector: VisibilityDetector::default(),
            source,
            tasks: JoinSet::new(),
            requests: HashMap::new(),
            view: ListView::default(),
        }
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn detector(&self) -> &VisibilityDetector<String> {
        &self.detector
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The last rendered frame.
    pub fn view(&self) -> &ListView {
        &self.view
    }

    /// Number of fetch tasks not yet collected, stale ones included.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Loads page 0 of the configured subject.
    pub fn mount(&mut self) -> bool {
        let request = self.pager.mount();
        self.render();
        self.dispatch(request)
    }

    /// Resets the list to `subject` and loads its page 0.
    pub fn set_subject(&mut self, subject: impl Into<String>) -> bool {
        let request = self.pager.set_subject(subject);
        self.render();
        self.dispatch(request)
    }

    /// Requests the next page regardless of visibility (same guards as a visibility trigger).
    pub fn load_next(&mut self) -> bool {
        let request = self.pager.load_next();
        self.render();
        self.dispatch(request)
    }

    pub fn retry(&mut self) -> bool {
        let request = self.pager.retry();
        self.render();
        self.dispatch(request)
    }

    /// Feeds an intersection report for the row with `key`.
    ///
    /// Returns `true` when the report started a fetch.
    pub fn on_intersection(&mut self, key: &str, intersecting: bool) -> bool {
        let Some(visible) = self.detector.on_intersection(&key.to_owned(), intersecting) else {
            return false;
        };
        self.on_visibility(visible)
    }

    /// Feeds the current viewport; the bound row's position comes from the last frame.
    ///
    /// Returns `true` when the last row crossed into view and a fetch started.
    pub fn on_viewport(&mut self, viewport: Span) -> bool {
        let Some(node) = self.detector.node().cloned() else {
            return false;
        };
        let Some(item) = self.view.row_span(&node) else {
            return false;
        };
        let Some(visible) = self.detector.on_geometry(&node, item, viewport) else {
            return false;
        };
        self.on_visibility(visible)
    }

    /// Waits for one fetch to resolve and applies it.
    ///
    /// A fetch task that panicked or was cancelled fails its request with a network error,
    /// so the pager never stays loading. Returns `None` when nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        loop {
            let (request, result) = match self.tasks.join_next_with_id().await? {
                Ok((id, resolved)) => {
                    self.requests.remove(&id);
                    resolved
                }
                Err(err) => {
                    error!(error = %err, "fetch task did not complete");
                    let Some(request) = self.requests.remove(&err.id()) else {
                        continue;
                    };
                    (request, Err(LoadError::network(err.to_string())))
                }
            };
            let completion = self.pager.complete(&request, result);
            debug!(
                seq = request.seq,
                offset = request.offset,
                ?completion,
                "fetch resolved"
            );
            self.render();
            return Some(completion);
        }
    }

    /// Applies every in-flight fetch.
    pub async fn settle(&mut self) -> Vec<Completion> {
        let mut out = Vec::new();
        while let Some(completion) = self.next_completion().await {
            out.push(completion);
        }
        out
    }

    /// Rebuilds the frame and binds the detector to the last row.
    pub fn render(&mut self) -> &ListView {
        self.view = ListView::from_pager(&self.pager);
        self.detector
            .sync(self.pager.last_key().map(str::to_owned), self.pager.revision());
        &self.view
    }

    fn on_visibility(&mut self, visible: bool) -> bool {
        let request = self.pager.on_visibility(visible);
        if request.is_some() {
            self.render();
        }
        self.dispatch(request)
    }

    fn dispatch(&mut self, request: Option<PageRequest>) -> bool {
        let Some(request) = request else {
            return false;
        };
        debug!(
            subject = %request.subject,
            offset = request.offset,
            seq = request.seq,
            "dispatching page fetch"
        );
        let source = Arc::clone(&self.source);
        let task = request.clone();
        let handle = self.tasks.spawn(async move {
            let result = source
                .fetch_page(&task.subject, task.offset)
                .await
                .map_err(LoadError::from);
            (task, result)
        });
        self.requests.insert(handle.id(), request);
        true
    }
}

impl<S> std::fmt::Debug for Controller<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("pager", &self.pager)
            .field("detector", &self.detector)
            .field("pending", &self.tasks.len())
            .finish_non_exhaustive()
    }
}
