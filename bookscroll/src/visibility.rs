use alloc::sync::Arc;

use crate::Span;

/// A callback fired when the observed node crosses the viewport boundary.
///
/// The argument is the new intersection state.
pub type VisibilityCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// The platform-level observer a [`VisibilityDetector`] subscribes to.
///
/// Implementations start delivering intersection reports for `node` after `observe` and stop
/// after `unobserve`. Reports are fed back through [`VisibilityDetector::on_intersection`].
///
/// `()` is a no-op source for hosts that compute intersections themselves (for example with
/// [`VisibilityDetector::on_geometry`]).
pub trait IntersectionSource<N> {
    fn observe(&mut self, node: &N);
    fn unobserve(&mut self, node: &N);
}

impl<N> IntersectionSource<N> for () {
    fn observe(&mut self, _node: &N) {}
    fn unobserve(&mut self, _node: &N) {}
}

/// Bind/teardown counters of a [`VisibilityDetector`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObserverStats {
    pub binds: u64,
    pub teardowns: u64,
}

impl ObserverStats {
    /// Number of live observations. Never exceeds 1.
    pub fn active(&self) -> u64 {
        self.binds.saturating_sub(self.teardowns)
    }
}

#[derive(Clone, Debug)]
struct Observation<N> {
    node: N,
    // `None` until the first report after a bind.
    intersecting: Option<bool>,
}

/// Watches a single node and reports when it enters or leaves the viewport.
///
/// This is an effect handle: it owns at most one subscription on its [`IntersectionSource`].
/// `rebind` tears the previous subscription down before establishing the next one, and
/// dropping the detector disposes whatever is still bound.
///
/// State per bound node: unbound → observing → (intersecting ↔ not intersecting) → unbound.
pub struct VisibilityDetector<N, S: IntersectionSource<N> = ()> {
    source: S,
    on_change: Option<VisibilityCallback>,
    deps: u64,
    observation: Option<Observation<N>>,
    stats: ObserverStats,
}

impl<N: PartialEq, S: IntersectionSource<N>> VisibilityDetector<N, S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            on_change: None,
            deps: 0,
            observation: None,
            stats: ObserverStats::default(),
        }
    }

    pub fn with_on_change(
        mut self,
        on_change: Option<impl Fn(bool) + Send + Sync + 'static>,
    ) -> Self {
        self.on_change = on_change.map(|f| Arc::new(f) as _);
        self
    }

    pub fn set_on_change(&mut self, on_change: Option<impl Fn(bool) + Send + Sync + 'static>) {
        self.on_change = on_change.map(|f| Arc::new(f) as _);
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// The node currently observed, if any.
    pub fn node(&self) -> Option<&N> {
        self.observation.as_ref().map(|o| &o.node)
    }

    /// Last reported state of the bound node; `None` when unbound or not yet reported.
    pub fn is_intersecting(&self) -> Option<bool> {
        self.observation.as_ref().and_then(|o| o.intersecting)
    }

    pub fn stats(&self) -> ObserverStats {
        self.stats
    }

    pub fn dependencies(&self) -> u64 {
        self.deps
    }

    /// Binds observation to `node`, or tears it down with `None`.
    ///
    /// Binding the node that is already observed is a no-op, so hosts can call this on every
    /// render.
    pub fn rebind(&mut self, node: Option<N>) {
        if let (Some(current), Some(next)) = (&self.observation, &node) {
            if current.node == *next {
                return;
            }
        }
        self.teardown();
        if let Some(node) = node {
            self.bind(node);
        }
    }

    /// Tears down the active observation, if any.
    pub fn dispose(&mut self) {
        self.teardown();
    }

    /// Updates the dependency stamp.
    ///
    /// When the stamp changes while a node is bound, the observation is re-established on the
    /// same node and its next report fires again, even if the state did not change.
    pub fn set_dependencies(&mut self, stamp: u64) {
        if self.deps == stamp {
            return;
        }
        self.deps = stamp;
        let Some(observation) = self.observation.take() else {
            return;
        };
        self.source.unobserve(&observation.node);
        self.stats.teardowns = self.stats.teardowns.saturating_add(1);
        btrace!(deps = stamp, "VisibilityDetector: dependencies changed");
        self.bind(observation.node);
    }

    /// Per-render entry point: binds `node` under dependency stamp `stamp`.
    ///
    /// A different node is bound fresh. The same node is re-established only when the stamp
    /// changed.
    pub fn sync(&mut self, node: Option<N>, stamp: u64) {
        let same_node = matches!(
            (&self.observation, &node),
            (Some(current), Some(next)) if current.node == *next
        );
        if same_node {
            self.set_dependencies(stamp);
        } else {
            self.deps = stamp;
            self.rebind(node);
        }
    }

    /// Feeds an intersection report from the source.
    ///
    /// Returns the new state when this report is a boundary crossing for the bound node (and
    /// fires the callback), `None` otherwise. Reports for nodes that are no longer bound are
    /// dropped.
    pub fn on_intersection(&mut self, node: &N, intersecting: bool) -> Option<bool> {
        let observation = self.observation.as_mut()?;
        if observation.node != *node {
            btrace!("VisibilityDetector: report for unbound node dropped");
            return None;
        }
        if observation.intersecting == Some(intersecting) {
            return None;
        }
        observation.intersecting = Some(intersecting);
        btrace!(intersecting, "VisibilityDetector: crossing");
        if let Some(cb) = &self.on_change {
            cb(intersecting);
        }
        Some(intersecting)
    }

    /// Computes the intersection of `item` with `viewport` and feeds it as a report.
    pub fn on_geometry(&mut self, node: &N, item: Span, viewport: Span) -> Option<bool> {
        self.on_intersection(node, item.intersects(&viewport))
    }

    fn bind(&mut self, node: N) {
        debug_assert!(self.observation.is_none(), "bind over a live observation");
        self.source.observe(&node);
        self.stats.binds = self.stats.binds.saturating_add(1);
        self.observation = Some(Observation {
            node,
            intersecting: None,
        });
    }
}

impl<N, S: IntersectionSource<N>> VisibilityDetector<N, S> {
    fn teardown(&mut self) {
        if let Some(observation) = self.observation.take() {
            self.source.unobserve(&observation.node);
            self.stats.teardowns = self.stats.teardowns.saturating_add(1);
        }
    }
}

impl<N: PartialEq> Default for VisibilityDetector<N, ()> {
    fn default() -> Self {
        Self::new(())
    }
}

impl<N, S: IntersectionSource<N>> Drop for VisibilityDetector<N, S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<N: core::fmt::Debug, S: IntersectionSource<N>> core::fmt::Debug
    for VisibilityDetector<N, S>
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VisibilityDetector")
            .field("node", &self.observation.as_ref().map(|o| &o.node))
            .field(
                "intersecting",
                &self.observation.as_ref().and_then(|o| o.intersecting),
            )
            .field("deps", &self.deps)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
