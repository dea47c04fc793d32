use crate::*;

use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn book(key: &str) -> BookRecord {
    BookRecord::new(key, key.to_uppercase(), None).unwrap()
}

fn page(keys: &[&str]) -> Page {
    Page::new(keys.iter().map(|k| book(k)).collect())
}

fn keys(p: &Pager) -> Vec<&str> {
    p.items().iter().map(BookRecord::key).collect()
}

#[derive(Default)]
struct CountingSource {
    observed: Vec<String>,
    unobserved: Vec<String>,
}

impl IntersectionSource<String> for CountingSource {
    fn observe(&mut self, node: &String) {
        self.observed.push(node.clone());
    }

    fn unobserve(&mut self, node: &String) {
        self.unobserved.push(node.clone());
    }
}

#[test]
fn raw_record_with_subtitle_and_description() {
    let raw = RawBook {
        key: "/works/OL1W".to_string(),
        title: Some("Dune".to_string()),
        subtitle: Some("Book One".to_string()),
        description: Some(RawDescription::Text {
            value: "desc".to_string(),
        }),
    };
    let b = BookRecord::from_raw(raw).unwrap();
    assert_eq!(b.key(), "/works/OL1W");
    assert_eq!(b.title(), "Dune Book One");
    assert_eq!(b.description(), Some("desc"));
}

#[test]
fn raw_record_without_subtitle_or_description() {
    let raw = RawBook {
        key: "/works/OL2W".to_string(),
        title: Some("X".to_string()),
        subtitle: None,
        description: None,
    };
    let b = BookRecord::from_raw(raw).unwrap();
    assert_eq!(b.title(), "X");
    assert_eq!(b.description(), None);
}

#[test]
fn raw_record_plain_description_and_empty_subtitle() {
    let raw = RawBook {
        key: "k".to_string(),
        title: Some("Title".to_string()),
        subtitle: Some(String::new()),
        description: Some(RawDescription::Plain("plain".to_string())),
    };
    let b = BookRecord::from_raw(raw).unwrap();
    assert_eq!(b.title(), "Title");
    assert_eq!(b.description(), Some("plain"));
}

#[test]
fn invalid_raw_records_are_rejected() {
    let no_title = RawBook {
        key: "k".to_string(),
        ..Default::default()
    };
    assert_eq!(
        BookRecord::from_raw(no_title),
        Err(InvalidRecord::MissingTitle)
    );

    let no_key = RawBook {
        title: Some("T".to_string()),
        ..Default::default()
    };
    assert_eq!(BookRecord::from_raw(no_key), Err(InvalidRecord::EmptyKey));
}

#[test]
fn page_from_raw_counts_rejected_records() {
    let raw = vec![
        RawBook {
            key: "a".to_string(),
            title: Some("A".to_string()),
            ..Default::default()
        },
        RawBook {
            key: "b".to_string(),
            title: None,
            ..Default::default()
        },
        RawBook {
            key: "c".to_string(),
            title: Some("C".to_string()),
            ..Default::default()
        },
    ];
    let p = Page::from_raw(raw);
    assert_eq!(p.received, 3);
    let keys: Vec<_> = p.books.iter().map(BookRecord::key).collect();
    assert_eq!(keys, ["a", "c"]);
}

#[test]
fn mount_issues_exactly_one_request_for_page_zero() {
    let mut p = Pager::new(PagerOptions::new("Fantasy"));
    assert!(!p.is_loading());

    let req = p.mount().unwrap();
    assert_eq!(req.subject, "Fantasy");
    assert_eq!(req.offset, 0);
    assert!(p.is_loading());

    assert_eq!(p.mount(), None);
    assert_eq!(p.on_visibility(true), None);
}

#[test]
fn visibility_before_mount_does_nothing() {
    let mut p = Pager::new(PagerOptions::new("Fantasy"));
    assert_eq!(p.on_visibility(true), None);
    assert_eq!(p.load_next(), None);
}

#[test]
fn offset_is_the_sum_of_received_page_sizes() {
    let mut p = Pager::new(PagerOptions::new("Fantasy"));
    let sizes = [3usize, 5, 1, 4];
    let mut req = p.mount().unwrap();
    let mut expected = 0u64;
    for (n, &size) in sizes.iter().enumerate() {
        assert_eq!(req.offset, expected);
        let books: Vec<_> = (0..size)
            .map(|i| book(&alloc::format!("p{n}-{i}")))
            .collect();
        assert_eq!(
            p.complete(&req, Ok(Page::new(books))),
            Completion::Applied { received: size }
        );
        expected += size as u64;
        assert_eq!(p.offset(), expected);
        assert!(!p.is_loading());
        if n + 1 < sizes.len() {
            req = p.on_visibility(true).unwrap();
        }
    }
    assert_eq!(p.items().len() as u64, expected);
}

#[test]
fn pages_append_in_order_and_preserve_identity() {
    let mut p = Pager::new(PagerOptions::new("Fantasy"));
    let r0 = p.mount().unwrap();
    p.complete(&r0, Ok(page(&["a", "b"])));
    let first = p.items()[0].clone();

    let r1 = p.on_visibility(true).unwrap();
    assert_eq!(r1.offset, 2);
    p.complete(&r1, Ok(page(&["c", "d"])));
    assert_eq!(keys(&p), ["a", "b", "c", "d"]);
    assert_eq!(p.items()[0], first);
    assert_eq!(p.last_key(), Some("d"));
}

#[test]
fn offset_follows_received_count_not_kept_books() {
    let mut p = Pager::new(PagerOptions::new("Fantasy"));
    let r0 = p.mount().unwrap();
    let mut pg = page(&["a"]);
    pg.received = 2;
    p.complete(&r0, Ok(pg));
    assert_eq!(p.offset(), 2);
    assert_eq!(p.items().len(), 1);
}

#[test]
fn at_most_one_request_while_in_flight() {
    let mut p = Pager::new(PagerOptions::new("Fantasy"));
    let r0 = p.mount().unwrap();
    p.complete(&r0, Ok(page(&["a"])));

    let r1 = p.on_visibility(true);
    assert!(r1.is_some());
    assert_eq!(p.on_visibility(true), None);
    assert_eq!(p.on_visibility(false), None);
    assert_eq!(p.on_visibility(true), None);
}

#[test]
fn invisible_trigger_is_ignored() {
    let mut p = Pager::new(PagerOptions::new("Fantasy"));
    let r0 = p.mount().unwrap();
    p.complete(&r0, Ok(page(&["a"])));
    assert_eq!(p.on_visibility(false), None);
    assert!(!p.is_loading());
}

#[test]
fn subject_change_resets_and_reloads_page_zero() {
    let mut p = Pager::new(PagerOptions::new("Fantasy"));
    let r0 = p.mount().unwrap();
    p.complete(&r0, Ok(page(&["a", "b"])));
    assert_eq!(p.offset(), 2);

    let r1 = p.set_subject("Horror").unwrap();
    assert_eq!(r1.subject, "Horror");
    assert_eq!(r1.offset, 0);
    assert!(p.items().is_empty());
    assert_eq!(p.offset(), 0);
    assert!(p.is_loading());
    assert_eq!(p.subject(), "Horror");

    p.complete(&r1, Ok(page(&["h"])));
    assert_eq!(keys(&p), ["h"]);
    assert_eq!(p.offset(), 1);
}

#[test]
fn same_subject_is_a_no_op() {
    let mut p = Pager::new(PagerOptions::new("Fantasy"));
    let r0 = p.mount().unwrap();
    p.complete(&r0, Ok(page(&["a"])));
    assert_eq!(p.set_subject("Fantasy"), None);
    assert_eq!(keys(&p), ["a"]);
}

#[test]
fn subject_change_before_mount_only_replaces_subject() {
    let mut p = Pager::new(PagerOptions::new("Fantasy"));
    assert_eq!(p.set_subject("Horror"), None);
    let r = p.mount().unwrap();
    assert_eq!(r.subject, "Horror");
}

#[test]
fn results_for_a_previous_subject_are_stale() {
    let mut p = Pager::new(PagerOptions::new("Fantasy"));
    let old = p.mount().unwrap();
    let new = p.set_subject("Horror").unwrap();

    assert_eq!(p.complete(&old, Ok(page(&["f"]))), Completion::Stale);
    assert!(p.items().is_empty());
    assert!(p.is_loading());

    assert_eq!(
        p.complete(&new, Ok(page(&["h"]))),
        Completion::Applied { received: 1 }
    );
    assert_eq!(keys(&p), ["h"]);
}

#[test]
fn out_of_order_resolution_cannot_overwrite_newer_state() {
    let mut p = Pager::new(PagerOptions::new("A"));
    let a = p.mount().unwrap();
    let b = p.set_subject("B").unwrap();
    let c = p.set_subject("C").unwrap();
    assert!(a.seq < b.seq && b.seq < c.seq);

    // Fast later request resolves first, then the slow earlier ones.
    assert_eq!(
        p.complete(&c, Ok(page(&["c"]))),
        Completion::Applied { received: 1 }
    );
    assert_eq!(p.complete(&b, Ok(page(&["b"]))), Completion::Stale);
    assert_eq!(p.complete(&a, Ok(page(&["a"]))), Completion::Stale);
    assert_eq!(keys(&p), ["c"]);
    assert_eq!(p.offset(), 1);
}

#[test]
fn completing_twice_is_stale() {
    let mut p = Pager::new(PagerOptions::new("Fantasy"));
    let r0 = p.mount().unwrap();
    p.complete(&r0, Ok(page(&["a"])));
    assert_eq!(p.complete(&r0, Ok(page(&["a"]))), Completion::Stale);
    assert_eq!(p.offset(), 1);
}

#[test]
fn failure_clears_loading_and_is_retryable() {
    let mut p = Pager::new(PagerOptions::new("Fantasy"));
    let r0 = p.mount().unwrap();
    p.complete(&r0, Ok(page(&["a"])));

    let r1 = p.on_visibility(true).unwrap();
    assert_eq!(
        p.complete(&r1, Err(LoadError::network("connection reset"))),
        Completion::Failed
    );
    assert!(!p.is_loading());
    assert_eq!(p.error().map(|e| e.kind), Some(LoadErrorKind::Network));
    assert_eq!(p.offset(), 1);

    // Scrolling does not hammer a failing endpoint.
    assert_eq!(p.on_visibility(true), None);

    let r2 = p.retry().unwrap();
    assert_eq!(r2.offset, 1);
    assert!(p.error().is_none());
    assert!(p.is_loading());
    p.complete(&r2, Ok(page(&["b"])));
    assert_eq!(keys(&p), ["a", "b"]);
}

#[test]
fn retry_without_error_does_nothing() {
    let mut p = Pager::new(PagerOptions::new("Fantasy"));
    assert_eq!(p.retry(), None);
    let r0 = p.mount().unwrap();
    assert_eq!(p.retry(), None);
    p.complete(&r0, Err(LoadError::parse("expected array")));
    assert!(p.retry().is_some());
}

#[test]
fn subject_change_clears_pending_error() {
    let mut p = Pager::new(PagerOptions::new("Fantasy"));
    let r0 = p.mount().unwrap();
    p.complete(&r0, Err(LoadError::parse("bad json")));
    assert!(p.error().is_some());
    p.set_subject("Horror").unwrap();
    assert!(p.error().is_none());
}

#[test]
fn empty_page_exhausts_the_list() {
    let mut p = Pager::new(PagerOptions::new("Fantasy"));
    let r0 = p.mount().unwrap();
    p.complete(&r0, Ok(page(&["a"])));
    let r1 = p.on_visibility(true).unwrap();
    p.complete(&r1, Ok(Page::default()));
    assert!(p.is_exhausted());
    assert_eq!(p.offset(), 1);
    assert_eq!(p.on_visibility(true), None);

    // A new subject starts over.
    assert!(p.set_subject("Horror").is_some());
    assert!(!p.is_exhausted());
}

#[test]
fn empty_page_keeps_loading_without_stop_at_end() {
    let mut p = Pager::new(PagerOptions::new("Fantasy").with_stop_at_end(false));
    let r0 = p.mount().unwrap();
    p.complete(&r0, Ok(Page::default()));
    assert!(p.is_exhausted());
    let r1 = p.on_visibility(true).unwrap();
    assert_eq!(r1.offset, 0);

    // A non-empty page clears the flag again.
    p.complete(&r1, Ok(page(&["a"])));
    assert!(!p.is_exhausted());
    assert_eq!(p.offset(), 1);
}

#[test]
fn on_change_is_called_and_batched() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut p = Pager::new(PagerOptions::new("Fantasy").with_on_change(Some({
        let calls = Arc::clone(&calls);
        move |_: &Pager| {
            calls.fetch_add(1, Ordering::Relaxed);
        }
    })));

    let r0 = p.mount().unwrap();
    assert_eq!(calls.load(Ordering::Relaxed), 1);
    p.complete(&r0, Ok(page(&["a"])));
    assert_eq!(calls.load(Ordering::Relaxed), 2);

    p.batch_update(|p| {
        let r = p.on_visibility(true).unwrap();
        p.complete(&r, Ok(page(&["b"])));
    });
    assert_eq!(calls.load(Ordering::Relaxed), 3);
}

#[test]
fn on_change_sees_updated_state() {
    let seen = Arc::new(Mutex::new(Vec::<(u64, bool)>::new()));
    let mut p = Pager::new(PagerOptions::new("Fantasy"));
    p.set_on_change(Some({
        let seen = Arc::clone(&seen);
        move |p: &Pager| seen.lock().unwrap().push((p.offset(), p.is_loading()))
    }));
    let r0 = p.mount().unwrap();
    p.complete(&r0, Ok(page(&["a", "b"])));
    assert_eq!(
        *seen.lock().unwrap(),
        [(0u64, false), (0, true), (2, false)]
    );
}

#[test]
fn revision_tracks_list_changes() {
    let mut p = Pager::new(PagerOptions::new("Fantasy"));
    let r0 = p.mount().unwrap();
    let before = p.revision();
    p.complete(&r0, Ok(page(&["a"])));
    assert_ne!(p.revision(), before);

    let r1 = p.on_visibility(true).unwrap();
    let before = p.revision();
    p.complete(&r1, Err(LoadError::network("timeout")));
    assert_eq!(p.revision(), before);
}

#[test]
fn span_intersection() {
    let view = Span::new(10, 10);
    assert!(Span::new(15, 2).intersects(&view));
    assert!(Span::new(5, 6).intersects(&view));
    assert!(Span::new(19, 5).intersects(&view));
    assert!(!Span::new(20, 5).intersects(&view));
    assert!(!Span::new(0, 10).intersects(&view));
    assert!(Span::new(10, 0).intersects(&view));
    assert!(!Span::new(20, 0).intersects(&view));
    assert!(!Span::new(10, 5).intersects(&Span::new(10, 0)));
}

#[test]
fn detector_fires_once_per_crossing() {
    let fired = Arc::new(Mutex::new(Vec::new()));
    let mut d = VisibilityDetector::<String>::default().with_on_change(Some({
        let fired = Arc::clone(&fired);
        move |v: bool| fired.lock().unwrap().push(v)
    }));
    let node = "a".to_string();
    d.rebind(Some(node.clone()));
    assert_eq!(d.is_intersecting(), None);

    assert_eq!(d.on_intersection(&node, false), Some(false));
    assert_eq!(d.on_intersection(&node, false), None);
    assert_eq!(d.on_intersection(&node, true), Some(true));
    assert_eq!(d.on_intersection(&node, true), None);
    assert_eq!(d.on_intersection(&node, false), Some(false));
    assert_eq!(*fired.lock().unwrap(), [false, true, false]);
}

#[test]
fn detector_never_holds_more_than_one_observation() {
    let mut d = VisibilityDetector::new(CountingSource::default());
    for key in ["a", "b", "c", "d"] {
        d.rebind(Some(key.to_string()));
        let stats = d.stats();
        assert_eq!(stats.teardowns, stats.binds - 1);
        assert_eq!(stats.active(), 1);
    }
    assert_eq!(d.source().observed, ["a", "b", "c", "d"]);
    assert_eq!(d.source().unobserved, ["a", "b", "c"]);
}

#[test]
fn rebinding_the_same_node_is_a_no_op() {
    let mut d = VisibilityDetector::new(CountingSource::default());
    d.rebind(Some("a".to_string()));
    d.rebind(Some("a".to_string()));
    assert_eq!(d.stats(), ObserverStats { binds: 1, teardowns: 0 });
}

#[test]
fn null_rebind_tears_down_without_binding() {
    let mut d = VisibilityDetector::new(CountingSource::default());
    d.rebind(Some("a".to_string()));
    d.rebind(None);
    assert_eq!(d.node(), None);
    assert_eq!(d.stats().active(), 0);
    assert_eq!(d.source().unobserved, ["a"]);

    d.rebind(None);
    assert_eq!(d.stats().teardowns, 1);
    assert_eq!(d.on_intersection(&"a".to_string(), true), None);
}

#[test]
fn reports_for_previous_node_are_dropped() {
    let mut d = VisibilityDetector::<String>::default();
    let a = "a".to_string();
    let b = "b".to_string();
    d.rebind(Some(a.clone()));
    d.rebind(Some(b.clone()));
    assert_eq!(d.on_intersection(&a, true), None);
    assert_eq!(d.on_intersection(&b, true), Some(true));
}

#[test]
fn dependency_change_re_establishes_observation() {
    let mut d = VisibilityDetector::new(CountingSource::default());
    let a = "a".to_string();
    d.rebind(Some(a.clone()));
    assert_eq!(d.on_intersection(&a, true), Some(true));

    d.set_dependencies(7);
    assert_eq!(d.stats(), ObserverStats { binds: 2, teardowns: 1 });
    assert_eq!(d.is_intersecting(), None);
    assert_eq!(d.on_intersection(&a, true), Some(true));

    d.set_dependencies(7);
    assert_eq!(d.stats().binds, 2);
}

#[test]
fn sync_rebinds_on_node_change_and_refreshes_on_stamp_change() {
    let mut d = VisibilityDetector::new(CountingSource::default());
    d.sync(Some("a".to_string()), 1);
    d.sync(Some("a".to_string()), 1);
    assert_eq!(d.stats(), ObserverStats { binds: 1, teardowns: 0 });

    d.sync(Some("a".to_string()), 2);
    assert_eq!(d.stats(), ObserverStats { binds: 2, teardowns: 1 });

    d.sync(Some("b".to_string()), 3);
    assert_eq!(d.stats(), ObserverStats { binds: 3, teardowns: 2 });
    assert_eq!(d.dependencies(), 3);

    d.sync(None, 4);
    assert_eq!(d.stats().active(), 0);
}

#[test]
fn dependency_change_while_unbound_only_records_stamp() {
    let mut d = VisibilityDetector::new(CountingSource::default());
    d.set_dependencies(3);
    assert_eq!(d.dependencies(), 3);
    assert_eq!(d.stats(), ObserverStats::default());
}

#[test]
fn drop_disposes_active_observation() {
    struct Shared(Arc<Mutex<Vec<&'static str>>>);
    impl IntersectionSource<&'static str> for Shared {
        fn observe(&mut self, node: &&'static str) {
            self.0.lock().unwrap().push(*node);
        }
        fn unobserve(&mut self, _node: &&'static str) {
            self.0.lock().unwrap().push("unobserve");
        }
    }

    let log = Arc::new(Mutex::new(Vec::new()));
    {
        let mut d = VisibilityDetector::new(Shared(Arc::clone(&log)));
        d.rebind(Some("a"));
    }
    assert_eq!(*log.lock().unwrap(), ["a", "unobserve"]);
}

#[test]
fn geometry_reports_drive_crossings() {
    let mut d = VisibilityDetector::<u32>::default();
    d.rebind(Some(9));
    let item = Span::new(90, 10);
    assert_eq!(d.on_geometry(&9, item, Span::new(0, 50)), Some(false));
    assert_eq!(d.on_geometry(&9, item, Span::new(20, 50)), None);
    assert_eq!(d.on_geometry(&9, item, Span::new(60, 50)), Some(true));
}

#[test]
fn detector_drives_pager_end_to_end() {
    let mut p = Pager::new(PagerOptions::new("Fantasy"));
    let mut d = VisibilityDetector::new(CountingSource::default());
    let mut fetches = Vec::new();

    let r0 = p.mount().unwrap();
    fetches.push((r0.subject.clone(), r0.offset));
    p.complete(&r0, Ok(page(&["a", "b", "c"])));

    // Render: bind the last item.
    d.sync(p.last_key().map(String::from), p.revision());
    assert_eq!(d.node().map(String::as_str), Some("c"));

    // Last item is below the fold, then scrolled into view.
    assert_eq!(d.on_intersection(&"c".to_string(), false), Some(false));
    if let Some(v) = d.on_intersection(&"c".to_string(), true) {
        let r = p.on_visibility(v).unwrap();
        fetches.push((r.subject.clone(), r.offset));
        p.complete(&r, Ok(page(&["d", "e"])));
    }

    d.sync(p.last_key().map(String::from), p.revision());
    assert_eq!(keys(&p), ["a", "b", "c", "d", "e"]);
    assert_eq!(
        fetches,
        [("Fantasy".to_string(), 0), ("Fantasy".to_string(), 3)]
    );
    assert_eq!(d.source().unobserved, ["c"]);
    assert_eq!(d.stats().active(), 1);
}
