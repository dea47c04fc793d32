// Example: page through an in-memory catalog by scrolling to the last row.
use bookscroll::{BookRecord, Page, PageRequest, Pager, PagerOptions, Span, VisibilityDetector};

const CATALOG: [&str; 7] = [
    "Dune",
    "Hyperion",
    "Solaris",
    "Ubik",
    "Neuromancer",
    "Foundation",
    "Kindred",
];
const PAGE_SIZE: usize = 3;
const VIEWPORT: u32 = 4;

fn fetch(request: &PageRequest) -> Page {
    let books = CATALOG
        .iter()
        .enumerate()
        .skip(request.offset as usize)
        .take(PAGE_SIZE)
        .filter_map(|(i, title)| BookRecord::new(format!("/works/OL{i}W"), *title, None).ok())
        .collect();
    Page::new(books)
}

fn main() {
    let mut pager = Pager::new(PagerOptions::new("Science Fiction"));
    let mut detector = VisibilityDetector::<String>::default();

    let mut request = pager.mount();
    while let Some(r) = request.take() {
        let completion = pager.complete(&r, Ok(fetch(&r)));
        println!("offset={} items={} {completion:?}", r.offset, pager.items().len());

        // Re-render: bind the last row, then scroll it to the bottom of the viewport.
        detector.sync(pager.last_key().map(str::to_owned), pager.revision());
        let Some(last) = detector.node().cloned() else {
            break;
        };
        let rows = pager.items().len() as u64;
        let item = Span::new(rows - 1, 1);
        let viewport = Span::new(rows.saturating_sub(VIEWPORT as u64), VIEWPORT);
        if let Some(visible) = detector.on_geometry(&last, item, viewport) {
            request = pager.on_visibility(visible);
        }
    }

    println!("exhausted={} offset={}", pager.is_exhausted(), pager.offset());
    for book in pager.items() {
        println!("{} {}", book.key(), book.title());
    }
}
