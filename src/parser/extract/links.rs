use std::sync::LazyLock;

use scraper::Selector;
use tracing::info;

use super::{admit, Candidate, CourseRecord, SeenIds, LONG_FALLBACK};
use crate::parser::page::{text_of, Page};

static COURSE_LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href*="/course/view.php"]"#).unwrap());

/// Strategy C: every course link on the page, anchor text as the label.
pub fn extract(page: &Page, seen: &mut SeenIds) -> Vec<CourseRecord> {
    let mut records = Vec::new();
    let mut total = 0usize;

    for link in page.html.select(&COURSE_LINK_SEL) {
        total += 1;
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let candidate = Candidate {
            raw_name: text_of(link),
            url: page.resolve_href(href),
            fallback_len: LONG_FALLBACK,
        };
        admit(Ok(candidate), seen, &mut records);
    }

    info!("Checking all course links: {} found", total);
    records
}
