use std::sync::LazyLock;

use scraper::{ElementRef, Selector};
use tracing::info;

use super::{admit, Candidate, CourseRecord, SeenIds, COURSE_VIEW_PATH, SHORT_FALLBACK};
use crate::parser::page::{attr_of, text_of, Page};

static NAV_LINK_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        r#"nav a, .navigation a, aside a, .sidebar a, .block_mycourses a, [data-block="mycourses"] a"#,
    )
    .unwrap()
});
static NAME_CHILD_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".coursename, .multiline").unwrap());

/// Strategy B: course links inside navigation drawers and sidebars.
pub fn extract(page: &Page, seen: &mut SeenIds) -> Vec<CourseRecord> {
    let links: Vec<ElementRef<'_>> = page.html.select(&NAV_LINK_SEL).collect();
    info!("Checking navigation links: {} found", links.len());

    let mut records = Vec::new();
    for link in links {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let url = page.resolve_href(href);
        if !url.contains(COURSE_VIEW_PATH) {
            continue;
        }
        let candidate = Candidate {
            raw_name: link_name(link),
            url,
            fallback_len: SHORT_FALLBACK,
        };
        admit(Ok(candidate), seen, &mut records);
    }
    records
}

/// First non-empty of: `title`, `aria-label`, the parent's `title`, a nested
/// name element, the anchor's own text.
fn link_name(link: ElementRef<'_>) -> String {
    attr_of(link, "title")
        .or_else(|| attr_of(link, "aria-label"))
        .or_else(|| {
            link.parent()
                .and_then(ElementRef::wrap)
                .and_then(|parent| attr_of(parent, "title"))
        })
        .or_else(|| {
            link.select(&NAME_CHILD_SEL)
                .map(text_of)
                .find(|t| !t.is_empty())
        })
        .unwrap_or_else(|| text_of(link))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(html: &str) -> Vec<String> {
        let page = Page::parse(html, Some("https://elearning.ut.ac.id/")).unwrap();
        let link = page.html.select(&NAV_LINK_SEL).next().unwrap();
        vec![link_name(link)]
    }

    #[test]
    fn name_resolution_order() {
        assert_eq!(
            names(r#"<nav><a title="T" aria-label="A" href="x">X</a></nav>"#),
            ["T"]
        );
        assert_eq!(names(r#"<nav><a aria-label="A" href="x">X</a></nav>"#), ["A"]);
        assert_eq!(
            names(r#"<nav><span title="P"><a title=" " href="x">X</a></span></nav>"#),
            ["P"]
        );
        assert_eq!(
            names(r#"<nav><a href="x"><i></i><span class="multiline"> N </span></a></nav>"#),
            ["N"]
        );
        assert_eq!(names(r#"<nav><a href="x"> Plain </a></nav>"#), ["Plain"]);
    }

    #[test]
    fn only_course_view_links() {
        let page = Page::parse(
            r#"<body><aside>
              <a href="/grade/report/overview/index.php">Nilai Semester</a>
              <a href="/course/view.php?id=41">Ekonomi Koperasi</a>
            </aside>
            <main><a href="/course/view.php?id=42">Tidak di sidebar</a></main></body>"#,
            Some("https://elearning.ut.ac.id/my/"),
        )
        .unwrap();
        let r = extract(&page, &mut SeenIds::new());
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].id, "41");
        assert_eq!(r[0].url, "https://elearning.ut.ac.id/course/view.php?id=41");
        assert_eq!(r[0].code, "Ekonomi Ko");
    }
}
