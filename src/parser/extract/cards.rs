use std::sync::LazyLock;

use scraper::{ElementRef, Selector};
use tracing::info;

use super::{admit, Candidate, CourseRecord, Rejection, SeenIds, LONG_FALLBACK, SHORT_FALLBACK};
use crate::parser::page::{attr_of, text_of, Page};

static CARD_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#".card, .coursebox, [class*="course"]"#).unwrap());

/// Title guesses, most specific first.
static TITLE_SELS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    ["h3", ".coursename", ".multiline", r#"[role="heading"]"#]
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});

static LINK_SELS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [r#"a[href*="/course/view.php"]"#, r#"a[href*="id="]"#]
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});

static ACTION_MARKER_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[data-action="view-course"]"#).unwrap());
static COURSE_LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href*="/course/view.php"]"#).unwrap());

/// Where a card's label came from. Dashboard cards often have no title
/// element and carry the name on the link or an action marker instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TitleSource {
    Heading,
    ActionMarker,
    CourseLink,
}

impl TitleSource {
    fn fallback_len(self) -> usize {
        match self {
            TitleSource::Heading => LONG_FALLBACK,
            TitleSource::ActionMarker | TitleSource::CourseLink => SHORT_FALLBACK,
        }
    }
}

/// Strategy A: course tiles pairing a title with a course link.
pub fn extract(page: &Page, seen: &mut SeenIds) -> Vec<CourseRecord> {
    let cards: Vec<ElementRef<'_>> = page.html.select(&CARD_SEL).collect();
    info!("Checking course cards: {} potential", cards.len());

    let mut records = Vec::new();
    for card in cards {
        admit(card_candidate(page, card), seen, &mut records);
    }
    records
}

fn card_candidate(page: &Page, card: ElementRef<'_>) -> Result<Candidate, Rejection> {
    let (raw_name, source) = card_title(card).ok_or(Rejection::MissingTitle)?;
    let link = first_match(card, &LINK_SELS).ok_or(Rejection::MissingLink)?;
    let href = link.value().attr("href").ok_or(Rejection::MissingLink)?;

    Ok(Candidate {
        raw_name,
        url: page.resolve_href(href),
        fallback_len: source.fallback_len(),
    })
}

fn card_title(card: ElementRef<'_>) -> Option<(String, TitleSource)> {
    if let Some(el) = first_match(card, &TITLE_SELS) {
        return Some((title_or_text(el), TitleSource::Heading));
    }
    if let Some(el) = card.select(&ACTION_MARKER_SEL).next() {
        return Some((title_or_text(el), TitleSource::ActionMarker));
    }
    card.select(&COURSE_LINK_SEL)
        .next()
        .map(|el| (title_or_text(el), TitleSource::CourseLink))
}

/// The `title` attribute usually holds the untruncated name.
fn title_or_text(el: ElementRef<'_>) -> String {
    attr_of(el, "title").unwrap_or_else(|| text_of(el))
}

fn first_match<'a>(el: ElementRef<'a>, sels: &[Selector]) -> Option<ElementRef<'a>> {
    sels.iter().find_map(|sel| el.select(sel).next())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(html: &str) -> Vec<CourseRecord> {
        let page = Page::parse(html, Some("https://elearning.ut.ac.id/my/")).unwrap();
        extract(&page, &mut SeenIds::new())
    }

    #[test]
    fn heading_title_attribute_preferred() {
        let r = run(r#"<div class="card">
            <h3 title="PDGK4101 Pembelajaran Terpadu">PDGK4101 Pembela...</h3>
            <a href="/course/view.php?id=11">Go</a></div>"#);
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].name, "Pembelajaran Terpadu");
        assert_eq!(r[0].code, "PDGK4101");
    }

    #[test]
    fn generic_id_link_accepted() {
        let r = run(r#"<div class="coursebox">
            <span class="coursename">Sosiologi Pedesaan</span>
            <a href="/enrol/index.php?id=12">Go</a></div>"#);
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].id, "12");
        assert_eq!(r[0].url, "https://elearning.ut.ac.id/enrol/index.php?id=12");
        assert_eq!(r[0].code, "Sosiologi Pedesaan");
    }

    #[test]
    fn aria_heading_role() {
        let r = run(r#"<div class="card">
            <div role="heading">Teori Akuntansi</div>
            <a href="/course/view.php?id=13">Go</a></div>"#);
        assert_eq!(r[0].name, "Teori Akuntansi");
    }

    #[test]
    fn action_marker_uses_short_fallback() {
        let r = run(r#"<div class="card">
            <a data-action="view-course" href="/course/view.php?id=14"
               title="Bahasa Inggris Niaga">img</a></div>"#);
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].name, "Bahasa Inggris Niaga");
        assert_eq!(r[0].code, "Bahasa Ing");
    }

    #[test]
    fn bare_course_link_as_title() {
        let r = run(r#"<div class="card">
            <a href="/course/view.php?id=15">Pengantar Ilmu Ekonomi</a></div>"#);
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].name, "Pengantar Ilmu Ekonomi");
        assert_eq!(r[0].code, "Pengantar ");
    }

    #[test]
    fn title_without_link_rejected() {
        let page = Page::parse(r#"<div class="card"><h3>Tanpa Tautan</h3></div>"#, None).unwrap();
        let card = page.html.select(&CARD_SEL).next().unwrap();
        assert!(matches!(card_candidate(&page, card), Err(Rejection::MissingLink)));
    }

    #[test]
    fn empty_card_rejected() {
        let page = Page::parse(r#"<div class="card"><p>Kosong</p></div>"#, None).unwrap();
        let card = page.html.select(&CARD_SEL).next().unwrap();
        assert!(matches!(card_candidate(&page, card), Err(Rejection::MissingTitle)));
    }
}
