pub mod cards;
pub mod links;
pub mod nav;
pub mod text;

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::normalize::{clean_name, extract_code, fallback_code};
use super::page::Page;

/// Path every course detail link carries.
pub const COURSE_VIEW_PATH: &str = "/course/view.php";
/// `url` of records that have no navigable link.
pub const PLACEHOLDER_URL: &str = "#";

/// Fallback code length for heading-titled cards, bare links and text codes.
pub const LONG_FALLBACK: usize = 20;
/// Fallback code length for dashboard cards and navigation links.
pub const SHORT_FALLBACK: usize = 10;

/// Lowercase substrings that mark a label as UI chrome rather than a course.
const BOILERPLATE: &[&str] = &[
    "enter",
    "view",
    "lihat",
    "home",
    "dashboard",
    "notification",
    "starred",
];

static COURSE_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[?&]id=(\d+)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub id: String,
    pub name: String,
    pub code: String,
    pub url: String,
}

/// Ids accepted so far in one run.
pub type SeenIds = HashSet<String>;

/// A strategy scans the page and returns the records it accepted.
type Strategy = fn(&Page, &mut SeenIds) -> Vec<CourseRecord>;

/// Most to least confident. The first tier that yields anything ends the run.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("cards", cards::extract),
    ("navigation", nav::extract),
    ("links", links::extract),
    ("text", text::extract),
];

/// An element provisionally believed to be one course.
#[derive(Debug)]
pub struct Candidate {
    pub raw_name: String,
    pub url: String,
    pub fallback_len: usize,
}

/// Why a candidate was dropped.
#[derive(Debug, Error)]
pub enum Rejection {
    #[error("no title element")]
    MissingTitle,
    #[error("no course link")]
    MissingLink,
    #[error("id {0} already taken")]
    Duplicate(String),
    #[error("label {0:?} too short")]
    TooShort(String),
    #[error("label {0:?} is UI boilerplate")]
    Boilerplate(String),
}

pub fn extract(page: &Page) -> Vec<CourseRecord> {
    let mut seen = SeenIds::new();
    for (name, strategy) in STRATEGIES {
        let records = strategy(page, &mut seen);
        if !records.is_empty() {
            info!("Strategy {}: {} courses", name, records.len());
            return records;
        }
        info!("Strategy {}: nothing found", name);
    }
    Vec::new()
}

/// Course id from the `id=` query parameter, else the URL's last 10 characters.
pub fn course_id_from_url(url: &str) -> String {
    match COURSE_ID_RE.captures(url) {
        Some(caps) => caps[1].to_string(),
        None => {
            let len = url.chars().count();
            url.chars().skip(len.saturating_sub(10)).collect()
        }
    }
}

/// Run the shared filters on a candidate and, if it survives, normalize it
/// into a record and claim its id.
pub fn accept(candidate: Candidate, seen: &mut SeenIds) -> Result<CourseRecord, Rejection> {
    let id = course_id_from_url(&candidate.url);
    if seen.contains(&id) {
        return Err(Rejection::Duplicate(id));
    }
    if candidate.raw_name.chars().count() < 3 {
        return Err(Rejection::TooShort(candidate.raw_name));
    }
    let lower = candidate.raw_name.to_lowercase();
    if BOILERPLATE.iter().any(|b| lower.contains(b)) {
        return Err(Rejection::Boilerplate(candidate.raw_name));
    }

    seen.insert(id.clone());
    let code = extract_code(&candidate.raw_name);
    let name = clean_name(&candidate.raw_name);
    debug!("  Found: {} ({})", name, code.as_deref().unwrap_or("no code"));

    Ok(CourseRecord {
        id,
        code: code.unwrap_or_else(|| fallback_code(&name, candidate.fallback_len)),
        name,
        url: candidate.url,
    })
}

/// Feed one candidate through [`accept`], logging instead of failing.
pub(crate) fn admit(
    candidate: Result<Candidate, Rejection>,
    seen: &mut SeenIds,
    records: &mut Vec<CourseRecord>,
) {
    match candidate.and_then(|c| accept(c, seen)) {
        Ok(record) => records.push(record),
        Err(why) => debug!("  Skipped candidate: {}", why),
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn page(html: &str) -> Page {
        Page::parse(html, Some("https://elearning.ut.ac.id/my/")).unwrap()
    }

    fn fixture(name: &str) -> Page {
        let html = std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap();
        page(&html)
    }

    fn candidate(raw_name: &str, url: &str) -> Candidate {
        Candidate {
            raw_name: raw_name.to_string(),
            url: url.to_string(),
            fallback_len: LONG_FALLBACK,
        }
    }

    #[test]
    fn id_from_query() {
        assert_eq!(course_id_from_url("https://x/course/view.php?id=123"), "123");
        assert_eq!(course_id_from_url("https://x/course/view.php?section=2&id=77"), "77");
    }

    #[test]
    fn id_falls_back_to_url_suffix() {
        assert_eq!(course_id_from_url("https://x/course/view.php?name=abc"), "p?name=abc");
        assert_eq!(course_id_from_url("short"), "short");
        assert_eq!(course_id_from_url("https://x/a?courseid=5"), "courseid=5");
    }

    #[test]
    fn accept_normalizes_label() {
        let mut seen = SeenIds::new();
        let r = accept(
            candidate("MKWN4108.1614 - Pendidikan Kewarganegaraan", "https://x/course/view.php?id=9"),
            &mut seen,
        )
        .unwrap();
        assert_eq!(r.id, "9");
        assert_eq!(r.code, "MKWN4108");
        assert_eq!(r.name, "Pendidikan Kewarganegaraan");
        assert!(seen.contains("9"));
    }

    #[test]
    fn accept_rejects_duplicates_and_noise() {
        let mut seen = SeenIds::new();
        let url = "https://x/course/view.php?id=9";
        assert!(accept(candidate("Hukum Bisnis", url), &mut seen).is_ok());
        assert!(matches!(
            accept(candidate("Other Name", url), &mut seen),
            Err(Rejection::Duplicate(id)) if id == "9"
        ));
        let url = "https://x/course/view.php?id=10";
        assert!(matches!(accept(candidate("AB", url), &mut seen), Err(Rejection::TooShort(_))));
        for label in ["Enter", "View notifications", "Lihat semua", "Dashboard", "Home"] {
            assert!(matches!(
                accept(candidate(label, url), &mut seen),
                Err(Rejection::Boilerplate(_))
            ));
        }
        assert!(!seen.contains("10"));
    }

    #[test]
    fn rejected_candidate_does_not_claim_id() {
        let mut seen = SeenIds::new();
        let url = "https://x/course/view.php?id=3";
        assert!(accept(candidate("Enter course", url), &mut seen).is_err());
        let r = accept(candidate("Akuntansi Biaya", url), &mut seen).unwrap();
        assert_eq!(r.id, "3");
    }

    #[test]
    fn fallback_code_when_label_has_none() {
        let mut seen = SeenIds::new();
        let mut c = candidate("Some Long Course Title Without Any Code", "https://x/course/view.php?id=1");
        let r = accept(c, &mut seen).unwrap();
        assert_eq!(r.code, "Some Long Course Tit");

        c = candidate("Some Long Course Title Without Any Code", "https://x/course/view.php?id=2");
        c.fallback_len = SHORT_FALLBACK;
        let r = accept(c, &mut seen).unwrap();
        assert_eq!(r.code, "Some Long ");
    }

    #[test]
    fn malformed_card_does_not_abort_run() {
        let p = page(
            r#"<body>
            <div class="card"><h3>Akuntansi Biaya</h3>
              <a href="/course/view.php?id=101">Go</a></div>
            <div class="card"><h3>Bahasa Indonesia</h3></div>
            </body>"#,
        );
        let records = extract(&p);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "101");
        assert_eq!(records[0].name, "Akuntansi Biaya");
        assert_eq!(records[0].url, "https://elearning.ut.ac.id/course/view.php?id=101");
    }

    #[test]
    fn cards_shadow_navigation() {
        let p = page(
            r#"<body>
            <nav><a href="/course/view.php?id=7">Statistika Ekonomi ESPA4123</a></nav>
            <div class="card">
              <h3 title="Akuntansi Biaya">Akuntansi Bi...</h3>
              <a href="/course/view.php?id=5">Go</a>
            </div>
            </body>"#,
        );
        let records = extract(&p);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Akuntansi Biaya");
        assert!(records.iter().all(|r| r.id != "7"));
    }

    #[test]
    fn first_duplicate_wins() {
        let p = page(
            r#"<body>
            <div class="card"><h3>Hukum Bisnis</h3><a href="/course/view.php?id=8">Go</a></div>
            <div class="card"><h3>Hukum Pajak</h3><a href="/course/view.php?id=8&amp;section=1">Go</a></div>
            </body>"#,
        );
        let records = extract(&p);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Hukum Bisnis");
    }

    #[test]
    fn boilerplate_titles_never_emitted() {
        let p = page(
            r#"<body>
            <div class="card"><h3>Enter</h3><a href="/course/view.php?id=1">x</a></div>
            <div class="card"><h3>View notifications</h3><a href="/course/view.php?id=2">x</a></div>
            <a href="/course/view.php?id=3">Enter</a>
            <a href="/course/view.php?id=4">View notifications</a>
            </body>"#,
        );
        assert!(extract(&p).is_empty());
    }

    #[test]
    fn no_courses_is_empty_not_error() {
        assert!(extract(&page("<body><p>Selamat datang</p></body>")).is_empty());
    }

    #[test]
    fn dashboard_fixture() {
        let records = extract(&fixture("dashboard"));
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["2101", "2102", "2103"]);
        assert_eq!(records[0].code, "MKWN4108");
        assert_eq!(records[0].name, "Pendidikan Kewarganegaraan");
        assert_eq!(records[1].name, "Akuntansi Biaya");
        assert_eq!(records[1].code, "EKMA4315");
        assert_eq!(records[2].name, "Bahasa Inggris Niaga");
        assert_eq!(records[2].code, "Bahasa Ing");
    }

    #[test]
    fn sidebar_fixture() {
        let records = extract(&fixture("sidebar"));
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["31", "32", "33"]);
        assert_eq!(records[0].name, "Pengantar Statistika");
        assert_eq!(records[0].code, "SATS4121");
        assert_eq!(records[1].name, "Manajemen Keuangan");
        assert_eq!(records[2].name, "Hukum Bisnis");
        assert_eq!(records[2].code, "Hukum Bisn");
    }

    #[test]
    fn text_fixture() {
        let records = extract(&fixture("transcript"));
        let codes: Vec<&str> = records.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, ["PDGK4101", "MKDU4111"]);
        assert!(records.iter().all(|r| r.url == PLACEHOLDER_URL && r.name == r.code && r.id == r.code));
    }
}
