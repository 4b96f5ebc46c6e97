use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use super::{CourseRecord, SeenIds, PLACEHOLDER_URL};
use crate::parser::page::Page;

static CODE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]{4}[0-9]{4}(?:\.[0-9]+)?").unwrap());

/// Strategy D: course codes mined from the rendered page text. Last resort;
/// there is no link or name to pair the code with.
pub fn extract(page: &Page, seen: &mut SeenIds) -> Vec<CourseRecord> {
    let text = page.visible_text();
    let mut records = Vec::new();
    let mut matches = 0usize;

    for m in CODE_TOKEN_RE.find_iter(&text) {
        matches += 1;
        let code = m.as_str();
        if !seen.insert(code.to_string()) {
            continue;
        }
        debug!("  Found code: {}", code);
        records.push(CourseRecord {
            id: code.to_string(),
            name: code.to_string(),
            code: code.to_string(),
            url: PLACEHOLDER_URL.to_string(),
        });
    }

    info!("Searching page text for course codes: {} matches", matches);
    records
}
