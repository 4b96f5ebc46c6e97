use std::sync::LazyLock;

use regex::Regex;

// Codes are ASCII: `[0-9]` and `(?-u:\b)` keep Unicode digits and letters out.

static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u:\b)([A-Z]{4}[0-9]{4})(?:\.[0-9]+)?(?-u:\b)").unwrap());
static STARRED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Course is starred\s*").unwrap());
static COURSE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Course name\s*").unwrap());
static LEADING_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{4}[0-9]{4}(?:\.[0-9]+)?\s*[-:.]?\s*").unwrap());
static ANY_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u:\b)[A-Z]{4}[0-9]{4}(?:\.[0-9]+)?(?-u:\b)").unwrap());
static TRAILING_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+[0-9]+$").unwrap());
static TRAILING_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[-:]\s*$").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// First course code in `text`, without its `.NNNN` revision suffix.
///
/// `"MKWN4108.1614"` → `Some("MKWN4108")`.
pub fn extract_code(text: &str) -> Option<String> {
    CODE_RE.captures(text).map(|caps| caps[1].to_string())
}

/// Reduce a raw course label to a display name.
///
/// Steps run in a fixed order: screen-reader prefixes, then a leading code
/// with its separator, then any stray code, then trailing numbers and
/// dangling separators. An empty result means the label carried no name.
pub fn clean_name(text: &str) -> String {
    let name = STARRED_RE.replace(text, "");
    let name = COURSE_NAME_RE.replace(name.trim(), "");
    let name = LEADING_CODE_RE.replace(name.trim(), "");
    let name = ANY_CODE_RE.replace_all(name.trim(), "");
    let name = TRAILING_NUMBER_RE.replace(name.trim(), "");
    let name = TRAILING_SEPARATOR_RE.replace(name.trim(), "");
    WHITESPACE_RE.replace_all(name.trim(), " ").trim().to_string()
}

/// Stand-in code when a label has none: the first `len` characters of the name.
pub fn fallback_code(name: &str, len: usize) -> String {
    name.chars().take(len).collect()
}
