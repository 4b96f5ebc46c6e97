use scraper::node::Node;
use scraper::{ElementRef, Html};
use thiserror::Error;
use url::Url;

/// Tags whose text never reaches the rendered page.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Tags that end a line of rendered text.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol",
    "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Failures that abort a whole extraction run.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("page is empty; nothing to scan for courses")]
    EmptyDocument,
    #[error("invalid page url {url:?}: {source}")]
    InvalidPageUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// A parsed page plus the address its relative links resolve against.
pub struct Page {
    pub html: Html,
    pub base: Option<Url>,
}

impl Page {
    pub fn parse(html: &str, page_url: Option<&str>) -> Result<Self, ExtractError> {
        if html.trim().is_empty() {
            return Err(ExtractError::EmptyDocument);
        }
        let base = page_url
            .map(|u| {
                Url::parse(u).map_err(|source| ExtractError::InvalidPageUrl {
                    url: u.to_string(),
                    source,
                })
            })
            .transpose()?;
        Ok(Page {
            html: Html::parse_document(html),
            base,
        })
    }

    /// Absolute form of an `href`, the way a browser reports `anchor.href`.
    /// Without a base URL (or when joining fails) the attribute is kept as is.
    pub fn resolve_href(&self, href: &str) -> String {
        let href = href.trim();
        self.base
            .as_ref()
            .and_then(|base| base.join(href).ok())
            .map(String::from)
            .unwrap_or_else(|| href.to_string())
    }

    /// Rendered text of `<body>`: script/style content and `hidden`
    /// elements skipped, block elements separated by newlines.
    pub fn visible_text(&self) -> String {
        let mut out = String::new();
        let root = self.html.root_element();
        push_visible(root, &mut out);
        out
    }
}

/// `textContent` of an element, trimmed.
pub fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Trimmed attribute value, `None` when absent or blank.
pub fn attr_of(el: ElementRef<'_>, name: &str) -> Option<String> {
    el.value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn push_visible(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(e) => {
                if HIDDEN_TAGS.contains(&e.name()) || e.attr("hidden").is_some() {
                    continue;
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    push_visible(child_el, out);
                }
                if BLOCK_TAGS.contains(&e.name()) {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}
