pub mod extract;
pub mod normalize;
pub mod page;

pub use extract::{CourseRecord, PLACEHOLDER_URL};

/// Parse a page and run the strategy chain over it.
pub fn process_page(
    html: &str,
    page_url: Option<&str>,
) -> Result<Vec<CourseRecord>, page::ExtractError> {
    let page = page::Page::parse(html, page_url)?;
    Ok(extract::extract(&page))
}
