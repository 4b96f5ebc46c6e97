use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::parser::{self, CourseRecord};

/// The only action the scraper answers.
pub const SCRAPE_ACTION: &str = "scrapeData";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Request {
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PageData {
    pub courses: Vec<CourseRecord>,
}

/// `{success: true, data: {courses}}` or `{success: false, error}`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<PageData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok(courses: Vec<CourseRecord>) -> Self {
        Response {
            success: true,
            data: Some(PageData { courses }),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Response {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Answer one request against an already-loaded page.
pub fn handle(request: &Request, html: &str, page_url: Option<&str>) -> Response {
    if request.action != SCRAPE_ACTION {
        return Response::failure(format!("unknown action {:?}", request.action));
    }

    info!("=== Starting course detection ===");
    if let Some(url) = page_url {
        info!("URL: {}", url);
    }
    match parser::process_page(html, page_url) {
        Ok(courses) => {
            info!("=== Detection complete: {} courses ===", courses.len());
            Response::ok(courses)
        }
        Err(e) => {
            error!("Error scraping data: {}", e);
            Response::failure(e.to_string())
        }
    }
}
