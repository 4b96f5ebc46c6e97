use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::header::{COOKIE, USER_AGENT};
use tracing::info;
use url::Url;

use crate::settings::Settings;

/// Where a page's HTML comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Stdin,
    File(PathBuf),
    Http(String),
}

impl Source {
    /// `-` is stdin, an http(s) URL is fetched, anything else is a file path.
    pub fn parse(arg: &str) -> Self {
        if arg == "-" {
            Source::Stdin
        } else if arg.starts_with("http://") || arg.starts_with("https://") {
            Source::Http(arg.to_string())
        } else {
            Source::File(PathBuf::from(arg))
        }
    }
}

pub struct LoadedPage {
    pub html: String,
    /// Address relative links resolve against.
    pub url: Option<String>,
}

/// Read or fetch the page. `page_url` overrides the address for saved
/// pages; fetched pages use the URL they were fetched from.
pub async fn load(
    source: &Source,
    page_url: Option<String>,
    cookie: Option<&str>,
    settings: &Settings,
) -> Result<LoadedPage> {
    let (html, url) = match source {
        Source::Stdin => {
            let html = std::io::read_to_string(std::io::stdin()).context("Failed to read stdin")?;
            (html, page_url)
        }
        Source::File(path) => {
            let html = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            (html, page_url)
        }
        Source::Http(url) => {
            ensure_lms_host(url, &settings.lms_host)?;
            let html = fetch_page(url, cookie, settings).await?;
            (html, page_url.or_else(|| Some(url.clone())))
        }
    };

    if let Some(u) = &url {
        ensure_lms_host(u, &settings.lms_host)?;
    }
    Ok(LoadedPage { html, url })
}

async fn fetch_page(url: &str, cookie: Option<&str>, settings: &Settings) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()?;

    info!("Fetching page: {}", url);
    let mut request = client.get(url).header(USER_AGENT, &settings.user_agent);
    if let Some(cookie) = cookie {
        request = request.header(COOKIE, cookie);
    }
    let response = request
        .send()
        .await
        .with_context(|| format!("Failed to fetch {}", url))?
        .error_for_status()?;
    response.text().await.context("Failed to read page body")
}

/// Pages must come from the configured LMS host (or one of its subdomains).
pub fn ensure_lms_host(page_url: &str, lms_host: &str) -> Result<()> {
    if lms_host.is_empty() {
        return Ok(());
    }
    let parsed = Url::parse(page_url).with_context(|| format!("Invalid page url {:?}", page_url))?;
    let host = parsed.host_str().unwrap_or_default();
    if host == lms_host || host.ends_with(&format!(".{}", lms_host)) {
        Ok(())
    } else {
        bail!("Open a {} page first (got {})", lms_host, host)
    }
}
