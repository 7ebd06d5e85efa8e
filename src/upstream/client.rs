use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use regex::{Captures, Regex};
use std::sync::LazyLock;
use url::{ParseError, Url};

use super::UpstreamIndex;
use crate::http::HttpClient;
use crate::wheel::VariantKey;

static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)(href\s*=\s*)(["'])([^"']*)["']"#).unwrap());

/// Upstream index served over HTTP, laid out like the PyTorch wheel index:
/// `{base_url}/cu{CUDA}/{package}/`.
#[derive(Clone)]
pub struct HttpUpstream {
    client: HttpClient,
}

impl HttpUpstream {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UpstreamIndex for HttpUpstream {
    #[tracing::instrument(skip(self))]
    async fn fetch_package_page(
        &self,
        base_url: &str,
        variant: VariantKey,
        package: &str,
    ) -> Result<String> {
        let page_url = package_page_url(base_url, variant, package)?;
        debug!("Fetching upstream page {}...", page_url);

        let html = self.client.get_text(page_url.as_str()).await?;
        Ok(absolutize_links(&html, &page_url))
    }
}

/// URL of the upstream page listing `package` wheels for `variant`.
pub fn package_page_url(base_url: &str, variant: VariantKey, package: &str) -> Result<Url> {
    let url = format!(
        "{}/cu{}/{}/",
        base_url.trim_end_matches('/'),
        variant.cuda,
        package
    );
    Url::parse(&url).with_context(|| format!("Invalid upstream index URL '{}'", url))
}

/// Rewrites every relative `href` in `html` to an absolute URL resolved
/// against `page_url`. Absolute and unresolvable links are left untouched.
pub fn absolutize_links(html: &str, page_url: &Url) -> String {
    HREF_RE
        .replace_all(html, |caps: &Captures| {
            let href = &caps[3];
            match Url::parse(href) {
                Err(ParseError::RelativeUrlWithoutBase) => match page_url.join(href) {
                    Ok(absolute) => format!("{}{}{}{}", &caps[1], &caps[2], absolute, &caps[2]),
                    Err(_) => caps[0].to_string(),
                },
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}
