use anyhow::Result;
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};

use crate::{
    github::{GetReleases, GitHub},
    http::HttpClient,
    runtime::Runtime,
    upstream::{HttpUpstream, UpstreamIndex},
};

const USER_AGENT: &str = "wheel-index";

/// The collaborators a build talks to.
pub struct Config<R: Runtime, G: GetReleases, U: UpstreamIndex> {
    pub runtime: R,
    pub github: G,
    pub upstream: U,
}

impl<R: Runtime> Config<R, GitHub, HttpUpstream> {
    /// Wires real HTTP clients. `GITHUB_TOKEN`, when set, is only sent to the
    /// GitHub API, never to the upstream index.
    pub fn new(runtime: R, api_url: Option<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Ok(token) = runtime.env_var("GITHUB_TOKEN") {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
            debug!("Using GITHUB_TOKEN for authentication: {}", mask_token(&token));
        }

        let github_client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;
        let upstream_client = Client::builder().user_agent(USER_AGENT).build()?;

        let github = GitHub::new(HttpClient::new(github_client), api_url);
        let upstream = HttpUpstream::new(HttpClient::new(upstream_client));

        Ok(Self {
            runtime,
            github,
            upstream,
        })
    }
}

fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}
