//! HTTP client for the registry tag-list endpoint.

use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, LINK, WWW_AUTHENTICATE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::TagLister;
use super::auth::Challenge;
use crate::config::IndexerOptions;
use crate::error::{IndexerError, RegistryError, Result};
use crate::reference::RepositoryReference;

pub const USER_AGENT: &str = concat!("pkgreg-oci/", env!("CARGO_PKG_VERSION"));

/// Upper bound on tag-list pages followed in one listing.
pub const MAX_PAGES: usize = 10_000;

#[derive(Debug, Deserialize)]
struct TagList {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

/// Authorization state for one listing. Discarded when the listing ends.
#[derive(Debug, Clone, PartialEq)]
enum Authorization {
    Anonymous,
    Basic,
    Bearer(String),
}

/// Connection handle for one registry repository.
pub struct RegistryClient {
    http: Client,
    reference: RepositoryReference,
    base: Url,
    credentials: Option<(String, String)>,
    page_size: Option<u32>,
}

impl RegistryClient {
    /// Build the handle. No network traffic happens here.
    pub fn new(reference: RepositoryReference, options: &IndexerOptions) -> Result<Self> {
        let base = reference.api_base(options.scheme())?;

        let mut builder = Client::builder()
            .timeout(options.request_timeout())
            .user_agent(USER_AGENT);

        if options.insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().map_err(|e| IndexerError::Connection {
            reference: reference.to_string(),
            reason: format!("failed to build HTTP client: {}", e),
        })?;

        let credentials = options
            .basic_credentials()
            .map(|(user, pass)| (user.to_string(), pass.to_string()));

        Ok(Self {
            http,
            reference,
            base,
            credentials,
            page_size: options.page_size,
        })
    }

    pub fn reference(&self) -> &RepositoryReference {
        &self.reference
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// URL of the first tag-list page.
    pub fn tags_url(&self) -> Url {
        let mut url = self.base.clone();
        url.set_path(&format!("/v2/{}/tags/list", self.reference.repository()));
        if let Some(n) = self.page_size {
            url.query_pairs_mut().append_pair("n", &n.to_string());
        }
        url
    }

    fn with_basic(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some((user, pass)) => request.basic_auth(user, Some(pass)),
            None => request,
        }
    }

    fn authorize(&self, request: RequestBuilder, auth: &Authorization) -> RequestBuilder {
        match auth {
            Authorization::Anonymous => request,
            Authorization::Basic => self.with_basic(request),
            Authorization::Bearer(token) => request.bearer_auth(token),
        }
    }

    /// Send a GET, answering one authentication challenge if needed.
    async fn get(&self, url: &Url, auth: &mut Authorization) -> std::result::Result<Response, RegistryError> {
        debug!(url = %url, "Requesting registry");

        let response = self
            .authorize(self.http.get(url.clone()), auth)
            .send()
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED || *auth != Authorization::Anonymous {
            return self.check_status(response);
        }

        let header = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                RegistryError::Unauthorized(format!(
                    "HTTP 401 from {} without an authentication challenge",
                    self.reference
                ))
            })?;

        *auth = match Challenge::parse(header)? {
            Challenge::Basic => {
                if self.credentials.is_none() {
                    return Err(RegistryError::Unauthorized(format!(
                        "registry {} requires basic credentials",
                        self.reference.registry()
                    )));
                }
                Authorization::Basic
            }
            Challenge::Bearer {
                realm,
                service,
                scope,
            } => {
                let token = self
                    .fetch_token(&realm, service.as_deref(), scope.as_deref())
                    .await?;
                Authorization::Bearer(token)
            }
        };

        debug!(url = %url, "Retrying registry request with credentials");
        let response = self
            .authorize(self.http.get(url.clone()), auth)
            .send()
            .await?;
        self.check_status(response)
    }

    async fn fetch_token(
        &self,
        realm: &str,
        service: Option<&str>,
        scope: Option<&str>,
    ) -> std::result::Result<String, RegistryError> {
        let mut url = Url::parse(realm)
            .map_err(|e| RegistryError::Protocol(format!("invalid token realm '{}': {}", realm, e)))?;

        let default_scope = format!("repository:{}:pull", self.reference.repository());
        {
            let mut query = url.query_pairs_mut();
            if let Some(service) = service {
                query.append_pair("service", service);
            }
            query.append_pair("scope", scope.unwrap_or(&default_scope));
        }

        debug!(realm = %realm, "Fetching registry token");

        let response = self.with_basic(self.http.get(url)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Unauthorized(format!(
                "token endpoint returned {}",
                status
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::Protocol(format!("invalid token response: {}", e)))?;

        body.token
            .or(body.access_token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| RegistryError::Protocol("token response has no token".to_string()))
    }

    fn check_status(&self, response: Response) -> std::result::Result<Response, RegistryError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = status.canonical_reason().unwrap_or("Unknown error").to_string();
        Err(match status.as_u16() {
            401 | 403 => RegistryError::Unauthorized(format!("HTTP {}", status.as_u16())),
            404 => RegistryError::RepositoryNotFound(self.reference.to_string()),
            405 | 501 => RegistryError::Unsupported(format!("HTTP {}", status.as_u16())),
            code => RegistryError::Status {
                status: code,
                message,
            },
        })
    }
}

/// Resolve the `rel="next"` target of a `Link` header against `current`.
fn next_link(headers: &HeaderMap, current: &Url) -> std::result::Result<Option<Url>, RegistryError> {
    for value in headers.get_all(LINK) {
        let value = value
            .to_str()
            .map_err(|_| RegistryError::Protocol("non-ASCII Link header".to_string()))?;

        for link in value.split(',') {
            let mut parts = link.split(';');
            let target = parts.next().unwrap_or_default().trim();
            let is_next = parts.any(|p| {
                let p = p.trim().replace(' ', "");
                p.eq_ignore_ascii_case("rel=\"next\"") || p.eq_ignore_ascii_case("rel=next")
            });
            if !is_next {
                continue;
            }

            let target = target
                .strip_prefix('<')
                .and_then(|t| t.strip_suffix('>'))
                .ok_or_else(|| RegistryError::Protocol(format!("malformed Link header '{}'", link)))?;

            let next = current
                .join(target)
                .map_err(|e| RegistryError::Protocol(format!("invalid Link target '{}': {}", target, e)))?;
            return Ok(Some(next));
        }
    }

    Ok(None)
}

#[async_trait]
impl TagLister for RegistryClient {
    async fn list_tags(&self) -> std::result::Result<Vec<String>, RegistryError> {
        let mut url = self.tags_url();
        let mut auth = Authorization::Anonymous;
        let mut tags = Vec::new();
        let mut visited = HashSet::new();

        loop {
            visited.insert(url.clone());
            let response = self.get(&url, &mut auth).await?;
            let next = next_link(response.headers(), &url)?;

            let page: TagList = response
                .json()
                .await
                .map_err(|e| RegistryError::Protocol(format!("invalid tag list response: {}", e)))?;
            tags.extend(page.tags.unwrap_or_default());

            let Some(next) = next else { break };

            // Authorization is only ever sent to the configured registry.
            if next.origin() != self.base.origin() {
                warn!(url = %next, "Registry linked to another origin, refusing to follow");
                return Err(RegistryError::Protocol(format!(
                    "next page link '{}' leaves registry {}",
                    next,
                    self.reference.registry()
                )));
            }
            if visited.contains(&next) {
                warn!(url = %next, "Registry pagination revisits a page, stopping");
                return Err(RegistryError::Protocol(format!(
                    "next page link '{}' was already listed",
                    next
                )));
            }
            if visited.len() >= MAX_PAGES {
                return Err(RegistryError::Protocol(format!(
                    "tag listing exceeded {} pages",
                    MAX_PAGES
                )));
            }
            url = next;
        }

        debug!(
            reference = %self.reference,
            pages = visited.len(),
            count = tags.len(),
            "Listed registry tags"
        );
        Ok(tags)
    }
}
