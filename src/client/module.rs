//! Typed access to module metadata through a running proxy.

use reqwest::{header, Method, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::client::gomod::{parse_requires, Requirement};
use crate::client::ClientError;
use crate::http::target::{PATH_PARAM, PROXY_PARAM};

/// Liveness payload of `/health`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
}

#[derive(Debug, Deserialize)]
struct LatestInfo {
    #[serde(rename = "Version")]
    version: Option<String>,
}

/// Client for a go-mod-graph-proxy instance.
#[derive(Debug, Clone)]
pub struct ModuleClient {
    http: reqwest::Client,
    endpoint: Url,
    upstream: Option<String>,
}

impl ModuleClient {
    /// `endpoint` is the proxy's base URL (e.g. `http://localhost:8080`).
    /// `upstream` is sent as the `proxy` parameter; the server default is
    /// used when it is `None`.
    pub fn new(endpoint: &str, upstream: Option<String>) -> Result<Self, ClientError> {
        let endpoint = Url::parse(endpoint)?;
        if endpoint.cannot_be_a_base() {
            return Err(ClientError::InvalidEndpoint(endpoint.to_string()));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint,
            upstream,
        })
    }

    fn endpoint_url(&self, route: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.set_query(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(route);
        }
        url
    }

    /// `/proxy` URL for an upstream path.
    pub fn proxy_url(&self, path: &str) -> Url {
        let mut url = self.endpoint_url("proxy");
        {
            let mut query = url.query_pairs_mut();
            query.append_pair(PATH_PARAM, path);
            if let Some(upstream) = &self.upstream {
                query.append_pair(PROXY_PARAM, upstream);
            }
        }
        url
    }

    async fn send(&self, method: Method, path: &str) -> Result<reqwest::Response, ClientError> {
        let url = self.proxy_url(path);
        tracing::debug!(method = %method, url = %url, "Fetching through proxy");

        let response = self.http.request(method, url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status));
        }
        Ok(response)
    }

    async fn fetch_text(&self, path: &str) -> Result<String, ClientError> {
        Ok(self.send(Method::GET, path).await?.text().await?)
    }

    /// Query the proxy's liveness endpoint.
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let response = self.http.get(self.endpoint_url("health")).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status));
        }
        Ok(response.json().await?)
    }

    /// Latest published version of `module`.
    pub async fn latest_release(&self, module: &str) -> Result<String, ClientError> {
        let body = self
            .fetch_text(&format!("/{module}/@latest"))
            .await
            .map_err(|e| not_found_as(e, || ClientError::ModuleNotFound(module.to_string())))?;

        let info: LatestInfo = serde_json::from_str(&body)?;
        info.version
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ClientError::ModuleNotFound(module.to_string()))
    }

    /// Every listed version of `module`, newest listing entry first.
    pub async fn releases(&self, module: &str) -> Result<Vec<String>, ClientError> {
        let body = self
            .fetch_text(&format!("/{module}/@v/list"))
            .await
            .map_err(|e| not_found_as(e, || ClientError::ModuleNotFound(module.to_string())))?;

        let mut versions: Vec<String> = body
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        versions.reverse();
        Ok(versions)
    }

    /// Direct requirements declared by `module` at `release`.
    ///
    /// A missing `.mod` file is reported as [`ClientError::ReleaseNotFound`]
    /// when the module has published versions, and as
    /// [`ClientError::ModuleNotFound`] otherwise.
    pub async fn go_mod(&self, module: &str, release: &str) -> Result<Vec<Requirement>, ClientError> {
        match self.fetch_text(&format!("/{module}/@v/{release}.mod")).await {
            Ok(body) => Ok(parse_requires(&body)),
            Err(ClientError::Status(StatusCode::NOT_FOUND)) => {
                let module_exists = matches!(self.releases(module).await, Ok(v) if !v.is_empty());
                if module_exists {
                    Err(ClientError::ReleaseNotFound {
                        module: module.to_string(),
                        release: release.to_string(),
                    })
                } else {
                    Err(ClientError::ModuleNotFound(module.to_string()))
                }
            }
            Err(ClientError::Status(_)) => Err(ClientError::ReleaseNotFound {
                module: module.to_string(),
                release: release.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    /// Size of the module zip in bytes, from a `HEAD` request.
    ///
    /// Any failure yields `None`.
    pub async fn module_size(&self, module: &str, release: &str) -> Option<u64> {
        let response = match self
            .send(Method::HEAD, &format!("/{module}/@v/{release}.zip"))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(module, release, error = %e, "Module size unavailable");
                return None;
            }
        };

        response
            .headers()
            .get(header::CONTENT_LENGTH)?
            .to_str()
            .ok()?
            .parse()
            .ok()
    }
}

fn not_found_as(err: ClientError, not_found: impl FnOnce() -> ClientError) -> ClientError {
    match err {
        ClientError::Status(StatusCode::NOT_FOUND) => not_found(),
        other => other,
    }
}
