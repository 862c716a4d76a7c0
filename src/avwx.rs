use crate::report::Payload;
use crate::{Config, Report, ReportKind};
use futures::future::BoxFuture;
use futures::FutureExt;
use hyper::client::connect::Connect;
use hyper::client::HttpConnector;
use hyper::{header, Body, Method, StatusCode};
use hyper_tls::HttpsConnector;
use std::error::Error;

/// A client for the AVWX aviation weather API.
pub struct AvwxClient<C = HttpsConnector<HttpConnector>> {
    http: hyper::Client<C, Body>,
    base_uri: String,
    token: String,
}

impl AvwxClient {
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            hyper::Client::builder().build(HttpsConnector::new()),
            config.avwx_base_uri.clone(),
            config.avwx_token.clone(),
        )
    }
}

impl<C> AvwxClient<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    pub fn new<B: Into<String>, T: Into<String>>(
        http: hyper::Client<C, Body>,
        base_uri: B,
        token: T,
    ) -> Self {
        Self {
            http,
            base_uri: base_uri.into(),
            token: token.into(),
        }
    }

    /// The URI of one report, e.g. `{base}/metar/KPAO?...&filter=sanitized&onfail=cache`
    pub fn uri(&self, kind: ReportKind, code: &str) -> Result<hyper::Uri, TransportError> {
        let mut url = url::Url::parse(&self.base_uri)
            .map_err(|_| TransportError::InvalidUri(self.base_uri.clone()))?;

        url.path_segments_mut()
            .map_err(|_| TransportError::InvalidUri(self.base_uri.clone()))?
            .pop_if_empty()
            .push(kind.path())
            .push(code);
        url.set_query(Some(&format!(
            "options=&airport=true&reporting=true&format=json&remove=&filter={}&onfail=cache",
            kind.filter()
        )));

        hyper::Uri::try_from(url.as_str()).map_err(|_| TransportError::InvalidUri(url.into()))
    }

    /// Make one request, without interpreting any error the service reports.
    async fn request(&self, kind: ReportKind, code: &str) -> Result<Payload, TransportError> {
        let request = hyper::Request::builder()
            .method(Method::GET)
            .uri(self.uri(kind, code)?)
            .header(header::AUTHORIZATION, self.token.as_str())
            .header(header::ACCEPT, "application/json")
            .header(
                header::USER_AGENT,
                concat!("metar-sms/", env!("CARGO_PKG_VERSION")),
            )
            .body(Body::empty())
            .map_err(TransportError::Request)?;

        let response = self
            .http
            .request(request)
            .await
            .map_err(TransportError::Http)?;
        let status = response.status();
        let body = hyper::body::to_bytes(response.into_body())
            .await
            .map_err(TransportError::Http)?;

        if !status.is_success() {
            return Err(TransportError::Status(status));
        }

        serde_json::from_slice(&body).map_err(TransportError::Decode)
    }

    /// Fetch a report, retrying a three character code once with a `K` prefix if the service
    /// has nothing for it.
    pub async fn fetch_report(&self, kind: ReportKind, code: &str) -> Result<Report, FetchError> {
        let payload = self.request(kind, code).await.map_err(|e| {
            log::warn!("could not fetch {} for {}: {}", kind, code, e);
            FetchError::Transport {
                kind,
                code: code.to_string(),
                source: e,
            }
        })?;

        let detail = match payload.error().map(String::from) {
            None => return Ok(payload.into_report(kind, code)),
            Some(detail) => detail,
        };

        if code.chars().count() != 3 {
            log::warn!("error in {} for {}: {}", kind, code, detail);
            return Err(FetchError::NotFound {
                kind,
                code: code.to_string(),
                detail,
            });
        }

        // US domestic codes are usually the ICAO code without its leading K
        let prefixed = format!("K{}", code);
        log::info!("no {} for {} ({}), trying {}", kind, code, detail, prefixed);

        let detail = match self.request(kind, &prefixed).await {
            Ok(payload) => match payload.error().map(String::from) {
                None => return Ok(payload.into_report(kind, &prefixed)),
                Some(detail) => detail,
            },
            Err(e) => e.to_string(),
        };

        log::warn!("error in {} for {}: {}", kind, prefixed, detail);
        Err(FetchError::NotFound {
            kind,
            code: prefixed,
            detail,
        })
    }
}

impl<C> crate::Weather for AvwxClient<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    fn fetch<'a>(
        &'a self,
        kind: ReportKind,
        code: &'a str,
    ) -> BoxFuture<'a, Result<Report, FetchError>> {
        self.fetch_report(kind, code).boxed()
    }
}

impl<C> std::fmt::Debug for AvwxClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("AvwxClient")
            .field("base_uri", &self.base_uri)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum FetchError {
    /// The service could not be reached, or its reply could not be understood
    Transport {
        kind: ReportKind,
        code: String,
        source: TransportError,
    },
    /// The service reported that it had no data, even after any `K` prefix retry
    NotFound {
        kind: ReportKind,
        code: String,
        detail: String,
    },
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            FetchError::Transport { kind, code, source } => {
                write!(f, "could not fetch {} for {}: {}", kind, code, source)
            }
            FetchError::NotFound { kind, code, detail } => {
                write!(f, "no {} for {}: {}", kind, code, detail)
            }
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FetchError::Transport { source, .. } => Some(source),
            FetchError::NotFound { .. } => None,
        }
    }
}

#[derive(Debug)]
pub enum TransportError {
    InvalidUri(String),
    Request(hyper::http::Error),
    Http(hyper::Error),
    Status(StatusCode),
    Decode(serde_json::Error),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TransportError::InvalidUri(uri) => write!(f, "invalid URI: {}", uri),
            TransportError::Request(e) => write!(f, "invalid request: {}", e),
            TransportError::Http(e) => write!(f, "HTTP request failed: {}", e),
            TransportError::Status(status) => write!(f, "unexpected status {}", status),
            TransportError::Decode(e) => write!(f, "invalid reply: {}", e),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TransportError::InvalidUri(_) | TransportError::Status(_) => None,
            TransportError::Request(e) => Some(e),
            TransportError::Http(e) => Some(e),
            TransportError::Decode(e) => Some(e),
        }
    }
}
