use crate::Config;
use base64::Engine;
use futures::future::BoxFuture;
use futures::FutureExt;
use hyper::client::connect::Connect;
use hyper::client::HttpConnector;
use hyper::{header, Body, Method, StatusCode};
use hyper_tls::HttpsConnector;
use std::error::Error;

/// Sends text messages through the Twilio REST API.
pub struct TwilioClient<C = HttpsConnector<HttpConnector>> {
    http: hyper::Client<C, Body>,
    base_uri: String,
    account_sid: String,
    authorization: String,
    from: String,
}

impl TwilioClient {
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            hyper::Client::builder().build(HttpsConnector::new()),
            config.twilio_base_uri.clone(),
            &config.twilio_account_sid,
            &config.twilio_auth_token,
            config.sender.clone(),
        )
    }
}

impl<C> TwilioClient<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    pub fn new<B: Into<String>, F: Into<String>>(
        http: hyper::Client<C, Body>,
        base_uri: B,
        account_sid: &str,
        auth_token: &str,
        from: F,
    ) -> Self {
        let credentials = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", account_sid, auth_token));

        Self {
            http,
            base_uri: base_uri.into(),
            account_sid: account_sid.to_string(),
            authorization: format!("Basic {}", credentials),
            from: from.into(),
        }
    }

    /// The number messages are sent from
    pub fn sender(&self) -> &str {
        &self.from
    }

    /// Send `body` to `to`, returning the provider's description of the created message.
    pub async fn send(&self, to: &str, body: &str) -> Result<serde_json::Value, SendError> {
        let uri = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_uri, self.account_sid
        );
        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("To", to)
            .append_pair("From", &self.from)
            .append_pair("Body", body)
            .finish();

        let request = hyper::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::AUTHORIZATION, self.authorization.as_str())
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(header::ACCEPT, "application/json")
            .body(Body::from(form))
            .map_err(SendError::Request)?;

        let response = self.http.request(request).await.map_err(SendError::Http)?;
        let status = response.status();
        let reply = hyper::body::to_bytes(response.into_body())
            .await
            .map_err(SendError::Http)?;

        if !status.is_success() {
            return Err(SendError::Rejected {
                status,
                body: String::from_utf8_lossy(&reply).into_owned(),
            });
        }

        Ok(serde_json::from_slice(&reply).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&reply).into_owned())
        }))
    }
}

impl<C> crate::Messenger for TwilioClient<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    fn send_message<'a>(
        &'a self,
        to: &'a str,
        body: &'a str,
    ) -> BoxFuture<'a, Result<(), SendError>> {
        async move {
            let response = self.send(to, body).await?;
            log::info!("Response: {}", response);
            Ok::<_, SendError>(())
        }
        .boxed()
    }
}

impl<C> std::fmt::Debug for TwilioClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("TwilioClient")
            .field("base_uri", &self.base_uri)
            .field("account_sid", &self.account_sid)
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum SendError {
    Request(hyper::http::Error),
    Http(hyper::Error),
    /// The provider refused the message
    Rejected {
        status: StatusCode,
        body: String,
    },
}

impl std::fmt::Display for SendError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            SendError::Request(e) => write!(f, "invalid request: {}", e),
            SendError::Http(e) => write!(f, "HTTP request failed: {}", e),
            SendError::Rejected { status, body } => {
                write!(f, "provider returned {}: {}", status, body)
            }
        }
    }
}

impl std::error::Error for SendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SendError::Request(e) => Some(e),
            SendError::Http(e) => Some(e),
            SendError::Rejected { .. } => None,
        }
    }
}
