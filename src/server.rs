use crate::{handler, Inbound, Messenger, Weather};
use hyper::body::HttpBody;
use hyper::http::{header, Request};
use hyper::{Body, Method, Response, StatusCode};
use std::net::SocketAddr;
use std::sync::Arc;

/// The route Twilio posts inbound messages to.
pub const INCOMING_SMS_PATH: &str = "/incoming_sms";

/// Webhook bodies larger than this are ignored.
pub const MAX_FORM_BYTES: usize = 16 * 1024;

/// Accepts inbound SMS webhooks and answers them in the background.
#[derive(Debug)]
pub struct Server<W, M> {
    weather: Arc<W>,
    messenger: Arc<M>,
}

impl<W, M> Server<W, M>
where
    W: Weather + 'static,
    M: Messenger + 'static,
{
    pub fn new(weather: W, messenger: M) -> Self {
        Self {
            weather: Arc::new(weather),
            messenger: Arc::new(messenger),
        }
    }

    pub async fn serve(
        &self,
        remote_addr: SocketAddr,
        request: Request<Body>,
    ) -> hyper::http::Result<Response<Body>> {
        log::info!(
            "request from {}: {} {}",
            remote_addr,
            request.method(),
            request.uri().path()
        );

        match request.uri().path() {
            INCOMING_SMS_PATH => self.incoming_sms(request).await,
            _ => error_response(StatusCode::NOT_FOUND, "not found\n"),
        }
    }

    /// Handle one webhook call.
    ///
    /// Every outcome past routing is an empty `200 OK`: rejected messages are only logged, and
    /// accepted ones are answered by a spawned task that this never waits for.
    pub async fn incoming_sms(
        &self,
        request: Request<Body>,
    ) -> hyper::http::Result<Response<Body>> {
        if request.method() != Method::POST {
            return error_response(StatusCode::METHOD_NOT_ALLOWED, "method not allowed\n");
        }

        match read_limited(request.into_body(), MAX_FORM_BYTES).await {
            Ok(Some(form)) => {
                self.dispatch(&form);
            }
            Ok(None) => log::warn!("incoming request body exceeds {} bytes", MAX_FORM_BYTES),
            Err(e) => log::warn!("could not read incoming request: {}", e),
        }

        Response::builder()
            .status(StatusCode::OK)
            .body(Body::empty())
    }

    /// Validate a webhook body and, if it holds a command, start answering it.
    fn dispatch(&self, form: &[u8]) -> Option<tokio::task::JoinHandle<()>> {
        let (inbound, command) = match Inbound::accept(form) {
            Ok(accepted) => accepted,
            Err(e) => {
                log::info!("{}", e);
                return None;
            }
        };

        log::info!(
            "message {} from {}: {:?}",
            inbound.message_sid,
            inbound.from,
            command
        );

        let weather = self.weather.clone();
        let messenger = self.messenger.clone();
        Some(tokio::spawn(async move {
            handler::handle(
                &command,
                weather.as_ref(),
                messenger.as_ref(),
                &inbound.from,
            )
            .await;
        }))
    }
}

/// Read a request body, giving up once it grows past `limit`.
async fn read_limited(mut body: Body, limit: usize) -> Result<Option<Vec<u8>>, hyper::Error> {
    if body.size_hint().lower() > limit as u64 {
        return Ok(None);
    }

    let mut form = Vec::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk?;
        if form.len() + chunk.len() > limit {
            return Ok(None);
        }
        form.extend_from_slice(&chunk);
    }
    Ok(Some(form))
}

fn error_response(
    status_code: StatusCode,
    message: &'static str,
) -> hyper::http::Result<Response<Body>> {
    Response::builder()
        .status(status_code)
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::FixedWeather;
    use crate::SendError;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct Outbox(mpsc::UnboundedSender<(String, String)>);

    impl Messenger for Outbox {
        fn send_message<'a>(
            &'a self,
            to: &'a str,
            body: &'a str,
        ) -> BoxFuture<'a, Result<(), SendError>> {
            self.0.send((to.to_string(), body.to_string())).ok();
            futures::future::ready(Ok(())).boxed()
        }
    }

    fn server() -> (
        Server<FixedWeather, Outbox>,
        mpsc::UnboundedReceiver<(String, String)>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let weather = FixedWeather {
            metar: Some("KPAO 191747Z 31008KT".to_string()),
            taf: Some("KPAO 191753Z 1918/2018".to_string()),
        };
        (Server::new(weather, Outbox(tx)), rx)
    }

    fn post(path: &str, form: &'static str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .unwrap()
    }

    fn remote() -> SocketAddr {
        ([127, 0, 0, 1], 40000).into()
    }

    async fn body_of(response: Response<Body>) -> Vec<u8> {
        hyper::body::to_bytes(response.into_body())
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn replies_in_background() {
        let (server, mut rx) = server();
        let response = server
            .serve(
                remote(),
                post(
                    INCOMING_SMS_PATH,
                    "MessageSid=SM1&From=%2B15550123&Body=kpao+metar",
                ),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_of(response).await.is_empty());

        let sent = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert_eq!(
            sent,
            Some(("+15550123".to_string(), "KPAO 191747Z 31008KT".to_string()))
        );
    }

    #[tokio::test]
    async fn rejections_are_acknowledged_without_dispatch() {
        let (server, mut rx) = server();

        for form in [
            "From=%2B15550123&Body=kpao",
            "MessageSid=SM1&Body=kpao",
            "MessageSid=SM1&From=%2B15550123",
            "MessageSid=SM1&From=%2B15550123&Body=kpao%3F",
            "MessageSid=SM1&From=%2B15550123&Body=ab",
        ] {
            assert!(server.dispatch(form.as_bytes()).is_none(), "{}", form);

            let response = server
                .serve(remote(), post(INCOMING_SMS_PATH, form))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert!(body_of(response).await.is_empty());
        }

        drop(server);
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn dispatched_task_sends_both_reports() {
        let (server, mut rx) = server();
        let handle = server
            .dispatch(b"MessageSid=SM1&From=%2B15550123&Body=PAO")
            .unwrap();
        handle.await.unwrap();

        assert_eq!(
            rx.recv().await,
            Some((
                "+15550123".to_string(),
                "KPAO 191747Z 31008KT\n\nKPAO 191753Z 1918/2018".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn oversized_body_is_ignored() {
        let (server, mut rx) = server();

        let form = format!(
            "MessageSid=SM1&From=%2B15550123&Body=kpao&Padding={}",
            "x".repeat(MAX_FORM_BYTES)
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri(INCOMING_SMS_PATH)
            .body(Body::from(form))
            .unwrap();
        let response = server.serve(remote(), request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_of(response).await.is_empty());

        drop(server);
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn streamed_body_stops_at_limit() {
        let (mut sender, body) = Body::channel();
        tokio::spawn(async move {
            let chunk = hyper::body::Bytes::from(vec![b'x'; MAX_FORM_BYTES / 2 + 1]);
            for _ in 0..3 {
                if sender.send_data(chunk.clone()).await.is_err() {
                    break;
                }
            }
        });
        assert_eq!(read_limited(body, MAX_FORM_BYTES).await.unwrap(), None);

        let form = read_limited(Body::from("Body=kpao"), MAX_FORM_BYTES)
            .await
            .unwrap();
        assert_eq!(form.as_deref(), Some(&b"Body=kpao"[..]));
    }

    #[tokio::test]
    async fn routing() {
        let (server, _rx) = server();

        let response = server
            .serve(remote(), post("/elsewhere", "Body=kpao"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let request = Request::builder()
            .method(Method::GET)
            .uri(INCOMING_SMS_PATH)
            .body(Body::empty())
            .unwrap();
        let response = server.serve(remote(), request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
