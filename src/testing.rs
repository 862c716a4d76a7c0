//! An in-process HTTP server standing in for the upstream APIs.

use hyper::header;
use hyper::server::conn::AddrStream;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    pub method: Method,
    pub path_and_query: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

pub(crate) struct Upstream {
    pub base_uri: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
    _task: tokio::task::JoinHandle<()>,
}

impl Upstream {
    /// Serve on an ephemeral local port, answering every request with `respond`.
    pub fn start<F>(respond: F) -> Self
    where
        F: Fn(&Recorded) -> (StatusCode, String) + Send + Sync + 'static,
    {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let respond = Arc::new(respond);

        let make_service = {
            let requests = requests.clone();
            make_service_fn(move |_socket: &AddrStream| {
                let requests = requests.clone();
                let respond = respond.clone();
                async move {
                    Ok::<_, Infallible>(service_fn(move |request: Request<Body>| {
                        let requests = requests.clone();
                        let respond = respond.clone();
                        async move {
                            let (parts, body) = request.into_parts();
                            let body = hyper::body::to_bytes(body).await?;
                            let text_header = |name: header::HeaderName| {
                                parts
                                    .headers
                                    .get(name)
                                    .and_then(|v| v.to_str().ok())
                                    .map(String::from)
                            };

                            let recorded = Recorded {
                                method: parts.method.clone(),
                                path_and_query: parts
                                    .uri
                                    .path_and_query()
                                    .map(|p| p.to_string())
                                    .unwrap_or_default(),
                                authorization: text_header(header::AUTHORIZATION),
                                content_type: text_header(header::CONTENT_TYPE),
                                body: String::from_utf8_lossy(&body).into_owned(),
                            };

                            let (status, reply) = respond(&recorded);
                            requests.lock().unwrap().push(recorded);

                            let mut response = Response::new(Body::from(reply));
                            *response.status_mut() = status;
                            Ok::<_, hyper::Error>(response)
                        }
                    }))
                }
            })
        };

        let server = hyper::Server::bind(&([127, 0, 0, 1], 0).into()).serve(make_service);
        let base_uri = format!("http://{}", server.local_addr());
        let _task = tokio::spawn(async move {
            if let Err(e) = server.await {
                log::error!("upstream stand-in failed: {}", e);
            }
        });

        Self {
            base_uri,
            requests,
            _task,
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}
