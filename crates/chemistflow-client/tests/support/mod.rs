//! Hand-rolled mock upstream for client tests.
//!
//! Binds a hyper HTTP/1 server on an ephemeral port and answers every
//! request through the supplied handler, counting hits so tests can
//! assert how many upstream calls a code path issued.

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

/// Handler signature: (method, path, body) -> (status, response body).
pub type Handler = Arc<dyn Fn(&str, &str, &[u8]) -> (StatusCode, String) + Send + Sync>;

pub struct MockUpstream {
    pub base_uri: String,
    hits: Arc<AtomicUsize>,
}

impl MockUpstream {
    pub async fn start(handler: Handler) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_uri = format!("http://{}", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_for_server = Arc::clone(&hits);

        tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => continue,
                };
                let io = TokioIo::new(stream);
                let handler = Arc::clone(&handler);
                let hits = Arc::clone(&hits_for_server);

                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let handler = Arc::clone(&handler);
                        let hits = Arc::clone(&hits);
                        async move {
                            hits.fetch_add(1, Ordering::SeqCst);
                            let (parts, body) = req.into_parts();
                            let bytes = body.collect().await.unwrap().to_bytes();
                            let (status, reply) =
                                handler(parts.method.as_str(), parts.uri.path(), &bytes);
                            Ok::<_, Infallible>(
                                Response::builder()
                                    .status(status)
                                    .header("Content-Type", "application/json")
                                    .body(Full::new(Bytes::from(reply)))
                                    .unwrap(),
                            )
                        }
                    });

                    let _ = http1::Builder::new().serve_connection(io, service).await;
                });
            }
        });

        Self { base_uri, hits }
    }

    pub fn hit_count(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}
