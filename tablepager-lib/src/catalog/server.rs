//! Catalog HTTP server.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::Full;
use hyper::Method;
use hyper::Request;
use hyper::Response;
use hyper::StatusCode;
use hyper::Uri;
use hyper::body::Bytes;
use hyper::body::Incoming;
use hyper::header::CONTENT_TYPE;
use hyper::header::HeaderValue;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use log::debug;
use log::info;
use log::warn;
use serde::Deserialize;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::CatalogQuery;
use crate::error::CatalogError;
use crate::model::Row;

/// Catalog server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on. Port 0 picks a free port.
    ///
    /// Default: `127.0.0.1:0`
    pub addr: SocketAddr,

    /// Resource name: the URL path and the response key.
    ///
    /// Default: `products`
    pub resource: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            resource: "products".to_string(),
        }
    }
}

impl ServerConfig {
    /// Sets the listen address.
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    /// Sets the resource name.
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }
}

/// In-memory rows served under one resource name.
struct Catalog<R> {
    resource: String,
    rows: Vec<R>,
}

impl<R: Row + Serialize> Catalog<R> {
    fn respond(&self, method: &Method, uri: &Uri) -> Response<Full<Bytes>> {
        if *method != Method::GET {
            return empty(StatusCode::NOT_FOUND);
        }
        if uri.path().trim_matches('/') != self.resource {
            return empty(StatusCode::NOT_FOUND);
        }

        let query = match CatalogQuery::parse(uri.query()) {
            Ok(query) => query,
            Err(e) => {
                debug!("[catalog] rejected {}: {}", uri, e);
                let body = serde_json::json!({ "error": e.to_string() });
                return json(StatusCode::BAD_REQUEST, body.to_string().into_bytes());
            }
        };

        let rows = query.apply(&self.rows);
        debug!("[catalog] {} -> {} rows", uri, rows.len());

        let mut body = serde_json::Map::new();
        match serde_json::to_value(rows) {
            Ok(rows) => {
                body.insert(self.resource.clone(), rows);
            }
            Err(e) => {
                warn!("[catalog] failed to encode rows: {}", e);
                return empty(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
        json(StatusCode::OK, serde_json::Value::Object(body).to_string().into_bytes())
    }
}

fn empty(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

fn json(status: StatusCode, body: Vec<u8>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// A running catalog endpoint.
///
/// Serves `GET /{resource}?limit=&offset=&filterBy=` over HTTP/1.1 until
/// [`shutdown`](CatalogServer::shutdown) is called or the server is dropped.
///
/// # Example
///
/// ```ignore
/// let products = load_products("products.json")?;
/// let server = CatalogServer::bind(ServerConfig::default(), products).await?;
/// println!("listening on {}", server.url());
/// // ...
/// server.shutdown().await;
/// ```
pub struct CatalogServer {
    local_addr: SocketAddr,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl CatalogServer {
    /// Binds the listener and starts serving `rows` in the background.
    pub async fn bind<R>(config: ServerConfig, rows: Vec<R>) -> Result<Self, CatalogError>
    where
        R: Row + Serialize,
    {
        let listener = TcpListener::bind(config.addr)
            .await
            .map_err(|source| CatalogError::Bind {
                addr: config.addr.to_string(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        info!(
            "[catalog] serving {} rows at http://{}/{}",
            rows.len(),
            local_addr,
            config.resource
        );

        let catalog = Arc::new(Catalog {
            resource: config.resource,
            rows,
        });
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(serve(listener, catalog, cancel.clone()));

        Ok(Self {
            local_addr,
            cancel,
            handle: Some(handle),
        })
    }

    /// Returns the bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the base URL, e.g. `http://127.0.0.1:41234`.
    pub fn url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Returns a token that stops the server when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stops accepting connections and waits for the accept loop to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.await
        {
            warn!("[catalog] server task failed: {}", e);
        }
        info!("[catalog] stopped");
    }
}

impl Drop for CatalogServer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for CatalogServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogServer")
            .field("local_addr", &self.local_addr)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

async fn serve<R>(listener: TcpListener, catalog: Arc<Catalog<R>>, cancel: CancellationToken)
where
    R: Row + Serialize,
{
    loop {
        let (stream, peer) = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("[catalog] accept loop cancelled");
                return;
            }
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("[catalog] accept failed: {}", e);
                    continue;
                }
            },
        };

        let catalog = Arc::clone(&catalog);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let service = service_fn(move |req: Request<Incoming>| {
                let catalog = Arc::clone(&catalog);
                async move { Ok::<_, Infallible>(catalog.respond(req.method(), req.uri())) }
            });

            let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
            tokio::select! {
                result = conn => {
                    if let Err(e) = result {
                        debug!("[catalog] connection from {} ended: {}", peer, e);
                    }
                }
                _ = cancel.cancelled() => {}
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use serde_json::Value;
    use serde_json::json;

    use super::*;

    fn catalog() -> Catalog<Value> {
        Catalog {
            resource: "products".to_string(),
            rows: (1..=12)
                .map(|i| json!({ "id": i, "title": format!("Item {}", i) }))
                .collect(),
        }
    }

    async fn body(response: Response<Full<Bytes>>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_get_slice() {
        let uri: Uri = "/products?limit=5&offset=10".parse().unwrap();
        let response = catalog().respond(&Method::GET, &uri);
        assert_eq!(response.status(), StatusCode::OK);

        let body = body(response).await;
        let ids: Vec<_> = body["products"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, [11, 12]);
    }

    #[tokio::test]
    async fn test_bad_query_is_400() {
        let uri: Uri = "/products?limit=3".parse().unwrap();
        let response = catalog().respond(&Method::GET, &uri);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body(response).await["error"].as_str().unwrap().contains("limit"));
    }

    #[test]
    fn test_unknown_path_and_method_are_404() {
        let uri: Uri = "/users".parse().unwrap();
        assert_eq!(catalog().respond(&Method::GET, &uri).status(), StatusCode::NOT_FOUND);

        let uri: Uri = "/products".parse().unwrap();
        assert_eq!(catalog().respond(&Method::POST, &uri).status(), StatusCode::NOT_FOUND);
    }
}
