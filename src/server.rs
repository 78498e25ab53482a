//! HTTP surface
//!
//! Routes:
//! - `GET /` recent translated items (JSON)
//! - `GET /catalan_news/{id}` one translated item (JSON)
//! - `GET /sitemap.xml`
//! - `GET|POST /do-translate?code=&id=` runs the enrichment worker once
//! - `POST /send-telegram` runs the notifier once
//! - `GET /metrics` Prometheus text format, when enabled
//! - `OPTIONS *` CORS preflight
//!
//! Every response except the sitemap and metrics carries the permissive CORS
//! headers.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{self, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn, Instrument};

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::metrics;
use crate::pipeline::{EnrichOutcome, NotifyOutcome, Pipeline};
use crate::publication::{PublicationGateway, SiteLinks};
use crate::sitemap::render_sitemap;

const ITEM_ROUTE_PREFIX: &str = "/catalan_news/";

/// Shared state of every request handler
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub gateway: PublicationGateway,
    pub links: SiteLinks,
    /// Shared secret of `/do-translate`; unset rejects every call
    pub translate_secret: Option<String>,
    pub metrics_enabled: bool,
}

impl AppState {
    pub fn from_config(pipeline: Arc<Pipeline>, config: &Config) -> Result<Self> {
        Ok(Self {
            gateway: PublicationGateway::new(pipeline.store().clone(), config.page_size),
            links: SiteLinks::new(&config.site_base_url)?,
            translate_secret: config.translate_secret.clone().filter(|s| !s.is_empty()),
            metrics_enabled: config.metrics_enabled,
            pipeline,
        })
    }
}

/// Accepts connections until shutdown is broadcast
pub async fn serve(addr: SocketAddr, state: Arc<AppState>, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(address = %addr, "HTTP server listening");

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "Failed to accept connection");
                        continue;
                    }
                };
                let io = TokioIo::new(stream);
                let state = state.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        let state = state.clone();
                        async move { Ok::<_, Infallible>(handle(state, req).await) }
                    });
                    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                        debug!(peer = %peer, error = %e, "Error serving connection");
                    }
                });
            }
            _ = shutdown_rx.recv() => {
                info!("HTTP server shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// Routes one request. Request bodies are never read.
pub async fn handle<B>(state: Arc<AppState>, req: Request<B>) -> Response<Full<Bytes>> {
    let correlation_id = uuid::Uuid::new_v4().to_string();
    let span = tracing::info_span!(
        "request",
        correlation_id = %correlation_id,
        method = %req.method(),
        path = %req.uri().path()
    );

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);
    drop(req);

    async move {
        let (route, response) = route(&state, &method, &path, query.as_deref()).await;
        metrics::record_http_response(route, response.status().as_u16());
        debug!(status = response.status().as_u16(), "Request handled");
        response
    }
    .instrument(span)
    .await
}

async fn route(
    state: &AppState,
    method: &Method,
    path: &str,
    query: Option<&str>,
) -> (&'static str, Response<Full<Bytes>>) {
    if method == Method::OPTIONS {
        return ("preflight", with_cors(empty(StatusCode::NO_CONTENT)));
    }

    match path {
        "/" => ("list", with_cors(get_only(method, || list_recent(state)).await)),
        "/sitemap.xml" => ("sitemap", get_only(method, || sitemap(state)).await),
        "/metrics" if state.metrics_enabled => ("metrics", get_only(method, metrics_text).await),
        "/do-translate" => {
            let response = if method == Method::GET || method == Method::POST {
                do_translate(state, query).await
            } else {
                method_not_allowed()
            };
            ("do_translate", with_cors(response))
        }
        "/send-telegram" => {
            let response = if method == Method::POST {
                send_telegram(state).await
            } else {
                method_not_allowed()
            };
            ("send_telegram", with_cors(response))
        }
        _ => match path.strip_prefix(ITEM_ROUTE_PREFIX) {
            Some(id) => ("item", with_cors(get_only(method, || news_detail(state, id)).await)),
            None => ("not_found", with_cors(text(StatusCode::NOT_FOUND, "Not Found"))),
        },
    }
}

async fn get_only<F, Fut>(method: &Method, handler: F) -> Response<Full<Bytes>>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Response<Full<Bytes>>>,
{
    if method == Method::GET {
        handler().await
    } else {
        method_not_allowed()
    }
}

async fn list_recent(state: &AppState) -> Response<Full<Bytes>> {
    match state.gateway.list_recent().await {
        Ok(items) if items.is_empty() => text(StatusCode::NOT_FOUND, "No records found."),
        Ok(items) => json(&items),
        Err(e) => {
            error!(error = %e, "Error fetching records");
            text(StatusCode::INTERNAL_SERVER_ERROR, format!("Error fetching records: {}", e))
        }
    }
}

async fn news_detail(state: &AppState, raw_id: &str) -> Response<Full<Bytes>> {
    let Ok(id) = raw_id.trim_end_matches('/').parse::<i64>() else {
        return text(StatusCode::BAD_REQUEST, "Invalid URL format");
    };

    match state.gateway.get(id).await {
        Ok(Some(item)) => json(&item),
        Ok(None) => text(StatusCode::NOT_FOUND, "News item not found"),
        Err(e) => {
            error!(item_id = id, error = %e, "Error fetching news detail");
            text(StatusCode::INTERNAL_SERVER_ERROR, format!("Error fetching news detail: {}", e))
        }
    }
}

async fn sitemap(state: &AppState) -> Response<Full<Bytes>> {
    match state.gateway.all().await {
        Ok(items) => {
            let mut response = Response::new(Full::new(Bytes::from(render_sitemap(&items, &state.links))));
            let headers = response.headers_mut();
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/xml"));
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=3600"));
            response
        }
        Err(e) => {
            error!(error = %e, "Error generating sitemap");
            text(StatusCode::INTERNAL_SERVER_ERROR, "Error generating sitemap")
        }
    }
}

async fn metrics_text() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(metrics::gather_metrics())));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4"),
    );
    response
}

/// Query of `/do-translate`
#[derive(Debug, Default)]
struct TranslateQuery {
    code: Option<String>,
    id: Option<String>,
}

impl TranslateQuery {
    fn parse(query: Option<&str>) -> Self {
        let mut parsed = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "code" => parsed.code = Some(value.into_owned()),
                "id" => parsed.id = Some(value.into_owned()),
                _ => {}
            }
        }
        parsed
    }

    /// Secret check first, then the optional numeric id
    fn authorize(&self, secret: Option<&str>) -> Result<Option<i64>> {
        match (secret, self.code.as_deref()) {
            (Some(secret), Some(code)) if secret == code => {}
            _ => return Err(PipelineError::Unauthorized),
        }

        match self.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            None => Ok(None),
            Some(id) => id
                .parse::<i64>()
                .map(Some)
                .map_err(|_| PipelineError::InvalidRequest(format!("id must be numeric, got {:?}", id))),
        }
    }
}

async fn do_translate(state: &AppState, query: Option<&str>) -> Response<Full<Bytes>> {
    let id = match TranslateQuery::parse(query).authorize(state.translate_secret.as_deref()) {
        Ok(id) => id,
        Err(PipelineError::Unauthorized) => {
            warn!("Rejected translate trigger with a wrong secret");
            return text(StatusCode::FORBIDDEN, "Forbidden");
        }
        Err(e) => return text(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let outcome = match state.pipeline.enricher() {
        Ok(enricher) => enricher.enrich_one(id).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(EnrichOutcome::Enriched(_)) => text(StatusCode::OK, "Translation completed and record updated."),
        Ok(EnrichOutcome::NoWork) => text(StatusCode::NOT_FOUND, "No untranslated records found."),
        Err(e) => error_response(&e, "Translation failed."),
    }
}

async fn send_telegram(state: &AppState) -> Response<Full<Bytes>> {
    let outcome = match state.pipeline.notifier() {
        Ok(notifier) => notifier.notify_one().await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(NotifyOutcome::Sent { .. }) => text(StatusCode::OK, "Message sent and database updated"),
        Ok(NotifyOutcome::NoWork) => text(StatusCode::OK, "No records to send to Telegram"),
        Err(e) => error_response(&e, "Failed to send message to Telegram"),
    }
}

/// Malformed provider payloads map to 502, everything else to 500
fn error_response(e: &PipelineError, message: &str) -> Response<Full<Bytes>> {
    error!(error = %e, kind = e.kind(), "Request failed");
    if e.is_malformed() {
        text(StatusCode::BAD_GATEWAY, format!("{} {}", message, e))
    } else {
        text(StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
    }
}

fn with_cors(mut response: Response<Full<Bytes>>) -> Response<Full<Bytes>> {
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    response
}

fn empty(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

fn text(status: StatusCode, body: impl Into<String>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.into())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

fn json<T: Serialize>(value: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(value) {
        Ok(body) => {
            let mut response = Response::new(Full::new(Bytes::from(body)));
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            response
        }
        Err(e) => {
            error!(error = %e, "Failed to serialize response");
            text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

fn method_not_allowed() -> Response<Full<Bytes>> {
    text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}
