//! The reference engine, on hyper and tokio.
//!
//! Requests run through a fixed pipeline on one shared [`Exchange`]:
//!
//! 1. the application CORS policy, if one is installed
//! 2. the interceptor chain
//! 3. the mounted layers whose verb and pattern match, in mount order
//! 4. `404` with the JSON error envelope if nothing responded
//!
//! `GET` layers also answer `HEAD`; the body is dropped from the reply.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use orche_config::{CompatRange, ResolvedConfig};
use orche_core::{CorsConfig, ErrorResponse, Exchange, Flow, HttpMethod, OrcheResult, RawRequest};
use orche_extract::parse_query;
use orche_middleware::{Cors, InterceptorChain};
use orche_router::{join_paths, PathPattern};
use orche_telemetry::{log_request_complete, log_request_error};
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::engine::{Engine, Layer, LayerKind, SubRouter};
use crate::error::ServerError;

/// Engine name, as used in `apiEngine`.
pub const ENGINE_NAME: &str = "hyper";

/// Version of hyper linked into this build, as resolved in `Cargo.lock`.
pub const HYPER_VERSION: &str = env!("ORCHE_HYPER_VERSION");

/// Response body type.
pub type ResponseBody = Full<Bytes>;

struct EngineRoute {
    method: HttpMethod,
    pattern: PathPattern,
    kind: LayerKind,
    layer: Layer,
}

impl EngineRoute {
    fn answers(&self, method: &Method) -> bool {
        self.method.answers(method)
    }
}

struct AppCors {
    preflight: bool,
    cors: Cors,
}

/// HTTP engine serving compiled routes with hyper.
pub struct HyperEngine {
    config: ResolvedConfig,
    host_version: String,
    routes: Vec<EngineRoute>,
    interceptors: InterceptorChain,
    cors: Option<AppCors>,
}

impl std::fmt::Debug for HyperEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperEngine")
            .field("app", &self.config.app_name)
            .field("port", &self.config.port)
            .field("host_version", &self.host_version)
            .field("routes", &self.routes.len())
            .field("interceptors", &self.interceptors)
            .field("cors", &self.cors.is_some())
            .finish()
    }
}

impl HyperEngine {
    /// Creates the engine after checking the hyper version it runs on.
    ///
    /// # Errors
    ///
    /// [`orche_core::OrcheError::IncompatibleEngine`] when hyper is outside the supported range.
    pub fn new(config: ResolvedConfig) -> OrcheResult<Self> {
        Self::with_host_version(config, HYPER_VERSION)
    }

    /// Creates the engine, checking `host_version` instead of the built-in one.
    pub fn with_host_version(config: ResolvedConfig, host_version: &str) -> OrcheResult<Self> {
        let engine = Self {
            config,
            host_version: host_version.to_string(),
            routes: Vec::new(),
            interceptors: InterceptorChain::empty(),
            cors: None,
        };
        engine.compat_range().check(&engine.host_version)?;
        Ok(engine)
    }

    /// The hyper versions this engine binding supports.
    pub fn supported_range() -> CompatRange {
        CompatRange::new(ENGINE_NAME, "1.0.0", "1.x")
    }

    /// Returns the resolved configuration.
    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Returns the full patterns of the mounted layers, in match order.
    pub fn mounted(&self) -> Vec<(HttpMethod, String, LayerKind)> {
        self.routes
            .iter()
            .map(|r| (r.method.clone(), r.pattern.as_str().to_string(), r.kind))
            .collect()
    }

    /// Handles one request.
    ///
    /// Bodies larger than `settings.maxBodyBytes` get `413`; a pipeline that
    /// outlives `settings.requestTimeoutMs` gets `504`.
    pub async fn handle<B>(&self, request: Request<B>) -> Response<ResponseBody>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let started = Instant::now();
        let (parts, body) = request.into_parts();
        let method = parts.method.clone();
        let path = parts.uri.path().to_string();

        let response = match self.read_request(parts, body).await {
            Ok(raw) => self.respond(raw).await,
            Err(error) => {
                log_request_error!(method, path, error.message());
                error_response(&error)
            }
        };

        log_request_complete!(
            method,
            path,
            response.status().as_u16(),
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
        );
        response
    }

    async fn read_request<B>(
        &self,
        parts: http::request::Parts,
        body: B,
    ) -> Result<RawRequest, ErrorResponse>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let limit = self.config.max_body_bytes().unwrap_or(usize::MAX);
        let body = match Limited::new(body, limit).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) if err.is::<LengthLimitError>() => {
                return Err(ErrorResponse::new(
                    format!("request body exceeds {limit} bytes"),
                    StatusCode::PAYLOAD_TOO_LARGE,
                ));
            }
            Err(err) => {
                return Err(ErrorResponse::new(
                    format!("failed to read request body: {err}"),
                    StatusCode::BAD_REQUEST,
                ));
            }
        };

        let query = parse_query(parts.uri.query().unwrap_or(""))
            .map_err(|err| ErrorResponse::new(err.to_string(), StatusCode::BAD_REQUEST))?;

        let mut raw = RawRequest::new(parts.method, parts.uri.path());
        raw.query = query;
        raw.headers = parts.headers;
        raw.body = body;
        Ok(raw)
    }

    async fn respond(&self, raw: RawRequest) -> Response<ResponseBody> {
        let is_head = raw.method == Method::HEAD;
        let not_found = format!("Cannot {} {}", raw.method, raw.path);
        let exchange = Exchange::new(raw);

        let flow = match self.config.request_timeout() {
            Some(limit) => match tokio::time::timeout(limit, self.run(&exchange)).await {
                Ok(flow) => flow,
                Err(_) => {
                    tracing::warn!(timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX), "request timed out");
                    exchange.response().write_error(&ErrorResponse::new(
                        "request timed out",
                        StatusCode::GATEWAY_TIMEOUT,
                    ));
                    Flow::Responded
                }
            },
            None => self.run(&exchange).await,
        };

        if flow == Flow::Next {
            exchange
                .response()
                .write_error(&ErrorResponse::new(not_found, StatusCode::NOT_FOUND));
        }

        let state = exchange.into_response();
        let body = if is_head { Bytes::new() } else { state.body };
        let mut response = Response::new(Full::new(body));
        *response.status_mut() = state.status;
        *response.headers_mut() = state.headers;
        response
    }

    async fn run(&self, exchange: &Exchange) -> Flow {
        if let Some(app) = &self.cors {
            let preflight = {
                let request = exchange.request().read();
                app.preflight && Cors::is_preflight(&request.method, &request.headers)
            };
            if preflight {
                return app.cors.preflight(exchange);
            }
            if app.cors.apply(exchange) == Flow::Responded {
                return Flow::Responded;
            }
        }

        if self.interceptors.run(exchange).await == Flow::Responded {
            return Flow::Responded;
        }

        let (method, path) = {
            let request = exchange.request().read();
            (request.method.clone(), request.path.clone())
        };
        for route in &self.routes {
            if !route.answers(&method) {
                continue;
            }
            let Some(params) = route.pattern.matches(&path) else {
                continue;
            };
            exchange.request().write().params = params;
            if (route.layer)(exchange.clone()).await == Flow::Responded {
                return Flow::Responded;
            }
        }
        Flow::Next
    }

    /// Serves on `listener` until `shutdown` resolves.
    ///
    /// Open connections are asked to finish their in-flight request and
    /// close once shutdown begins.
    pub async fn listen<F>(self: Arc<Self>, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send,
    {
        let (stop_tx, stop_rx) = watch::channel(false);
        tokio::pin!(shutdown);

        if let Ok(addr) = listener.local_addr() {
            match &self.config.init_message {
                Some(message) => tracing::info!(app = %self.config.app_name, addr = %addr, "{message}"),
                None => tracing::info!(app = %self.config.app_name, addr = %addr, "server listening"),
            }
        }

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let engine = Arc::clone(&self);
                            let stop = stop_rx.clone();
                            tokio::spawn(async move {
                                if let Err(e) = engine.serve_connection(stream, stop).await {
                                    tracing::debug!(remote = %remote_addr, error = %e, "connection error");
                                }
                            });
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to accept connection");
                        }
                    }
                }

                () = &mut shutdown => {
                    tracing::info!(app = %self.config.app_name, "shutdown requested, stopping server");
                    break;
                }
            }
        }

        let _ = stop_tx.send(true);
        Ok(())
    }

    /// Binds the configured port and serves until `shutdown` resolves.
    pub async fn serve_with_shutdown<F>(self: Arc<Self>, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send,
    {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        self.listen(listener, shutdown).await
    }

    /// Binds the configured port and serves forever.
    pub async fn serve(self: Arc<Self>) -> Result<(), ServerError> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    async fn serve_connection(
        self: Arc<Self>,
        stream: tokio::net::TcpStream,
        mut stop: watch::Receiver<bool>,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let engine = Arc::clone(&self);
        let service = service_fn(move |req: Request<Incoming>| {
            let engine = Arc::clone(&engine);
            async move { Ok::<_, Infallible>(engine.handle(req).await) }
        });

        let conn = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            _ = stop.changed() => {
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }
}

fn error_response(error: &ErrorResponse) -> Response<ResponseBody> {
    let exchange = Exchange::new(RawRequest::default());
    exchange.response().write_error(error);
    let state = exchange.into_response();
    let mut response = Response::new(Full::new(state.body));
    *response.status_mut() = state.status;
    *response.headers_mut() = state.headers;
    response
}

impl Engine for HyperEngine {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    fn host_version(&self) -> &str {
        &self.host_version
    }

    fn compat_range(&self) -> CompatRange {
        Self::supported_range()
    }

    fn mount(&mut self, path: &str, router: SubRouter) {
        for route in router.into_routes() {
            let full = join_paths(&[path, &route.path]);
            tracing::trace!(method = %route.method, path = %full, kind = ?route.kind, "layer mounted");
            self.routes.push(EngineRoute {
                method: route.method,
                pattern: PathPattern::parse(&full),
                kind: route.kind,
                layer: route.layer,
            });
        }
    }

    fn use_interceptors(&mut self, chain: InterceptorChain) {
        tracing::debug!(interceptors = ?chain.class_names(), "interceptors installed");
        self.interceptors = chain;
    }

    fn use_cors(&mut self, cors: CorsConfig) {
        self.cors = Some(AppCors {
            preflight: cors.preflight,
            cors: Cors::new(cors.preflight_options()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orche_config::OrcheConfig;
    use orche_core::{BoxFuture, CorsOptions};
    use serde_json::Value;

    fn engine(config: OrcheConfig) -> HyperEngine {
        HyperEngine::new(ResolvedConfig::from_draft(config, "test")).unwrap()
    }

    fn text(body: &'static str) -> Layer {
        Arc::new(move |exchange: Exchange| -> BoxFuture<'static, Flow> {
            Box::pin(async move {
                let uuid = exchange.request().read().params.get("uuid").map(str::to_string);
                exchange
                    .response()
                    .send_text(uuid.map_or_else(|| body.to_string(), |u| format!("{body}:{u}")));
                Flow::Responded
            })
        })
    }

    fn pass() -> Layer {
        Arc::new(|_exchange: Exchange| -> BoxFuture<'static, Flow> { Box::pin(async { Flow::Next }) })
    }

    fn request(method: Method, uri: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    async fn body(response: Response<ResponseBody>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[test]
    fn test_incompatible_host_version() {
        let config = ResolvedConfig::from_draft(OrcheConfig::new(), "test");
        assert!(HyperEngine::with_host_version(config.clone(), "1.9.2").is_ok());
        let err = HyperEngine::with_host_version(config, "0.14.28").unwrap_err();
        assert!(err.to_string().contains("hyper"));
    }

    #[test]
    fn test_linked_hyper_passes_the_gate() {
        let linked = semver::Version::parse(HYPER_VERSION).unwrap();
        assert_eq!(linked.major, 1);
        let config = ResolvedConfig::from_draft(OrcheConfig::new(), "test");
        assert_eq!(HyperEngine::new(config).unwrap().host_version(), HYPER_VERSION);
    }

    #[tokio::test]
    async fn test_routes_match_in_mount_order() {
        let mut engine = engine(OrcheConfig::new());
        let mut router = SubRouter::new();
        router.route(HttpMethod::Get, ":uuid", LayerKind::Bare, pass());
        router.route(HttpMethod::Get, ":uuid", LayerKind::Bare, text("second"));
        router.route(HttpMethod::Get, ":uuid", LayerKind::Bare, text("third"));
        engine.mount("/orche/computers", router);

        let response = engine.handle(request(Method::GET, "/orche/computers/42")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await, "second:42");
    }

    #[tokio::test]
    async fn test_unmatched_is_404_envelope() {
        let engine = engine(OrcheConfig::new());
        let response = engine.handle(request(Method::GET, "/nothing")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let value: Value = serde_json::from_slice(&body(response).await).unwrap();
        assert_eq!(value["status"], 404);
        assert_eq!(value["message"], "Cannot GET /nothing");
    }

    #[tokio::test]
    async fn test_head_is_answered_by_get_without_body() {
        let mut engine = engine(OrcheConfig::new());
        let mut router = SubRouter::new();
        router.route(HttpMethod::Get, "", LayerKind::Bare, text("hello"));
        engine.mount("/", router);

        let response = engine.handle(request(Method::HEAD, "/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body(response).await.is_empty());

        let response = engine.handle(request(Method::POST, "/")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_body_limit_is_413() {
        let engine = engine(OrcheConfig::new().setting("maxBodyBytes", 4));
        let request = Request::builder()
            .method(Method::POST)
            .uri("/")
            .body(Full::new(Bytes::from_static(b"too large")))
            .unwrap();
        let response = engine.handle(request).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_timeout_is_504() {
        let mut engine = engine(OrcheConfig::new().setting("requestTimeoutMs", 20));
        let slow: Layer = Arc::new(|_exchange: Exchange| -> BoxFuture<'static, Flow> {
            Box::pin(async {
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                Flow::Next
            })
        });
        let mut router = SubRouter::new();
        router.route(HttpMethod::Get, "", LayerKind::Bare, slow);
        engine.mount("/", router);

        let response = engine.handle(request(Method::GET, "/")).await;
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_query_reaches_the_request() {
        let mut engine = engine(OrcheConfig::new());
        let echo: Layer = Arc::new(|exchange: Exchange| -> BoxFuture<'static, Flow> {
            Box::pin(async move {
                let size = exchange.request().read().query_value("size").map(str::to_string);
                exchange.response().send_text(size.unwrap_or_default());
                Flow::Responded
            })
        });
        let mut router = SubRouter::new();
        router.route(HttpMethod::Get, "", LayerKind::Bare, echo);
        engine.mount("/computers", router);

        let response = engine.handle(request(Method::GET, "/computers?size=10")).await;
        assert_eq!(body(response).await, "10");
    }

    #[tokio::test]
    async fn test_app_cors_answers_preflight_before_routes() {
        let mut engine = engine(OrcheConfig::new());
        engine.use_cors(CorsConfig::with_preflight(
            CorsOptions::default().origins(["https://a.io"]),
        ));
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/anything")
            .header("origin", "https://a.io")
            .header("access-control-request-method", "GET")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = engine.handle(request).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "https://a.io"
        );
    }

    #[tokio::test]
    async fn test_listen_until_shutdown() {
        let engine = Arc::new(engine(OrcheConfig::new()));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(engine.listen(listener, async {
            let _ = rx.await;
        }));
        tx.send(()).unwrap();
        assert!(server.await.unwrap().is_ok());
    }
}
