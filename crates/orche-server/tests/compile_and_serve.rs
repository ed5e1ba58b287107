//! Route compilation against the hyper engine.
//!
//! Resources are declared through the `Registry` builders, compiled onto a
//! `HyperEngine` and exercised through `HyperEngine::handle` without a socket.

use std::sync::Arc;

use bytes::Bytes;
use http::{Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use orche_config::{OrcheConfig, ResolvedConfig};
use orche_core::{
    Args, CorsConfig, CorsOptions, ErrorResponse, HandlerResult, HttpMethod, InterceptorOptions,
    Param, Processing, Registry, Route,
};
use orche_middleware::InterceptorChain;
use orche_server::{Engine, HyperEngine, LayerKind, RouteCompilationReport, RouteCompiler};
use serde_json::{json, Value};

#[derive(Default)]
struct Computers;

impl Computers {
    async fn list(self, args: Args) -> HandlerResult<Value> {
        let size: Option<u32> = args.parse(0)?;
        Ok(json!({ "size": size }))
    }

    async fn read(self, args: Args) -> HandlerResult<String> {
        Ok(args.text(0)?.unwrap_or_default().to_string())
    }

    async fn create(self, args: Args) -> HandlerResult<Value> {
        Ok(args.body(0)?.clone())
    }

    async fn purge(self, _args: Args) -> HandlerResult<()> {
        Ok(())
    }
}

/// Rewrites the `x-tenant` header before any route runs.
struct TenantRewrite;

fn compile(registry: Registry, config: OrcheConfig) -> (HyperEngine, RouteCompilationReport) {
    let parts = registry.into_parts().unwrap();
    let parameters = Arc::new(parts.parameters);
    let resolved = ResolvedConfig::from_draft(config, "tests");
    let base = resolved.mount_path.clone();

    let mut engine = HyperEngine::new(resolved).unwrap();
    engine.use_interceptors(InterceptorChain::new(parts.interceptors, Arc::clone(&parameters)));
    let report = RouteCompiler::new(parts.routes, parameters).compile(&mut engine, &base);
    (engine, report)
}

fn computers() -> Registry {
    let mut registry = Registry::new();
    registry
        .resource::<Computers>("computers")
        .route(Route::get("", "list", Computers::list).bind(0, Param::query("size")))
        .route(Route::get(":uuid", "read", Computers::read).bind(0, Param::path("uuid")))
        .route(Route::post("", "create", Computers::create).bind(0, Param::body()));
    registry
}

async fn call(engine: &HyperEngine, method: Method, uri: &str, body: &'static str) -> (StatusCode, Bytes) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap();
    let response = engine.handle(request).await;
    let status = response.status();
    (status, response.into_body().collect().await.unwrap().to_bytes())
}

#[tokio::test]
async fn test_computers_resource_under_base_path() {
    let (engine, report) = compile(computers(), OrcheConfig::new().path("orche"));

    assert!(report.fully_loaded());
    let paths: Vec<_> = report.loaded_routes.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["/orche/computers", "/orche/computers/:uuid", "/orche/computers"]
    );

    let (status, body) = call(&engine, Method::GET, "/orche/computers/42", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "42");

    let (_, body) = call(&engine, Method::GET, "/orche/computers?size=10", "").await;
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!({ "size": 10 }));

    let (status, body) = call(&engine, Method::POST, "/orche/computers", r#"{"name":"mac"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!({ "name": "mac" }));
}

#[tokio::test]
async fn test_path_values_arrive_decoded() {
    let (engine, _) = compile(computers(), OrcheConfig::new().path("orche"));
    let (status, body) = call(&engine, Method::GET, "/orche/computers/mac%20book", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "mac book");
}

#[tokio::test]
async fn test_unsupported_verb_leaves_siblings_mounted() {
    let mut registry = computers();
    registry
        .resource::<Computers>("computers")
        .route(Route::new(HttpMethod::Other("PURGE".into()), "", "purge", Computers::purge));

    let (engine, report) = compile(registry, OrcheConfig::new());
    assert!(!report.fully_loaded());
    assert_eq!(report.batches[0].skipped_verbs, vec!["PURGE".to_string()]);
    assert_eq!(report.loaded_routes.len(), 3);

    let (status, _) = call(&engine, Method::GET, "/computers/7", "").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_preflight_is_mounted_ahead_of_the_verb() {
    let options = CorsOptions::default().origins(["https://a.io"]);
    let mut registry = Registry::new();
    registry.resource::<Computers>("computers").route(
        Route::get(":uuid", "read", Computers::read)
            .bind(0, Param::path("uuid"))
            .cors(CorsConfig::with_preflight(options)),
    );
    let (engine, _) = compile(registry, OrcheConfig::new());

    assert_eq!(
        engine.mounted(),
        vec![
            (HttpMethod::Options, "/computers/:uuid".to_string(), LayerKind::Preflight),
            (HttpMethod::Get, "/computers/:uuid".to_string(), LayerKind::Cors),
        ]
    );

    let request = Request::builder()
        .method(Method::GET)
        .uri("/computers/9")
        .header("origin", "https://a.io")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let response = engine.handle(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "https://a.io");
}

#[tokio::test]
async fn test_interceptor_rewrite_is_seen_by_the_handler() {
    #[derive(Default)]
    struct Tenants;

    impl Tenants {
        async fn current(self, args: Args) -> HandlerResult<String> {
            Ok(args.text(0)?.unwrap_or("none").to_string())
        }
    }

    let mut registry = Registry::new();
    registry
        .interceptor(TenantRewrite, InterceptorOptions::at("/tenants"))
        .unit(
            Processing::new("rewrite", |_me: Arc<TenantRewrite>, args: Args| async move {
                args.request(0)?.write().set_header("x-tenant", "acme");
                Ok::<_, anyhow::Error>(())
            })
            .bind(0, Param::request()),
        );
    registry
        .resource::<Tenants>("tenants")
        .route(Route::get("", "current", Tenants::current).bind(0, Param::header("x-tenant")));

    let (engine, _) = compile(registry, OrcheConfig::new());
    let (status, body) = call(&engine, Method::GET, "/tenants", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "acme");
}

#[tokio::test]
async fn test_get_guard_also_covers_head() {
    struct Guard;

    let mut registry = computers();
    registry
        .interceptor(
            Guard,
            InterceptorOptions::at("/orche/computers").method(HttpMethod::Get),
        )
        .unit(Processing::new("deny", |_g: Arc<Guard>, _args: Args| async {
            Ok::<_, anyhow::Error>(ErrorResponse::new("unauthorized", StatusCode::UNAUTHORIZED))
        }));
    let (engine, _) = compile(registry, OrcheConfig::new().path("orche"));

    let (status, _) = call(&engine, Method::GET, "/orche/computers", "").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(&engine, Method::HEAD, "/orche/computers", "").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.is_empty());

    let (status, _) = call(&engine, Method::POST, "/orche/computers", "{}").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_rejected_parameter_is_400_with_details() {
    let mut registry = Registry::new();
    registry.resource::<Computers>("computers").route(
        Route::get("", "list", Computers::list).bind(
            0,
            Param::query("size").validate(|v| match v.as_str().map(str::parse::<u32>) {
                None | Some(Ok(1..=50)) => Ok(()),
                _ => Err(json!({ "size": "between 1 and 50" })),
            }),
        ),
    );
    let (engine, _) = compile(registry, OrcheConfig::new());

    let (status, body) = call(&engine, Method::GET, "/computers?size=500", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        serde_json::from_slice::<Value>(&body).unwrap(),
        json!({
            "message": "invalid query parameter `size`",
            "details": { "size": "between 1 and 50" },
            "status": 400
        })
    );

    let (status, body) = call(&engine, Method::GET, "/computers?size=5", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!({ "size": 5 }));
}

#[tokio::test]
async fn test_handler_error_is_500_envelope() {
    #[derive(Default)]
    struct Broken;

    impl Broken {
        async fn read(self, _args: Args) -> HandlerResult<String> {
            Err(anyhow::anyhow!("disk on fire"))
        }
    }

    let mut registry = Registry::new();
    registry.resource::<Broken>("broken").route(Route::get("", "read", Broken::read));
    let (engine, _) = compile(registry, OrcheConfig::new());

    let (status, body) = call(&engine, Method::GET, "/broken", "").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        serde_json::from_slice::<Value>(&body).unwrap(),
        json!({ "message": "disk on fire", "status": 500 })
    );
}
