//! End-to-end tests through `Orche` initialization.

use bytes::Bytes;
use http::{Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use orche::config::ConfigLoader;
use orche::prelude::*;
use serde_json::{json, Value};

#[derive(Default)]
struct Computers;

impl Computers {
    async fn read(self, args: Args) -> HandlerResult<String> {
        Ok(args.text(0)?.unwrap_or_default().to_string())
    }

    async fn maybe(self, args: Args) -> HandlerResult<Option<String>> {
        let uuid = args.text(0)?.unwrap_or_default();
        Ok((uuid == "42").then(|| "found".to_string()))
    }

    async fn fallback(self, _args: Args) -> HandlerResult<&'static str> {
        Ok("fallback")
    }
}

fn app_in(dir: &std::path::Path, registry: Registry, config: OrcheConfig) -> OrcheResult<App> {
    Orche::new(registry)
        .loader(
            ConfigLoader::new(config)
                .without_env_file()
                .with_working_dir(dir),
        )
        .without_logging()
        .build()
}

async fn get(app: &App, uri: &str) -> (StatusCode, Bytes) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Full::new(Bytes::new()))
        .unwrap();
    let response = app.handle(request).await;
    let status = response.status();
    (status, response.into_body().collect().await.unwrap().to_bytes())
}

#[tokio::test]
async fn test_path_value_is_delivered_as_string() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = Registry::new();
    registry
        .resource::<Computers>("computers")
        .route(Route::get(":uuid", "read", Computers::read).bind(0, Param::path("uuid")));

    let app = app_in(dir.path(), registry, OrcheConfig::new().path("/orche/").port(3001)).unwrap();
    assert_eq!(app.config().mount_path, "/orche");
    assert_eq!(app.config().port, 3001);
    assert_eq!(app.report().loaded_routes[0].path, "/orche/computers/:uuid");

    let (status, body) = get(&app, "/orche/computers/42").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "42");
}

#[tokio::test]
async fn test_empty_result_falls_through() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = Registry::new();
    registry
        .resource::<Computers>("computers")
        .route(Route::get(":uuid", "maybe", Computers::maybe).bind(0, Param::path("uuid")))
        .route(Route::get("known", "fallback", Computers::fallback));

    let app = app_in(dir.path(), registry, OrcheConfig::new()).unwrap();

    let (_, body) = get(&app, "/computers/42").await;
    assert_eq!(body, "found");

    let (status, body) = get(&app, "/computers/known").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "fallback");

    let (status, body) = get(&app, "/computers/unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value, json!({ "message": "Cannot GET /computers/unknown", "status": 404 }));
}

#[tokio::test]
async fn test_local_rc_file_beats_programmatic_draft() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(".orcherc"),
        r#"{"port": 8080, "path": "api", "appName": "computers"}"#,
    )
    .unwrap();

    let app = app_in(dir.path(), Registry::new(), OrcheConfig::new().port(3001)).unwrap();
    assert!(app.warnings().is_empty());
    assert_eq!(app.config().port, 8080);
    assert_eq!(app.config().mount_path, "/api");
    assert_eq!(app.config().app_name, "computers");
    assert!(app.report().loaded_routes.is_empty());
}

#[tokio::test]
async fn test_missing_rc_file_is_a_warning_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_in(dir.path(), Registry::new(), OrcheConfig::new()).unwrap();
    assert_eq!(app.warnings().len(), 1);
    assert!(app.warnings()[0].is_not_found());
    assert_eq!(app.config().port, 3000);
}

#[test]
fn test_incompatible_host_version_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = Orche::new(Registry::new())
        .loader(ConfigLoader::default().without_env_file().with_working_dir(dir.path()))
        .host_version("0.14.28")
        .without_logging()
        .build()
        .unwrap_err();

    assert!(matches!(err, OrcheError::IncompatibleEngine { .. }));
    assert!(err.to_string().contains("hyper"));
}

#[test]
fn test_version_gate_runs_before_any_source_is_read() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".env"), "ORCHE_BOOTSTRAP_DOTENV_MARKER=loaded\n").unwrap();
    let loader = || {
        ConfigLoader::default()
            .without_env_file()
            .with_working_dir(dir.path())
            .with_dotenv()
    };

    let err = Orche::new(Registry::new())
        .loader(loader())
        .host_version("0.14.28")
        .without_logging()
        .build()
        .unwrap_err();
    assert!(matches!(err, OrcheError::IncompatibleEngine { .. }));
    assert!(std::env::var("ORCHE_BOOTSTRAP_DOTENV_MARKER").is_err());

    Orche::new(Registry::new())
        .loader(loader())
        .without_logging()
        .build()
        .unwrap();
    assert_eq!(std::env::var("ORCHE_BOOTSTRAP_DOTENV_MARKER").unwrap(), "loaded");
}

#[test]
fn test_unknown_engine_falls_back_to_hyper() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_in(
        dir.path(),
        Registry::new(),
        OrcheConfig::new().api_engine(ApiEngine::Other("koa".into())),
    )
    .unwrap();
    assert_eq!(app.config().api_engine, ApiEngine::Other("koa".into()));
}

#[tokio::test]
async fn test_app_cors_applies_to_every_route() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = Registry::new();
    registry
        .resource::<Computers>("computers")
        .route(Route::get(":uuid", "read", Computers::read).bind(0, Param::path("uuid")));

    let app = app_in(
        dir.path(),
        registry,
        OrcheConfig::new().cors_config(CorsConfig::enforce(CorsOptions::default())),
    )
    .unwrap();

    let request = Request::builder()
        .uri("/computers/1")
        .header("origin", "https://anywhere.io")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let response = app.handle(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}
