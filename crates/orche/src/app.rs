//! Application bootstrap.

use std::future::Future;
use std::sync::Arc;

use http::{Request, Response};
use hyper::body::Body;
use orche_config::{ApiEngine, ConfigFileError, ConfigLoader, OrcheConfig, Resolution, ResolvedConfig};
use orche_core::{OrcheResult, Registry};
use orche_middleware::InterceptorChain;
use orche_server::{
    Engine, HyperEngine, ResponseBody, RouteCompilationReport, RouteCompiler, HYPER_VERSION,
};
use orche_telemetry::{init_logging, LogConfig, TelemetryError};
use tokio::net::TcpListener;

/// Builds an [`App`] from a registry and a configuration draft.
///
/// Initialization runs in a fixed order: check the host engine version,
/// resolve configuration, install logging, construct the engine, install
/// interceptors and the application CORS policy, compile routes.
///
/// # Example
///
/// ```rust,ignore
/// use orche::prelude::*;
///
/// let app = Orche::init(registry, OrcheConfig::new().path("orche").port(3001))?;
/// println!("{} routes", app.report().loaded_routes.len());
/// app.run().await?;
/// ```
#[derive(Debug)]
pub struct Orche {
    registry: Registry,
    loader: ConfigLoader,
    host_version: String,
    logging: bool,
}

impl Orche {
    /// Starts a builder for `registry` with the default configuration sources.
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            loader: ConfigLoader::default().with_dotenv(),
            host_version: HYPER_VERSION.to_string(),
            logging: true,
        }
    }

    /// Initializes an application from a programmatic draft.
    ///
    /// The draft is merged with the environment file, the local rc file and
    /// `.env` as described in [`orche_config`].
    pub fn init(registry: Registry, config: OrcheConfig) -> OrcheResult<App> {
        Self::new(registry).config(config).build()
    }

    /// Sets the programmatic draft.
    pub fn config(mut self, config: OrcheConfig) -> Self {
        self.loader = ConfigLoader::new(config).with_dotenv();
        self
    }

    /// Replaces the configuration loader.
    pub fn loader(mut self, loader: ConfigLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Checks this host engine version instead of the linked one.
    pub fn host_version(mut self, version: impl Into<String>) -> Self {
        self.host_version = version.into();
        self
    }

    /// Skips installing the global log subscriber.
    pub fn without_logging(mut self) -> Self {
        self.logging = false;
        self
    }

    /// Runs initialization.
    ///
    /// # Errors
    ///
    /// Fails on an incompatible host engine version or on a registration
    /// error recorded by the registry builders. Unusable configuration files
    /// are not errors; they show up in [`App::warnings`].
    pub fn build(self) -> OrcheResult<App> {
        HyperEngine::supported_range().check(&self.host_version)?;

        let Resolution { config, warnings } = self.loader.resolve();

        if self.logging {
            install_logging(&config);
        }
        tracing::info!(
            app = %config.app_name,
            port = config.port,
            path = %config.mount_path,
            ignored_sources = warnings.len(),
            "initializing"
        );

        if let ApiEngine::Other(name) = &config.api_engine {
            tracing::warn!(requested = %name, using = "hyper", "unknown api engine, using the reference engine");
        }

        let base = config.mount_path.clone();
        let app_cors = config.cors_config.clone();
        let mut engine = HyperEngine::with_host_version(config, &self.host_version)?;

        let parts = self.registry.into_parts()?;
        let parameters = Arc::new(parts.parameters);

        engine.use_interceptors(InterceptorChain::new(parts.interceptors, Arc::clone(&parameters)));
        if let Some(cors) = app_cors {
            engine.use_cors(cors);
        }

        let report = RouteCompiler::new(parts.routes, parameters).compile(&mut engine, &base);

        Ok(App {
            engine: Arc::new(engine),
            report,
            warnings,
        })
    }
}

fn install_logging(config: &ResolvedConfig) {
    match init_logging(&LogConfig::for_app(&config.app_name, config.debug)) {
        Ok(()) => {}
        Err(TelemetryError::LoggingInit(reason)) => {
            tracing::debug!(reason = %reason, "log subscriber already installed");
        }
        Err(err) => eprintln!("orche: logging disabled: {err}"),
    }
}

/// An initialized application.
#[derive(Debug)]
pub struct App {
    engine: Arc<HyperEngine>,
    report: RouteCompilationReport,
    warnings: Vec<ConfigFileError>,
}

impl App {
    /// Returns what the route compiler mounted.
    pub fn report(&self) -> &RouteCompilationReport {
        &self.report
    }

    /// Returns the resolved configuration.
    pub fn config(&self) -> &ResolvedConfig {
        self.engine.config()
    }

    /// Returns the configuration sources that could not be used.
    pub fn warnings(&self) -> &[ConfigFileError] {
        &self.warnings
    }

    /// Handles one request in process.
    pub async fn handle<B>(&self, request: Request<B>) -> Response<ResponseBody>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        self.engine.handle(request).await
    }

    /// Serves on the configured port until the process ends.
    pub async fn run(self) -> OrcheResult<()> {
        Ok(self.engine.serve().await?)
    }

    /// Serves on the configured port until `shutdown` resolves.
    pub async fn run_until<F>(self, shutdown: F) -> OrcheResult<()>
    where
        F: Future<Output = ()> + Send,
    {
        Ok(self.engine.serve_with_shutdown(shutdown).await?)
    }

    /// Serves on an already bound listener until `shutdown` resolves.
    pub async fn listen<F>(self, listener: TcpListener, shutdown: F) -> OrcheResult<()>
    where
        F: Future<Output = ()> + Send,
    {
        Ok(self.engine.listen(listener, shutdown).await?)
    }
}
