//! The route compiler.
//!
//! Materializes every declared route unit on an [`Engine`]. Each resource
//! class gets its own [`SubRouter`], mounted at `base + prefix`, holding one
//! layer per unit in declaration order:
//!
//! ```text
//! unit with preflight      OPTIONS responder, then the verb layer
//! unit with corsOptions    CORS wrapper around the dispatcher
//! unit without CORS        the dispatcher alone
//! OPTIONS unit             the dispatcher alone, whatever its CORS policy
//! unsupported verb         skipped, the class is reported as partly loaded
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use orche_core::registry::{ParameterRegistry, RouteRegistry};
use orche_core::{HttpMethod, RouteClassConfig, RouteUnit};
use orche_router::{join_paths, sanitize};
use serde::{Serialize, Serializer};

use crate::dispatcher::RouteAdapter;
use crate::engine::{Engine, LayerKind, SubRouter};

/// A route that was mounted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedRoute {
    /// Full path, including base path and class prefix.
    pub path: String,
    /// Verb.
    pub http_method: HttpMethod,
}

/// How one resource class was mounted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// Class identifier.
    pub class_name: String,
    /// Sanitized class prefix.
    pub prefix: String,
    /// False if any unit was skipped.
    pub fully_loaded: bool,
    /// Verbs of the skipped units.
    pub skipped_verbs: Vec<String>,
}

/// Everything the compiler mounted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteCompilationReport {
    /// Mounted routes in mount order.
    pub loaded_routes: Vec<LoadedRoute>,
    /// One entry per resource class.
    pub batches: Vec<BatchReport>,
    /// Time spent compiling.
    #[serde(rename = "elapsedMs", serialize_with = "as_millis")]
    pub elapsed: Duration,
}

impl RouteCompilationReport {
    /// Returns true if every unit of every class was mounted.
    pub fn fully_loaded(&self) -> bool {
        self.batches.iter().all(|b| b.fully_loaded)
    }
}

fn as_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

/// Compiles frozen registries onto an engine.
#[derive(Debug)]
pub struct RouteCompiler {
    routes: RouteRegistry,
    parameters: Arc<ParameterRegistry>,
}

impl RouteCompiler {
    /// Creates a compiler over the route and parameter registries.
    pub fn new(routes: RouteRegistry, parameters: Arc<ParameterRegistry>) -> Self {
        Self { routes, parameters }
    }

    /// Mounts every class under `base_path`.
    ///
    /// An empty registry mounts nothing and yields an empty report.
    pub fn compile<E: Engine + ?Sized>(&self, engine: &mut E, base_path: &str) -> RouteCompilationReport {
        let started = Instant::now();
        let base = sanitize(base_path);
        let mut report = RouteCompilationReport::default();

        for config in self.routes.all_configs() {
            let batch = self.compile_class(engine, &base, config, &mut report.loaded_routes);
            if !batch.fully_loaded {
                tracing::warn!(
                    class = %batch.class_name,
                    skipped = ?batch.skipped_verbs,
                    "routes partially loaded"
                );
            }
            report.batches.push(batch);
        }

        report.elapsed = started.elapsed();
        tracing::info!(
            engine = engine.name(),
            routes = report.loaded_routes.len(),
            classes = report.batches.len(),
            elapsed_ms = u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
            "routes compiled"
        );
        report
    }

    fn compile_class<E: Engine + ?Sized>(
        &self,
        engine: &mut E,
        base: &str,
        config: &RouteClassConfig,
        loaded: &mut Vec<LoadedRoute>,
    ) -> BatchReport {
        let prefix = sanitize(&config.prefix);
        let mount_path = join_paths(&[base, &prefix]);
        let mut router = SubRouter::new();
        let mut skipped_verbs = Vec::new();

        for unit in &config.units {
            if !unit.http_method.is_supported() {
                tracing::warn!(
                    class = %config.class_name,
                    handler = %unit.handler_name,
                    verb = %unit.http_method,
                    "unsupported HTTP verb, route skipped"
                );
                skipped_verbs.push(unit.http_method.to_string());
                continue;
            }

            self.mount_unit(engine, &config.class_name, unit, &mut router);
            let path = join_paths(&[&mount_path, &unit.path]);
            tracing::debug!(class = %config.class_name, method = %unit.http_method, path = %path, "route loaded");
            loaded.push(LoadedRoute {
                path,
                http_method: unit.http_method.clone(),
            });
        }

        engine.mount(&mount_path, router);
        BatchReport {
            class_name: config.class_name.clone(),
            prefix,
            fully_loaded: skipped_verbs.is_empty(),
            skipped_verbs,
        }
    }

    fn mount_unit<E: Engine + ?Sized>(
        &self,
        engine: &E,
        class_name: &str,
        unit: &RouteUnit,
        router: &mut SubRouter,
    ) {
        let handler =
            RouteAdapter::new(class_name, unit, Arc::clone(&self.parameters)).into_layer();

        if unit.http_method == HttpMethod::Options {
            router.route(HttpMethod::Options, &unit.path, LayerKind::Bare, handler);
            return;
        }

        match &unit.cors {
            Some(cors) => {
                if cors.preflight {
                    router.route(
                        HttpMethod::Options,
                        &unit.path,
                        LayerKind::Preflight,
                        engine.preflight_responder(&cors.preflight_options()),
                    );
                }
                match &cors.cors_options {
                    Some(options) => router.route(
                        unit.http_method.clone(),
                        &unit.path,
                        LayerKind::Cors,
                        engine.wrap_cors(options, handler),
                    ),
                    None => router.route(unit.http_method.clone(), &unit.path, LayerKind::Bare, handler),
                }
            }
            None => router.route(unit.http_method.clone(), &unit.path, LayerKind::Bare, handler),
        }
    }
}
