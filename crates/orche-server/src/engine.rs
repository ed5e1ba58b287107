//! The engine binding.
//!
//! The route compiler only talks to an [`Engine`]. An engine knows how to
//! mount isolated [`SubRouter`]s, how to wrap a handler layer with CORS and
//! how to install the interceptor chain and the application CORS policy.

use std::fmt;
use std::sync::Arc;

use orche_config::CompatRange;
use orche_core::{BoxFuture, CorsConfig, CorsOptions, Exchange, Flow, HttpMethod};
use orche_middleware::{Cors, InterceptorChain};

/// One step of request handling, run against a shared exchange.
pub type Layer = Arc<dyn Fn(Exchange) -> BoxFuture<'static, Flow> + Send + Sync>;

/// What a mounted layer does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    /// Answers CORS preflight requests.
    Preflight,
    /// A handler wrapped with CORS enforcement.
    Cors,
    /// A handler mounted as is.
    Bare,
}

/// A layer registered for a verb and a path relative to its router.
#[derive(Clone)]
pub struct MountedRoute {
    /// Verb the layer answers.
    pub method: HttpMethod,
    /// Path relative to the router's mount point.
    pub path: String,
    /// What the layer does.
    pub kind: LayerKind,
    /// The layer itself.
    pub layer: Layer,
}

impl fmt::Debug for MountedRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountedRoute")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Routes of one resource class, mounted together under its prefix.
#[derive(Debug, Clone, Default)]
pub struct SubRouter {
    routes: Vec<MountedRoute>,
}

impl SubRouter {
    /// Creates an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a layer. Registration order is match order.
    pub fn route(&mut self, method: HttpMethod, path: &str, kind: LayerKind, layer: Layer) {
        self.routes.push(MountedRoute {
            method,
            path: orche_router::sanitize(path),
            kind,
            layer,
        });
    }

    /// Returns the registered layers in order.
    pub fn routes(&self) -> &[MountedRoute] {
        &self.routes
    }

    /// Consumes the router.
    pub fn into_routes(self) -> Vec<MountedRoute> {
        self.routes
    }

    /// Returns the number of layers.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if nothing was registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// The capabilities the route compiler needs from an HTTP engine.
pub trait Engine {
    /// Engine name, as used in configuration.
    fn name(&self) -> &str;

    /// Version of the host engine this binding runs on.
    fn host_version(&self) -> &str;

    /// Host engine versions this binding supports.
    fn compat_range(&self) -> CompatRange;

    /// Mounts `router` under `path`.
    fn mount(&mut self, path: &str, router: SubRouter);

    /// Installs the interceptor chain, run before any route.
    fn use_interceptors(&mut self, chain: InterceptorChain);

    /// Installs an application-wide CORS policy, run before interceptors.
    fn use_cors(&mut self, cors: CorsConfig);

    /// Wraps a handler layer with CORS enforcement.
    fn wrap_cors(&self, options: &CorsOptions, layer: Layer) -> Layer {
        cors_layer(Cors::new(options.clone()), layer)
    }

    /// Builds a preflight responder.
    fn preflight_responder(&self, options: &CorsOptions) -> Layer {
        preflight_layer(Cors::new(options.clone()))
    }
}

/// Decorates the response with CORS headers, then runs `inner`.
pub fn cors_layer(cors: Cors, inner: Layer) -> Layer {
    let cors = Arc::new(cors);
    Arc::new(move |exchange: Exchange| -> BoxFuture<'static, Flow> {
        let cors = Arc::clone(&cors);
        let inner = Arc::clone(&inner);
        Box::pin(async move {
            match cors.apply(&exchange) {
                Flow::Responded => Flow::Responded,
                Flow::Next => inner(exchange).await,
            }
        })
    })
}

/// Answers every request it sees as a CORS preflight.
pub fn preflight_layer(cors: Cors) -> Layer {
    let cors = Arc::new(cors);
    Arc::new(move |exchange: Exchange| -> BoxFuture<'static, Flow> {
        let cors = Arc::clone(&cors);
        Box::pin(async move { cors.preflight(&exchange) })
    })
}
