//! Metadata registries and the registration surface.
//!
//! [`Registry`] owns the three registries populated while an application
//! declares its resources and interceptors:
//!
//! - [`ParameterRegistry`]: positional bindings per (class, method)
//! - [`RouteRegistry`]: route units per resource class
//! - [`InterceptorRegistry`]: interceptors and their processing units
//!
//! The typed builders ([`ResourceBuilder`], [`InterceptorBuilder`]) are the
//! usual way in. They derive a stable class identifier from the Rust type
//! and feed the same registry calls that can also be made directly.
//!
//! # Example
//!
//! ```rust
//! use orche_core::{Args, HandlerResult, Param, Registry, Route};
//!
//! #[derive(Default)]
//! struct Computers;
//!
//! impl Computers {
//!     async fn read(self, args: Args) -> HandlerResult<String> {
//!         Ok(format!("computer {}", args.text(0)?.unwrap_or_default()))
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! registry
//!     .resource::<Computers>("computers")
//!     .route(Route::get(":uuid", "read", Computers::read).bind(0, Param::path("uuid")));
//!
//! let parts = registry.into_parts().unwrap();
//! assert_eq!(parts.routes.len(), 1);
//! ```

mod interceptor;
mod param;
mod route;

use std::any::type_name;
use std::future::Future;
use std::sync::Arc;

pub use interceptor::{
    InterceptorConfig, InterceptorOptions, InterceptorRegistry, ProcessingUnit,
    DEFAULT_INTERCEPTOR_PATH,
};
pub use param::ParameterRegistry;
pub use route::{RouteClassConfig, RouteRegistry, RouteUnit};

use crate::binding::{Param, ParamBinding};
use crate::content::ContentType;
use crate::cors::CorsConfig;
use crate::handler::{bind, per_request, shared, Bound};
use crate::method::HttpMethod;
use crate::response::IntoReply;
use crate::{Args, OrcheError, OrcheResult};

/// The registries of one application, frozen into parts before compiling.
#[derive(Debug, Default)]
pub struct Registry {
    parameters: ParameterRegistry,
    routes: RouteRegistry,
    interceptors: InterceptorRegistry,
    errors: Vec<OrcheError>,
}

/// The frozen output of a [`Registry`].
#[derive(Debug)]
pub struct RegistryParts {
    /// Parameter bindings.
    pub parameters: ParameterRegistry,
    /// Route declarations in mount order.
    pub routes: RouteRegistry,
    /// Resolved interceptors in declaration order.
    pub interceptors: Vec<InterceptorConfig>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a resource class built with `R::default()` per request.
    pub fn resource<R>(&mut self, prefix: &str) -> ResourceBuilder<'_, R>
    where
        R: Default + Send + 'static,
    {
        self.resource_with(prefix, R::default)
    }

    /// Declares a resource class built by `factory` per request.
    pub fn resource_with<R, F>(&mut self, prefix: &str, factory: F) -> ResourceBuilder<'_, R>
    where
        R: Send + 'static,
        F: Fn() -> R + Send + Sync + 'static,
    {
        let class_name = type_name::<R>().to_string();
        self.routes.register_class(prefix, &class_name);
        ResourceBuilder {
            registry: self,
            class_name,
            factory: Arc::new(factory),
        }
    }

    /// Declares an interceptor bound to `instance`.
    pub fn interceptor<I>(&mut self, instance: I, options: InterceptorOptions) -> InterceptorBuilder<'_, I>
    where
        I: Send + Sync + 'static,
    {
        self.interceptor_shared(Arc::new(instance), options)
    }

    /// Declares an interceptor bound to an already shared instance.
    ///
    /// A class declares at most once. Units added through the builder of a
    /// repeated declaration are ignored along with it.
    pub fn interceptor_shared<I>(
        &mut self,
        instance: Arc<I>,
        options: InterceptorOptions,
    ) -> InterceptorBuilder<'_, I>
    where
        I: Send + Sync + 'static,
    {
        let class_name = type_name::<I>().to_string();
        let accepted = self
            .interceptors
            .register_interceptor(options, &class_name, Arc::clone(&instance) as _);
        InterceptorBuilder {
            registry: self,
            class_name,
            instance,
            accepted,
        }
    }

    /// Direct access to the parameter registry.
    pub fn parameters_mut(&mut self) -> &mut ParameterRegistry {
        &mut self.parameters
    }

    /// Direct access to the route registry.
    pub fn routes_mut(&mut self) -> &mut RouteRegistry {
        &mut self.routes
    }

    /// Direct access to the interceptor registry.
    pub fn interceptors_mut(&mut self) -> &mut InterceptorRegistry {
        &mut self.interceptors
    }

    /// Freezes the registry.
    ///
    /// Fails with the first configuration error recorded by a builder.
    pub fn into_parts(self) -> OrcheResult<RegistryParts> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }
        Ok(RegistryParts {
            parameters: self.parameters,
            routes: self.routes,
            interceptors: self.interceptors.resolve(),
        })
    }

    fn record_bindings(&mut self, class_name: &str, method_name: &str, bindings: Vec<ParamBinding>) {
        for binding in bindings {
            self.parameters.register_binding(class_name, method_name, binding);
        }
    }
}

/// A route declaration for resource type `R`.
pub struct Route<R> {
    method: HttpMethod,
    path: String,
    name: String,
    content_type: ContentType,
    cors: Option<CorsConfig>,
    bindings: Vec<ParamBinding>,
    call: Bound<R>,
}

macro_rules! verb_constructors {
    ($($fn_name:ident => $verb:ident),* $(,)?) => {
        $(
            #[doc = concat!("Declares a `", stringify!($verb), "` route.")]
            pub fn $fn_name<F, Fut, T, E>(path: impl Into<String>, name: impl Into<String>, f: F) -> Self
            where
                F: Fn(R, Args) -> Fut + Send + Sync + 'static,
                Fut: Future<Output = Result<T, E>> + Send + 'static,
                T: IntoReply,
                E: Into<anyhow::Error>,
            {
                Self::new(HttpMethod::$verb, path, name, f)
            }
        )*
    };
}

impl<R: Send + 'static> Route<R> {
    /// Declares a route for any verb, supported or not.
    pub fn new<F, Fut, T, E>(
        method: HttpMethod,
        path: impl Into<String>,
        name: impl Into<String>,
        f: F,
    ) -> Self
    where
        F: Fn(R, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: IntoReply,
        E: Into<anyhow::Error>,
    {
        Self {
            method,
            path: path.into(),
            name: name.into(),
            content_type: ContentType::default(),
            cors: None,
            bindings: Vec::new(),
            call: bind(f),
        }
    }

    verb_constructors! {
        get => Get,
        post => Post,
        put => Put,
        patch => Patch,
        delete => Delete,
        head => Head,
        options => Options,
        all => All,
    }

    /// Binds positional argument `index`.
    pub fn bind(mut self, index: usize, param: Param) -> Self {
        self.bindings.push(param.at(index));
        self
    }

    /// Sets the request and response media types.
    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    /// Sets the CORS policy.
    pub fn cors(mut self, cors: CorsConfig) -> Self {
        self.cors = Some(cors);
        self
    }
}

/// Registers routes for resource type `R`.
pub struct ResourceBuilder<'a, R> {
    registry: &'a mut Registry,
    class_name: String,
    factory: Arc<dyn Fn() -> R + Send + Sync>,
}

impl<R: Send + 'static> ResourceBuilder<'_, R> {
    /// Adds a route unit.
    pub fn route(self, route: Route<R>) -> Self {
        let unit = RouteUnit {
            http_method: route.method,
            path: route.path,
            handler_name: route.name.clone(),
            content_type: route.content_type,
            cors: route.cors,
            handler: per_request(Arc::clone(&self.factory), route.call),
        };
        if let Err(err) = self.registry.routes.register_unit(&self.class_name, unit) {
            self.registry.errors.push(err);
        }
        self.registry
            .record_bindings(&self.class_name, &route.name, route.bindings);
        self
    }

    /// Returns the class identifier used for this resource.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }
}

/// A processing unit declaration for interceptor type `I`.
pub struct Processing<I> {
    name: String,
    bindings: Vec<ParamBinding>,
    call: Bound<Arc<I>>,
}

impl<I: Send + Sync + 'static> Processing<I> {
    /// Declares a unit named `name`.
    pub fn new<F, Fut, T, E>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Arc<I>, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: IntoReply,
        E: Into<anyhow::Error>,
    {
        Self {
            name: name.into(),
            bindings: Vec::new(),
            call: bind(f),
        }
    }

    /// Binds positional argument `index`.
    pub fn bind(mut self, index: usize, param: Param) -> Self {
        self.bindings.push(param.at(index));
        self
    }
}

/// Registers processing units for interceptor type `I`.
pub struct InterceptorBuilder<'a, I> {
    registry: &'a mut Registry,
    class_name: String,
    instance: Arc<I>,
    accepted: bool,
}

impl<I: Send + Sync + 'static> InterceptorBuilder<'_, I> {
    /// Adds a processing unit.
    pub fn unit(self, unit: Processing<I>) -> Self {
        if !self.accepted {
            tracing::debug!(class = %self.class_name, unit = %unit.name, "ignoring unit of repeated interceptor");
            return self;
        }
        let callable = shared(Arc::clone(&self.instance), unit.call);
        self.registry
            .interceptors
            .register_processing_unit(&self.class_name, &unit.name, callable);
        self.registry
            .record_bindings(&self.class_name, &unit.name, unit.bindings);
        self
    }

    /// Returns the class identifier used for this interceptor.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }
}
