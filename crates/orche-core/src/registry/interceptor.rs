//! Interceptor declarations.
//!
//! Registration happens in two phases. Processing units are collected by
//! class identifier in any order relative to the interceptor declaration
//! itself; [`InterceptorRegistry::resolve`] then joins both into final
//! [`InterceptorConfig`]s.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::handler::Callable;
use crate::method::HttpMethod;

/// The default interceptor path: every request.
pub const DEFAULT_INTERCEPTOR_PATH: &str = "/*";

/// Where and when an interceptor applies.
///
/// ```rust
/// use orche_core::{HttpMethod, InterceptorOptions};
///
/// let options = InterceptorOptions::at("/orche/restricted")
///     .method(HttpMethod::Get)
///     .order(1);
/// assert_eq!(options.paths(), ["/orche/restricted".to_string()]);
///
/// let any = InterceptorOptions::default();
/// assert_eq!(any.paths(), ["/*".to_string()]);
/// assert_eq!(any.methods_filter(), [HttpMethod::All]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptorOptions {
    paths: Vec<String>,
    methods: Vec<HttpMethod>,
    order: Option<i64>,
}

impl Default for InterceptorOptions {
    fn default() -> Self {
        Self {
            paths: vec![DEFAULT_INTERCEPTOR_PATH.to_string()],
            methods: vec![HttpMethod::All],
            order: None,
        }
    }
}

impl InterceptorOptions {
    /// Applies to one path pattern.
    pub fn at(path: impl Into<String>) -> Self {
        Self::at_paths([path])
    }

    /// Applies to several path patterns. An empty list means every path.
    pub fn at_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let paths: Vec<String> = paths.into_iter().map(Into::into).collect();
        Self {
            paths,
            ..Self::default()
        }
        .normalized()
    }

    /// Restricts to a single verb.
    pub fn method(self, method: HttpMethod) -> Self {
        self.methods([method])
    }

    /// Restricts to a set of verbs. An empty set means every verb.
    pub fn methods<I: IntoIterator<Item = HttpMethod>>(mut self, methods: I) -> Self {
        self.methods = methods.into_iter().collect();
        self.normalized()
    }

    /// Sets the priority; lower runs first, unordered runs last.
    pub fn order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    /// Returns the path patterns.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Returns the verb filter.
    pub fn methods_filter(&self) -> &[HttpMethod] {
        &self.methods
    }

    /// Returns the priority.
    pub fn priority(&self) -> Option<i64> {
        self.order
    }

    fn normalized(mut self) -> Self {
        if self.paths.is_empty() {
            self.paths.push(DEFAULT_INTERCEPTOR_PATH.to_string());
        }
        if self.methods.is_empty() {
            self.methods.push(HttpMethod::All);
        }
        self
    }
}

/// A named processing step of an interceptor.
#[derive(Clone)]
pub struct ProcessingUnit {
    /// Method name, used to look up parameter bindings.
    pub name: String,
    /// The erased unit, already bound to the interceptor instance.
    pub callable: Callable,
}

impl fmt::Debug for ProcessingUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessingUnit")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A resolved interceptor.
#[derive(Clone)]
pub struct InterceptorConfig {
    /// Stable class identifier.
    pub class_name: String,
    /// Path patterns; a request matches if any pattern matches.
    pub paths: Vec<String>,
    /// Verb filter.
    pub methods: Vec<HttpMethod>,
    /// Priority; `None` runs after every ordered interceptor.
    pub order: Option<i64>,
    /// The live instance the units are bound to.
    pub instance: Arc<dyn Any + Send + Sync>,
    /// Units in declaration order.
    pub units: Vec<ProcessingUnit>,
}

impl fmt::Debug for InterceptorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorConfig")
            .field("class_name", &self.class_name)
            .field("paths", &self.paths)
            .field("methods", &self.methods)
            .field("order", &self.order)
            .field("units", &self.units)
            .finish_non_exhaustive()
    }
}

struct Declared {
    class_name: String,
    options: InterceptorOptions,
    instance: Arc<dyn Any + Send + Sync>,
}

/// Interceptor declarations and their pending processing units.
#[derive(Default)]
pub struct InterceptorRegistry {
    declared: Vec<Declared>,
    pending: HashMap<String, Vec<ProcessingUnit>>,
}

impl fmt::Debug for InterceptorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorRegistry")
            .field("declared", &self.declared.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl InterceptorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an interceptor class. The first declaration wins.
    pub fn register_interceptor(
        &mut self,
        options: InterceptorOptions,
        class_name: &str,
        instance: Arc<dyn Any + Send + Sync>,
    ) -> bool {
        if self.declared.iter().any(|d| d.class_name == class_name) {
            tracing::debug!(class = class_name, "interceptor already registered, ignoring");
            return false;
        }
        self.declared.push(Declared {
            class_name: class_name.to_string(),
            options,
            instance,
        });
        true
    }

    /// Adds a processing unit for a class, declared or not yet declared.
    pub fn register_processing_unit(&mut self, class_name: &str, name: &str, callable: Callable) {
        self.pending
            .entry(class_name.to_string())
            .or_default()
            .push(ProcessingUnit {
                name: name.to_string(),
                callable,
            });
    }

    /// Returns the number of declared interceptors.
    pub fn len(&self) -> usize {
        self.declared.len()
    }

    /// Returns true if no interceptor was declared.
    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }

    /// Joins declarations with their units, in declaration order.
    ///
    /// Units whose class never declared an interceptor are dropped.
    pub fn resolve(mut self) -> Vec<InterceptorConfig> {
        let configs: Vec<InterceptorConfig> = self
            .declared
            .into_iter()
            .map(|declared| {
                let units = self.pending.remove(&declared.class_name).unwrap_or_default();
                if units.is_empty() {
                    tracing::warn!(class = %declared.class_name, "interceptor has no processing units");
                }
                InterceptorConfig {
                    class_name: declared.class_name,
                    paths: declared.options.paths,
                    methods: declared.options.methods,
                    order: declared.options.order,
                    instance: declared.instance,
                    units,
                }
            })
            .collect();

        for (class_name, units) in self.pending {
            tracing::warn!(
                class = %class_name,
                units = units.len(),
                "processing units registered for a class that is not an interceptor"
            );
        }
        configs
    }
}
