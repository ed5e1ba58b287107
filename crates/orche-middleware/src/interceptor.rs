//! The interceptor chain.
//!
//! For every request the chain:
//!
//! 1. **Matches** interceptors whose path patterns and verb filter cover the
//!    request. A pattern matches the request path exactly, as a prefix on a
//!    segment boundary, or through wildcards (`/*` covers every path).
//! 2. **Orders** them ascending by priority. Unordered interceptors run
//!    after every ordered one; ties keep registration order.
//! 3. **Executes** their processing units in declaration order. A unit that
//!    writes a response stops the chain; a unit that returns nothing lets it
//!    advance.

use std::sync::Arc;

use orche_core::registry::ParameterRegistry;
use orche_core::{DispatchError, Exchange, Flow, InterceptorConfig, NextHandle};
use orche_extract::build_args;
use orche_router::PathPattern;

struct Entry {
    config: InterceptorConfig,
    patterns: Vec<PathPattern>,
}

impl Entry {
    fn matches(&self, method: &http::Method, path: &str) -> Option<orche_router::Params> {
        if !self.config.methods.iter().any(|m| m.answers(method)) {
            return None;
        }
        self.patterns.iter().find_map(|p| p.matches_prefix(path))
    }
}

/// Ordered interceptors ready to run against requests.
pub struct InterceptorChain {
    entries: Vec<Entry>,
    parameters: Arc<ParameterRegistry>,
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("interceptors", &self.class_names())
            .finish_non_exhaustive()
    }
}

impl InterceptorChain {
    /// Builds the chain, sorting interceptors by priority.
    pub fn new(mut interceptors: Vec<InterceptorConfig>, parameters: Arc<ParameterRegistry>) -> Self {
        interceptors.sort_by_key(|config| (config.order.is_none(), config.order));
        let entries = interceptors
            .into_iter()
            .map(|config| Entry {
                patterns: config.paths.iter().map(|p| PathPattern::parse(p)).collect(),
                config,
            })
            .collect();
        Self {
            entries,
            parameters,
        }
    }

    /// An empty chain.
    pub fn empty() -> Self {
        Self::new(Vec::new(), Arc::new(ParameterRegistry::new()))
    }

    /// Returns the number of interceptors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no interceptors.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the interceptor classes in execution order.
    pub fn class_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|e| e.config.class_name.as_str())
            .collect()
    }

    /// Returns the classes that would run for a request, in order.
    pub fn matching(&self, method: &http::Method, path: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.matches(method, path).is_some())
            .map(|e| e.config.class_name.as_str())
            .collect()
    }

    /// Runs every matching interceptor against the exchange.
    ///
    /// Returns [`Flow::Responded`] as soon as a unit wrote a response.
    pub async fn run(&self, exchange: &Exchange) -> Flow {
        let (method, path) = {
            let request = exchange.request().read();
            (request.method.clone(), request.path.clone())
        };

        for entry in &self.entries {
            let Some(captured) = entry.matches(&method, &path) else {
                continue;
            };
            exchange.request().write().params = captured;

            for unit in &entry.config.units {
                let class = entry.config.class_name.as_str();
                let next = NextHandle::new();
                let bindings = self.parameters.lookup(class, &unit.name);
                let outcome = match build_args(bindings, exchange, &next) {
                    Ok(args) => (unit.callable)(args).await,
                    Err(err) => Err(DispatchError::from(err)),
                };
                if let Err(err) = &outcome {
                    tracing::error!(interceptor = class, unit = %unit.name, error = %err, "interceptor unit failed");
                }

                match exchange.settle(outcome, &mime::APPLICATION_JSON) {
                    Flow::Responded => {
                        tracing::debug!(interceptor = class, unit = %unit.name, "interceptor responded");
                        return Flow::Responded;
                    }
                    Flow::Next => {
                        tracing::trace!(interceptor = class, unit = %unit.name, called_next = next.was_called(), "interceptor advanced");
                    }
                }
            }
        }
        Flow::Next
    }
}
