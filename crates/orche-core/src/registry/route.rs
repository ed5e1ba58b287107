//! Route declarations per resource class.

use std::collections::HashMap;
use std::fmt;

use crate::content::ContentType;
use crate::cors::CorsConfig;
use crate::handler::Callable;
use crate::method::HttpMethod;
use crate::{OrcheError, OrcheResult};

/// One declared endpoint of a resource class.
#[derive(Clone)]
pub struct RouteUnit {
    /// Verb the unit is mounted for.
    pub http_method: HttpMethod,
    /// Path relative to the class prefix.
    pub path: String,
    /// Handler name, used to look up parameter bindings.
    pub handler_name: String,
    /// Request and response media types.
    pub content_type: ContentType,
    /// Optional CORS policy.
    pub cors: Option<CorsConfig>,
    /// The erased handler.
    pub handler: Callable,
}

impl fmt::Debug for RouteUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteUnit")
            .field("http_method", &self.http_method)
            .field("path", &self.path)
            .field("handler_name", &self.handler_name)
            .field("content_type", &self.content_type)
            .field("cors", &self.cors)
            .finish_non_exhaustive()
    }
}

/// All units declared by one resource class.
#[derive(Debug, Clone)]
pub struct RouteClassConfig {
    /// Path prefix shared by every unit.
    pub prefix: String,
    /// Stable class identifier.
    pub class_name: String,
    /// Units in declaration order.
    pub units: Vec<RouteUnit>,
}

/// Resource classes in registration order.
#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    configs: Vec<RouteClassConfig>,
    index: HashMap<String, usize>,
}

impl RouteRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a class with its prefix.
    ///
    /// The first declaration wins; later calls for the same class are
    /// ignored and return false.
    pub fn register_class(&mut self, prefix: &str, class_name: &str) -> bool {
        if self.index.contains_key(class_name) {
            tracing::debug!(class = class_name, prefix, "class already registered, keeping first prefix");
            return false;
        }
        self.index.insert(class_name.to_string(), self.configs.len());
        self.configs.push(RouteClassConfig {
            prefix: prefix.to_string(),
            class_name: class_name.to_string(),
            units: Vec::new(),
        });
        true
    }

    /// Appends a unit to a declared class.
    pub fn register_unit(&mut self, class_name: &str, unit: RouteUnit) -> OrcheResult<()> {
        let position = *self
            .index
            .get(class_name)
            .ok_or_else(|| OrcheError::unknown_class(class_name))?;
        self.configs[position].units.push(unit);
        Ok(())
    }

    /// Returns every class in registration order.
    pub fn all_configs(&self) -> &[RouteClassConfig] {
        &self.configs
    }

    /// Returns the number of classes.
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    /// Returns true if no class was registered.
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}
