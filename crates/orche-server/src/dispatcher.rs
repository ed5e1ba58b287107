//! The per-route dispatcher.
//!
//! A [`RouteAdapter`] closes over one route unit. For each request it builds
//! the handler's arguments from the registered bindings, invokes the
//! handler on a fresh resource instance and settles the outcome:
//!
//! | Outcome                           | Effect                                  |
//! |-----------------------------------|-----------------------------------------|
//! | response already sent by handler  | done                                    |
//! | structured reply                  | its status, the unit's content type     |
//! | any other non-empty value         | `200`, the unit's content type          |
//! | empty (`()`, `None`, `null`)      | next layer                              |
//! | error or panic                    | `500` `{"message", "status"}` JSON      |

use std::sync::Arc;

use orche_core::registry::ParameterRegistry;
use orche_core::{BoxFuture, Callable, ContentType, DispatchError, Exchange, Flow, NextHandle, RouteUnit};
use orche_extract::build_args;

use crate::engine::Layer;

/// Dispatches requests to one route unit.
#[derive(Clone)]
pub struct RouteAdapter {
    class_name: Arc<str>,
    handler_name: Arc<str>,
    content_type: ContentType,
    handler: Callable,
    parameters: Arc<ParameterRegistry>,
}

impl std::fmt::Debug for RouteAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteAdapter")
            .field("class_name", &self.class_name)
            .field("handler_name", &self.handler_name)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

impl RouteAdapter {
    /// Creates the adapter for a unit of `class_name`.
    pub fn new(class_name: &str, unit: &RouteUnit, parameters: Arc<ParameterRegistry>) -> Self {
        Self {
            class_name: Arc::from(class_name),
            handler_name: Arc::from(unit.handler_name.as_str()),
            content_type: unit.content_type.clone(),
            handler: Arc::clone(&unit.handler),
            parameters,
        }
    }

    /// Runs the handler against `exchange`.
    pub async fn dispatch(&self, exchange: &Exchange) -> Flow {
        let next = NextHandle::new();
        let bindings = self.parameters.lookup(&self.class_name, &self.handler_name);

        let outcome = match build_args(bindings, exchange, &next) {
            Ok(args) => (self.handler)(args).await,
            Err(err) => Err(DispatchError::from(err)),
        };

        if let Err(err) = &outcome {
            tracing::error!(
                class = %self.class_name,
                handler = %self.handler_name,
                error = %err,
                "handler failed"
            );
        }

        let flow = exchange.settle(outcome, &self.content_type.response);
        tracing::trace!(
            class = %self.class_name,
            handler = %self.handler_name,
            responded = flow == Flow::Responded,
            called_next = next.was_called(),
            "handler settled"
        );
        flow
    }

    /// Turns the adapter into a mountable layer.
    pub fn into_layer(self) -> Layer {
        let adapter = Arc::new(self);
        Arc::new(move |exchange: Exchange| -> BoxFuture<'static, Flow> {
            let adapter = Arc::clone(&adapter);
            Box::pin(async move { adapter.dispatch(&exchange).await })
        })
    }
}
