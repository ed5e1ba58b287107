//! Type-erased handler callables.
//!
//! Route handlers and interceptor units are user closures with typed
//! receivers and typed results. They are erased into a [`Callable`]: a
//! shared function from prepared [`Args`] to a boxed future of
//! [`Outcome`]. Panics inside the callable are caught and reported as
//! [`DispatchError::Panic`].

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::FutureExt;

use crate::response::{IntoReply, Reply};
use crate::{Args, DispatchError};

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The result of invoking a handler or interceptor unit.
pub type Outcome = Result<Reply, DispatchError>;

/// Result alias for user handlers.
pub type HandlerResult<T> = Result<T, anyhow::Error>;

/// A type-erased handler function.
pub type Callable = Arc<dyn Fn(Args) -> BoxFuture<'static, Outcome> + Send + Sync>;

/// A handler with its receiver still unbound.
pub(crate) type Bound<R> = Arc<dyn Fn(R, Args) -> BoxFuture<'static, Outcome> + Send + Sync>;

/// Erases a typed handler `f(receiver, args)` over its receiver type.
pub(crate) fn bind<R, F, Fut, T, E>(f: F) -> Bound<R>
where
    R: Send + 'static,
    F: Fn(R, Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: IntoReply,
    E: Into<anyhow::Error>,
{
    Arc::new(move |receiver: R, args: Args| -> BoxFuture<'static, Outcome> {
        let fut = f(receiver, args);
        Box::pin(async move {
            match fut.await {
                Ok(value) => value.into_reply(),
                Err(err) => Err(DispatchError::Handler(err.into())),
            }
        })
    })
}

/// Builds a callable that creates a fresh receiver for every invocation.
pub(crate) fn per_request<R>(factory: Arc<dyn Fn() -> R + Send + Sync>, call: Bound<R>) -> Callable
where
    R: Send + 'static,
{
    Arc::new(move |args: Args| {
        let factory = Arc::clone(&factory);
        let call = Arc::clone(&call);
        guarded(async move { call(factory(), args).await })
    })
}

/// Builds a callable that shares one receiver across invocations.
pub(crate) fn shared<I>(instance: Arc<I>, call: Bound<Arc<I>>) -> Callable
where
    I: Send + Sync + 'static,
{
    Arc::new(move |args: Args| {
        let instance = Arc::clone(&instance);
        let call = Arc::clone(&call);
        guarded(async move { call(instance, args).await })
    })
}

/// Wraps a plain async function as a callable with no receiver.
///
/// ```rust
/// use orche_core::{callable, Args, Reply};
///
/// let hello = callable(|_args: Args| async { Ok::<_, anyhow::Error>("hello") });
/// let outcome = tokio_test::block_on(hello(Args::default()));
/// assert_eq!(outcome.unwrap(), Reply::Value("hello".into()));
/// ```
pub fn callable<F, Fut, T, E>(f: F) -> Callable
where
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: IntoReply,
    E: Into<anyhow::Error>,
{
    let call = bind(move |(), args| f(args));
    Arc::new(move |args: Args| {
        let call = Arc::clone(&call);
        guarded(async move { call((), args).await })
    })
}

fn guarded<Fut>(fut: Fut) -> BoxFuture<'static, Outcome>
where
    Fut: Future<Output = Outcome> + Send + 'static,
{
    Box::pin(
        AssertUnwindSafe(fut)
            .catch_unwind()
            .map(|result| result.unwrap_or_else(|payload| Err(DispatchError::from_panic(payload)))),
    )
}
