//! Remote operation abstraction.
//!
//! The engine knows nothing about HTTP, authentication or serialization; an
//! HTTP client collaborator owns those. What the engine consumes is a
//! [`RemoteOperation`]: an async function of one argument value that resolves
//! to an [`Envelope`] or faults with an [`Error`].
//!
//! Positional arguments are expressed as one `A` value: a tuple, a struct such
//! as [`PageQuery`](crate::pagination::PageQuery), or `()`.
//!
//! # Implementing RemoteOperation
//!
//! ```ignore
//! struct ListProducts {
//!     http: ApiClient,
//! }
//!
//! impl RemoteOperation<ProductFilter, Vec<Product>> for ListProducts {
//!     async fn call(&self, filter: ProductFilter) -> Result<Envelope<Vec<Product>>> {
//!         self.http.get("/products").query(&filter).send_json().await
//!     }
//! }
//! ```
//!
//! Or wrap a closure with [`from_fn`].
//!
//! # Testing
//!
//! [`ScriptedOperation`] replays queued outcomes and records every call, so
//! tests can assert invocation counts, arguments and timing without a server.

use crate::envelope::Envelope;
use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// An asynchronous remote operation bound to an executor.
#[allow(async_fn_in_trait)]
pub trait RemoteOperation<A, T>: Send + Sync {
    /// Invoke the operation.
    ///
    /// # Returns
    /// - `Ok(envelope)` - the server answered; `envelope.success` says how
    /// - `Err(e)` - the call faulted (transport failure, error response)
    ///
    /// # Errors
    /// Returns `Err` for thrown faults; the executor retries and normalizes them.
    async fn call(&self, args: A) -> Result<Envelope<T>>;
}

impl<A, T, R> RemoteOperation<A, T> for Arc<R>
where
    R: RemoteOperation<A, T>,
{
    async fn call(&self, args: A) -> Result<Envelope<T>> {
        (**self).call(args).await
    }
}

/// Adapter turning a closure into a [`RemoteOperation`]. See [`from_fn`].
#[derive(Clone)]
pub struct FnOperation<F> {
    f: F,
}

/// Wrap `Fn(A) -> impl Future<Output = Result<Envelope<T>>>` as a remote operation.
///
/// ```
/// use request_kit::remote::{from_fn, RemoteOperation};
/// use request_kit::Envelope;
///
/// # async fn demo() {
/// let double = from_fn(|n: u32| async move { Ok::<_, request_kit::Error>(Envelope::ok(n * 2)) });
/// let envelope = double.call(21).await.unwrap();
/// assert_eq!(envelope.data, Some(42));
/// # }
/// ```
pub fn from_fn<F>(f: F) -> FnOperation<F> {
    FnOperation { f }
}

impl<A, T, F, Fut> RemoteOperation<A, T> for FnOperation<F>
where
    F: Fn(A) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Envelope<T>>>,
{
    async fn call(&self, args: A) -> Result<Envelope<T>> {
        (self.f)(args).await
    }
}

/// One scripted response.
#[derive(Clone, Debug)]
pub struct Step<T> {
    delay: Duration,
    outcome: std::result::Result<Envelope<T>, Error>,
}

impl<T> Step<T> {
    /// Answer with an envelope.
    pub fn respond(envelope: Envelope<T>) -> Self {
        Step {
            delay: Duration::ZERO,
            outcome: Ok(envelope),
        }
    }

    /// Fault with an error.
    pub fn fault(error: impl Into<Error>) -> Self {
        Step {
            delay: Duration::ZERO,
            outcome: Err(error.into()),
        }
    }

    /// Resolve only after `delay` (on the tokio clock).
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A recorded invocation.
#[derive(Clone, Debug)]
pub struct Call<A> {
    pub args: A,
    pub at: Instant,
}

/// Remote operation test double that replays a script.
///
/// Steps are consumed in order. Once the script is empty the fallback step is
/// repeated; without a fallback an exhausted script faults with
/// `Error::Other("script exhausted")`.
pub struct ScriptedOperation<A, T> {
    script: Mutex<VecDeque<Step<T>>>,
    fallback: Option<Step<T>>,
    calls: Mutex<Vec<Call<A>>>,
}

impl<A, T> ScriptedOperation<A, T> {
    pub fn new() -> Self {
        ScriptedOperation {
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a step.
    pub fn then(self, step: Step<T>) -> Self {
        lock(&self.script).push_back(step);
        self
    }

    /// Queue a successful response.
    pub fn then_ok(self, data: T) -> Self {
        self.then(Step::respond(Envelope::ok(data)))
    }

    /// Queue an application failure (`success: false`).
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.then(Step::respond(Envelope::fail(message)))
    }

    /// Step repeated once the script runs out.
    pub fn otherwise(mut self, step: Step<T>) -> Self {
        self.fallback = Some(step);
        self
    }

    /// Queue a step on a shared instance.
    pub fn push(&self, step: Step<T>) {
        lock(&self.script).push_back(step);
    }

    /// Number of invocations so far.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Recorded invocations, oldest first.
    pub fn calls(&self) -> Vec<Call<A>>
    where
        A: Clone,
    {
        lock(&self.calls).clone()
    }
}

impl<A, T> Default for ScriptedOperation<A, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, T> RemoteOperation<A, T> for ScriptedOperation<A, T>
where
    A: Send,
    T: Clone + Send + Sync,
{
    async fn call(&self, args: A) -> Result<Envelope<T>> {
        lock(&self.calls).push(Call {
            args,
            at: Instant::now(),
        });

        let step = lock(&self.script)
            .pop_front()
            .or_else(|| self.fallback.clone());
        let Some(step) = step else {
            return Err(Error::Other("script exhausted".to_string()));
        };

        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }
        step.outcome
    }
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
