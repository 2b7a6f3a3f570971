//! The retried unit of work
//!
//! An operation is either a callable that produces a fresh future per attempt
//! or a future that is already running. The latter can only ever be awaited
//! once, so a retry sequence over it has exactly one attempt.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;

type AttemptFn<'a, T, E> = Box<dyn FnMut() -> BoxFuture<'a, Result<T, E>> + Send + 'a>;

/// Something the engine can attempt
pub enum Operation<'a, T, E> {
    /// A zero-argument callable, invoked once per attempt
    Deferred(AttemptFn<'a, T, E>),

    /// An already-started computation; attempted once
    InFlight(BoxFuture<'a, Result<T, E>>),

    /// A callable bridged from a host that reports its own arity
    ///
    /// Only arity zero can be retried. Any other arity is rejected before the
    /// first attempt.
    Declared {
        /// Number of arguments the callable expects
        arity: usize,
        /// The callable, invoked with no arguments
        call: AttemptFn<'a, T, E>,
    },
}

impl<'a, T, E> Operation<'a, T, E> {
    /// Wrap a callable that starts a new attempt each time it is invoked
    pub fn deferred<F, Fut>(mut f: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'a,
        Fut: Future<Output = Result<T, E>> + Send + 'a,
    {
        Operation::Deferred(Box::new(move || f().boxed()))
    }

    /// Wrap a computation that has already been started
    pub fn in_flight<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = Result<T, E>> + Send + 'a,
    {
        Operation::InFlight(future.boxed())
    }

    /// Wrap a callable together with the arity its host reports for it
    pub fn declared<F, Fut>(arity: usize, mut f: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'a,
        Fut: Future<Output = Result<T, E>> + Send + 'a,
    {
        Operation::Declared {
            arity,
            call: Box::new(move || f().boxed()),
        }
    }

    /// Whether a failed attempt can be followed by another one
    pub fn is_restartable(&self) -> bool {
        !matches!(self, Operation::InFlight(_))
    }

    /// Check the shape and turn the operation into its attempt source
    ///
    /// Fails with a description of the problem when the shape cannot be
    /// attempted.
    pub(crate) fn into_attempts(self) -> Result<Attempts<'a, T, E>, String> {
        match self {
            Operation::Declared { arity, .. } if arity != 0 => Err(format!(
                "operation must be an in-flight future or a zero-argument callable, \
                 got a callable expecting {} argument{}",
                arity,
                if arity == 1 { "" } else { "s" }
            )),
            Operation::Deferred(call) | Operation::Declared { call, .. } => {
                Ok(Attempts::Repeatable(call))
            }
            Operation::InFlight(future) => Ok(Attempts::Once(Some(future))),
        }
    }
}

/// Source of per-attempt futures for a running sequence
pub(crate) enum Attempts<'a, T, E> {
    Repeatable(AttemptFn<'a, T, E>),
    Once(Option<BoxFuture<'a, Result<T, E>>>),
}

impl<'a, T, E> Attempts<'a, T, E> {
    /// The future for the next attempt, if one can still be made
    pub(crate) fn next(&mut self) -> Option<BoxFuture<'a, Result<T, E>>> {
        match self {
            Attempts::Repeatable(call) => Some(call()),
            Attempts::Once(future) => future.take(),
        }
    }

    /// Whether [`Attempts::next`] would produce another attempt
    pub(crate) fn has_more(&self) -> bool {
        match self {
            Attempts::Repeatable(_) => true,
            Attempts::Once(future) => future.is_some(),
        }
    }
}

impl<T, E> fmt::Debug for Operation<'_, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Deferred(_) => f.write_str("Operation::Deferred"),
            Operation::InFlight(_) => f.write_str("Operation::InFlight"),
            Operation::Declared { arity, .. } => f
                .debug_struct("Operation::Declared")
                .field("arity", arity)
                .finish(),
        }
    }
}
