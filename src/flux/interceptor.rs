//! Interceptors and the chain they are composed into.

use std::sync::Arc;
use std::time::Instant;

use super::action::Action;
use crate::dispatcher::DispatchError;

/// Middleware wrapping the reducer fan-out.
///
/// An interceptor receives the action and the rest of the pipeline. It may
/// inspect or replace the action before calling [`Chain::proceed`], inspect
/// the result afterwards, or return without proceeding to short-circuit the
/// dispatch.
pub trait Interceptor<A>: Send + Sync {
    fn intercept(&self, action: A, chain: &Chain<A>) -> Result<A, DispatchError>;
}

impl<A, F> Interceptor<A> for F
where
    F: Fn(A, &Chain<A>) -> Result<A, DispatchError> + Send + Sync,
{
    fn intercept(&self, action: A, chain: &Chain<A>) -> Result<A, DispatchError> {
        self(action, chain)
    }
}

/// Final step of every chain: fan the action out to the reducers.
pub(crate) type TerminalStep<A> = Arc<dyn Fn(A) -> Result<A, DispatchError> + Send + Sync>;

/// The remaining pipeline from one interceptor onward.
///
/// Chains are immutable. The dispatcher rebuilds its chain whenever the
/// interceptor list changes; a dispatch already running keeps the chain it
/// started with.
pub struct Chain<A> {
    link: Link<A>,
}

enum Link<A> {
    Terminal(TerminalStep<A>),
    Intercept {
        interceptor: Arc<dyn Interceptor<A>>,
        next: Arc<Chain<A>>,
    },
}

impl<A> Chain<A> {
    /// Right-fold `interceptors` onto `terminal`: the first interceptor ends
    /// up outermost.
    pub(crate) fn build(
        interceptors: &[Arc<dyn Interceptor<A>>],
        terminal: TerminalStep<A>,
    ) -> Arc<Self> {
        let innermost = Arc::new(Chain {
            link: Link::Terminal(terminal),
        });
        interceptors.iter().rev().fold(innermost, |next, interceptor| {
            Arc::new(Chain {
                link: Link::Intercept {
                    interceptor: Arc::clone(interceptor),
                    next,
                },
            })
        })
    }

    /// Run the rest of the pipeline with `action`.
    pub fn proceed(&self, action: A) -> Result<A, DispatchError> {
        match &self.link {
            Link::Terminal(terminal) => terminal(action),
            Link::Intercept { interceptor, next } => interceptor.intercept(action, next),
        }
    }

    /// Number of interceptors between this link and the reducers.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut link = &self.link;
        while let Link::Intercept { next, .. } = link {
            depth += 1;
            link = &next.link;
        }
        depth
    }
}

/// Logs every action passing through the chain with its duration.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingInterceptor;

impl<A: Action> Interceptor<A> for LoggingInterceptor {
    fn intercept(&self, action: A, chain: &Chain<A>) -> Result<A, DispatchError> {
        let started = Instant::now();
        tracing::debug!(action = ?action, "Dispatching action");
        let result = chain.proceed(action);
        let elapsed_us = started.elapsed().as_micros() as u64;
        match &result {
            Ok(_) => tracing::debug!(elapsed_us, "Action dispatched"),
            Err(err) => tracing::warn!(elapsed_us, error = %err, "Action dispatch failed"),
        }
        result
    }
}
