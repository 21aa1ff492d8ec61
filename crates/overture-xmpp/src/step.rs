//! The uniform step contract and pipeline composition.

use std::future::Future;

use futures::future::BoxFuture;
use tracing::debug;

use crate::error::NegotiationError;
use crate::features::FeatureSet;
use crate::properties::PropertyBag;
use crate::transport::XmppTransport;

/// State threaded through a negotiation pipeline: the connection, the
/// property bag, and the most recently parsed feature set.
///
/// Each step receives one state by value and returns a new one; nothing is
/// shared between in-flight pipelines.
#[derive(Debug)]
pub struct StepState<C> {
    pub connection: C,
    pub properties: PropertyBag,
    pub features: FeatureSet,
}

impl<C: XmppTransport> StepState<C> {
    /// Initial state, before the first features exchange.
    pub fn new(connection: C, properties: PropertyBag) -> Self {
        Self {
            connection,
            properties,
            features: FeatureSet::default(),
        }
    }
}

/// One negotiation step: a capability that maps a state to the next state,
/// performing zero or more exchanges on the connection along the way.
///
/// Blanket-implemented for every `Fn(StepState<C>) -> Future`, so plain
/// `async fn`s are steps.
pub trait NegotiationStep<C>: Send + Sync {
    fn run(&self, state: StepState<C>) -> BoxFuture<'static, Result<StepState<C>, NegotiationError>>;
}

impl<C, F, Fut> NegotiationStep<C> for F
where
    F: Fn(StepState<C>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<StepState<C>, NegotiationError>> + Send + 'static,
{
    fn run(&self, state: StepState<C>) -> BoxFuture<'static, Result<StepState<C>, NegotiationError>> {
        Box::pin(self(state))
    }
}

/// An ordered sequence of steps.
///
/// `run` folds the state through the steps in exactly the order supplied;
/// the first failing step aborts the remainder with no rollback, leaving
/// the connection and the partially updated bag to the caller.
pub struct Pipeline<C> {
    steps: Vec<(&'static str, Box<dyn NegotiationStep<C>>)>,
}

impl<C: XmppTransport + 'static> Pipeline<C> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a labelled step. The label only feeds diagnostics.
    pub fn push(&mut self, label: &'static str, step: impl NegotiationStep<C> + 'static) {
        self.steps.push((label, Box::new(step)));
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub async fn run(&self, mut state: StepState<C>) -> Result<StepState<C>, NegotiationError> {
        for (label, step) in &self.steps {
            debug!(step = *label, "running negotiation step");
            state = step.run(state).await?;
        }
        Ok(state)
    }

    /// The conventional full negotiation order. Assembly is configuration:
    /// callers compose their own pipelines for anything else, and no step
    /// hard-codes its successors.
    pub fn standard() -> Self {
        let mut pipeline = Self::new();
        pipeline.push("start_stream", crate::stream::start_stream::<C>);
        pipeline.push("stream_features", crate::stream::stream_features::<C>);
        pipeline.push("maybe_use_ssl", crate::tls::maybe_use_ssl::<C>);
        pipeline.push("authenticate", crate::auth::authenticate::<C>);
        pipeline.push(
            "maybe_use_compression",
            crate::compression::maybe_use_compression::<C>,
        );
        pipeline.push("bind", crate::session::bind::<C>);
        pipeline.push("session", crate::session::session::<C>);
        pipeline.push(
            "maybe_stream_resumption",
            crate::stream_management::maybe_stream_resumption::<C>,
        );
        pipeline.push(
            "maybe_stream_management",
            crate::stream_management::maybe_stream_management::<C>,
        );
        pipeline.push("maybe_use_carbons", crate::carbons::maybe_use_carbons::<C>);
        pipeline
    }
}

impl<C: XmppTransport + 'static> Default for Pipeline<C> {
    fn default() -> Self {
        Self::new()
    }
}
