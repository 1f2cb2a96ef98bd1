// fleur-flow/src/core/context.rs

//! The boxed handler type stored by pipelines for every step phase.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by a step handler.
pub type HandlerFuture<Err> = Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>>;

/// A pipeline step handler.
///
/// Each invocation receives its own clone of the shared `ContextData<TData>`
/// and resolves to `PipelineControl::Continue` or `PipelineControl::Stop`.
///
/// Handlers read what they need into locals, drop the guard, then await their
/// I/O, then take a write guard to record the result. A guard held across an
/// `.await` blocks every other handler touching the same context.
pub type Handler<TData, Err> = Box<dyn Fn(ContextData<TData>) -> HandlerFuture<Err> + Send + Sync>;
