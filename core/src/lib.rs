// fleur-flow/src/lib.rs

//! fleur-flow: asynchronous, type-safe step pipelines.
//!
//! A pipeline is an ordered list of named steps run against one shared,
//! lockable context. It is used by the storefront to sequence calls against
//! several remote systems where each later call depends on an earlier result.
//!
//!  - Named steps with `before` / `on` / `after` handlers.
//!  - Asynchronous handlers for I/O-bound work.
//!  - `skip_if` conditions evaluated against the context before a step runs.
//!  - Early stop (`PipelineControl::Stop`), reported with the stopping step.
//!  - A type-keyed registry (`FlowRegistry`) that dispatches a context to the
//!    pipeline registered for its data type.

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context::{Handler, HandlerFuture};
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{FlowError, FlowResult};

pub use crate::registry::FlowRegistry;

/*
    Typical use:
    1. Define a data struct `CheckoutData` holding inputs, collaborators and
       the intermediate results each step writes.
    2. Build a `Pipeline<CheckoutData, AppError>` from `(name, optional, skip_if)` tuples.
    3. Attach handlers with `.on_root("step", |ctx| Box::pin(async move { ... }))`.
    4. Register the pipeline with a `FlowRegistry<AppError>`.
    5. Wrap a fresh `CheckoutData` in `ContextData::new(..)`, call
       `registry.run(ctx.clone()).await`, then read the results back from `ctx`.
*/
