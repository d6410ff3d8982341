//! Workflow engine for DeciFrame.
//!
//! Everything that runs off the request path lives here: the bounded event
//! queue and its worker, the workflow processor and action handlers, the
//! notification dispatcher, the cron-style scheduler, and the report
//! pipeline.

pub mod actions;
pub mod dispatch;
pub mod pipeline;
pub mod processor;
pub mod queue;
pub mod scheduler;
pub mod triggers;

pub use actions::{build_registry, ActionServices};
pub use dispatch::{DispatchError, DispatchOutcome, Mailer, NotificationDispatcher};
pub use pipeline::ReportPipeline;
pub use processor::WorkflowProcessor;
pub use queue::{Event, EventQueue, EventWorker, QueueSnapshot, QueueStats};
pub use scheduler::Scheduler;
pub use triggers::{EventPublisher, Triggers};
