//! Notification domain: delivery preferences and message templating.

mod template;
mod types;

pub use template::{context_variables, render, render_or_default, RenderedMessage};
pub use types::{Channels, Frequency};
