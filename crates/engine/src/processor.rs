//! Event-to-template processing.
//!
//! For each event pulled off the queue, finds the tenant's active workflow
//! templates whose triggers include the event, executes them in turn, and
//! writes each invocation report to the audit log. An aborted invocation
//! fails the event so the queue applies its bounded retry.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use deciframe_core::workflow::{
    execute_template, ActionRegistry, ExecutionContext, InvocationStatus,
};
use deciframe_db::repositories::{AuditRepository, WorkflowRepository};

use crate::queue::{Event, EventProcessor, ProcessError};

/// The production [`EventProcessor`].
#[derive(Clone)]
pub struct WorkflowProcessor {
    workflows: WorkflowRepository,
    audit: AuditRepository,
    registry: Arc<ActionRegistry>,
}

impl WorkflowProcessor {
    /// Creates a processor over the given registry.
    #[must_use]
    pub fn new(
        workflows: WorkflowRepository,
        audit: AuditRepository,
        registry: Arc<ActionRegistry>,
    ) -> Self {
        Self {
            workflows,
            audit,
            registry,
        }
    }
}

#[async_trait]
impl EventProcessor for WorkflowProcessor {
    async fn process(&self, event: &Event) -> Result<(), ProcessError> {
        let matches = self
            .workflows
            .find_active_matching(event.organization_id, &event.name)
            .await
            .map_err(ProcessError::new)?;

        if matches.is_empty() {
            return Ok(());
        }
        info!(
            event = %event.name,
            organization_id = event.organization_id,
            templates = matches.len(),
            "processing event"
        );

        let mut aborted = 0usize;
        for (template, definition) in matches {
            let ctx = ExecutionContext::new(
                &event.name,
                template.id,
                &template.name,
                event.organization_id,
                event.context.clone(),
            );
            let report = execute_template(&definition, &self.registry, ctx).await;
            if report.status == InvocationStatus::Aborted {
                aborted += 1;
            }

            let details = serde_json::to_value(&report).ok();
            if let Err(e) = self
                .audit
                .record(
                    event.organization_id,
                    None,
                    "workflow_executed",
                    Some(&format!("workflow_template:{}", template.id)),
                    details,
                )
                .await
            {
                error!(
                    template_id = template.id,
                    error = %e,
                    "failed to record workflow invocation"
                );
            }
        }

        if aborted > 0 {
            return Err(ProcessError(format!(
                "{aborted} template invocation(s) aborted for event '{}'",
                event.name
            )));
        }
        Ok(())
    }
}
