//! Per-request dispatch.
//!
//! A request moves through parse, transport resolution, input loading,
//! handler invocation and output delivery. Each step can end the request
//! with a [`DispatchError`]; `DONE` is only reported once output delivery
//! has succeeded.

use std::any::Any;
use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, info};

use shuttle_plugins::{TaskInput, TaskOutcome, TaskRegistry, task_key};
use shuttle_transport::{
    BulkTransport, Delivery, PlatformAttacher, SegmentAttacher, TransportDirective, TransportPlan,
};

use super::command::ExecuteRequest;
use super::errors::DispatchError;

/// Tracing target for dispatch events.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Routes `EXECUTE` requests to task handlers and moves their payloads.
pub struct Dispatcher<A = PlatformAttacher> {
    registry: TaskRegistry,
    transport: BulkTransport<A>,
    file_output_tasks: BTreeSet<String>,
}

impl<A: SegmentAttacher> Dispatcher<A> {
    /// Creates a dispatcher. `file_output_tasks` lists task types whose
    /// output always goes to a file, in addition to handlers that ask for it.
    pub fn new<I, S>(
        registry: TaskRegistry,
        transport: BulkTransport<A>,
        file_output_tasks: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            registry,
            transport,
            file_output_tasks: file_output_tasks
                .into_iter()
                .map(|task| task_key(task.as_ref()))
                .collect(),
        }
    }

    /// Registered handlers.
    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Runs one request and returns the text to send after `DONE`.
    ///
    /// # Errors
    ///
    /// Returns the first failure among handler lookup, transport resolution,
    /// input loading, handler invocation and output delivery.
    pub fn dispatch(&self, request: &ExecuteRequest) -> Result<String, DispatchError> {
        let handler = self
            .registry
            .get(&request.task_type)
            .ok_or_else(|| DispatchError::unknown_task_type(&request.task_type))?;

        let plan = TransportPlan::parse(request.metadata.as_slice())?;
        let force_file =
            handler.prefers_file_output() || self.file_output_tasks.contains(&request.task_type);
        let target = plan.output_target(force_file);

        let payload = if handler.reads_input() {
            self.transport
                .load_input(&request.request_id, plan.directive())?
        } else {
            Vec::new()
        };
        debug!(
            target: DISPATCH_TARGET,
            task_type = %request.task_type,
            request_id = %request.request_id,
            shared_memory = matches!(plan.directive(), TransportDirective::SharedSegment { .. }),
            input_bytes = payload.len(),
            "dispatching request"
        );

        let input = TaskInput::new(&request.request_id, &payload, plan.metadata());
        let outcome = invoke_guarded(&request.task_type, || handler.invoke(&input))?;

        let delivery = self.transport.deliver_output(
            &request.request_id,
            &target,
            outcome.output.as_deref(),
        )?;

        info!(
            target: DISPATCH_TARGET,
            task_type = %request.task_type,
            request_id = %request.request_id,
            summary = %outcome.summary,
            delivery = ?delivery,
            "request completed"
        );

        Ok(match delivery {
            Delivery::Segment { bytes, .. } => bytes.to_string(),
            Delivery::Skipped | Delivery::File { .. } => outcome.summary,
        })
    }
}

fn invoke_guarded<F>(task_type: &str, invoke: F) -> Result<TaskOutcome, DispatchError>
where
    F: FnOnce() -> Result<TaskOutcome, shuttle_plugins::TaskError>,
{
    match panic::catch_unwind(AssertUnwindSafe(invoke)) {
        Ok(result) => result.map_err(DispatchError::from),
        Err(payload) => Err(DispatchError::HandlerPanicked {
            task_type: task_type.to_owned(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| String::from("non-string panic payload"))
}
