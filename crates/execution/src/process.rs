//! Process strategy - each task runs in its own OS process.
//!
//! Heavy or crash-prone work cannot corrupt the dispatcher's memory this way.
//! The exit status is the task's outcome.

use crate::completion::CompletionSender;
use crate::strategy::{ExecutionStrategy, LaunchError};
use fanout_core::{Task, TaskOutcome, WorkerHandle};
use fanout_work::CommandTemplate;
use std::process::Stdio;
use tracing::debug;

/// Spawns the rendered command template once per task.
#[derive(Debug, Clone)]
pub struct ProcessStrategy {
    template: CommandTemplate,
    inherit_output: bool,
}

impl ProcessStrategy {
    /// Create a strategy running `template`.
    pub fn new(template: CommandTemplate) -> Self {
        Self {
            template,
            inherit_output: true,
        }
    }

    /// Forward worker stdout/stderr to ours (default), or discard it.
    pub fn with_inherited_output(mut self, inherit: bool) -> Self {
        self.inherit_output = inherit;
        self
    }

    /// The template in use.
    pub fn template(&self) -> &CommandTemplate {
        &self.template
    }

    fn output(&self) -> Stdio {
        if self.inherit_output {
            Stdio::inherit()
        } else {
            Stdio::null()
        }
    }
}

impl ExecutionStrategy for ProcessStrategy {
    fn name(&self) -> &str {
        self.template.label()
    }

    fn launch(&self, task: Task, done: CompletionSender) -> Result<WorkerHandle, LaunchError> {
        let rendered = self.template.render(&task)?;

        let mut cmd = rendered.to_command();
        cmd.stdin(Stdio::null())
            .stdout(self.output())
            .stderr(self.output());

        let mut child = cmd.spawn().map_err(|source| LaunchError::Spawn {
            what: rendered.program.clone(),
            source,
        })?;
        let pid = child.id();
        debug!(task = %task.id, pid = ?pid, program = %rendered.program, "Spawned worker process");

        tokio::spawn(async move {
            let outcome = match child.wait().await {
                Ok(status) if status.success() => TaskOutcome::Succeeded,
                Ok(status) => TaskOutcome::failed(format!("process exited with {status}")),
                Err(e) => TaskOutcome::failed(format!("failed to wait for process: {e}")),
            };
            done.finish(outcome);
        });

        Ok(WorkerHandle::running(task.id, "process").with_pid(pid))
    }
}
