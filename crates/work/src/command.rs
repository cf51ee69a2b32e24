//! Per-item external commands.
//!
//! A [`CommandTemplate`] describes a program invocation with placeholders
//! that are filled from each task:
//!
//! - `{item}`: the item text (strings unquoted, other values as JSON)
//! - `{index}`: the task's input position
//! - `{<param>}`: any shared parameter of the run
//!
//! `{{` and `}}` produce literal braces. When no `{item}` placeholder is
//! filled anywhere in the program, arguments or environment, the item text
//! is appended as the last argument.

use super::r#trait::Work;
use async_trait::async_trait;
use fanout_core::{value_text, Task};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

/// Errors raised while rendering a template for a task.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// A placeholder named neither a built-in nor a parameter
    #[error("unknown placeholder '{{{0}}}'")]
    UnknownPlaceholder(String),

    /// A `{` without a matching `}`
    #[error("unclosed placeholder in '{0}'")]
    Unclosed(String),

    /// The template has no program
    #[error("command template has an empty program")]
    EmptyProgram,
}

/// A program invocation rendered for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCommand {
    /// Program to execute
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
    /// Extra environment variables
    pub env: HashMap<String, String>,
    /// Working directory
    pub current_dir: Option<PathBuf>,
}

impl RenderedCommand {
    /// Build a tokio command ready to spawn.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        for (k, v) in &self.env {
            cmd.env(k, v);
        }

        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        cmd
    }
}

/// Template for the command run against each task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTemplate {
    /// Program to execute
    pub program: String,

    /// Argument templates
    #[serde(default)]
    pub args: Vec<String>,

    /// Environment variables (templated too)
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Working directory
    #[serde(default)]
    pub current_dir: Option<PathBuf>,
}

impl CommandTemplate {
    /// Create a template for `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: HashMap::new(),
            current_dir: None,
        }
    }

    /// Add one argument template.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add several argument templates.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add an environment variable template.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the working directory.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Short label for logs: the program's file name.
    pub fn label(&self) -> &str {
        self.program
            .rsplit(['/', '\\'])
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.program)
    }

    /// Fill in the placeholders for `task`.
    pub fn render(&self, task: &Task) -> Result<RenderedCommand, TemplateError> {
        if self.program.trim().is_empty() {
            return Err(TemplateError::EmptyProgram);
        }

        let mut filler = Filler::new(task);
        let program = filler.fill(&self.program)?;
        let mut args = self
            .args
            .iter()
            .map(|a| filler.fill(a))
            .collect::<Result<Vec<_>, _>>()?;
        let env = self
            .env
            .iter()
            .map(|(k, v)| Ok((k.clone(), filler.fill(v)?)))
            .collect::<Result<HashMap<_, _>, TemplateError>>()?;

        if !filler.used_item {
            args.push(task.item_text());
        }

        Ok(RenderedCommand {
            program,
            args,
            env,
            current_dir: self.current_dir.clone(),
        })
    }
}

/// Fills placeholders from one task, remembering whether `{item}` was used.
struct Filler<'a> {
    task: &'a Task,
    used_item: bool,
}

impl<'a> Filler<'a> {
    fn new(task: &'a Task) -> Self {
        Self {
            task,
            used_item: false,
        }
    }

    /// Replace `{name}` placeholders in `template` with values from the task.
    fn fill(&mut self, template: &str) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(template.len());
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(TemplateError::Unclosed(template.to_string()));
                    }
                    out.push_str(&self.lookup(&name)?);
                }
                other => out.push(other),
            }
        }

        Ok(out)
    }

    fn lookup(&mut self, name: &str) -> Result<String, TemplateError> {
        match name {
            "item" => {
                self.used_item = true;
                Ok(self.task.item_text())
            }
            "index" => Ok(self.task.id.index().to_string()),
            _ => self
                .task
                .param(name)
                .map(value_text)
                .ok_or_else(|| TemplateError::UnknownPlaceholder(name.to_string())),
        }
    }
}

/// Work that runs a command per task and waits for it in the worker.
///
/// A non-zero exit status is reported as a failure with the command's
/// stderr.
#[derive(Debug, Clone)]
pub struct CommandWork {
    template: CommandTemplate,
}

impl CommandWork {
    /// Create work from a template.
    pub fn new(template: CommandTemplate) -> Self {
        Self { template }
    }

    /// The template in use.
    pub fn template(&self) -> &CommandTemplate {
        &self.template
    }
}

#[async_trait]
impl Work for CommandWork {
    fn name(&self) -> &str {
        self.template.label()
    }

    async fn execute(&self, task: &Task) -> Result<(), anyhow::Error> {
        let rendered = self.template.render(task)?;
        debug!(task = %task.id, program = %rendered.program, "Running command");

        let output = rendered.to_command().output().await?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "{} exited with {}: {}",
                rendered.program,
                output.status,
                stderr.trim()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fanout_core::ExtraParams;
    use serde_json::json;

    fn task(item: serde_json::Value) -> Task {
        let mut params = ExtraParams::new();
        params.insert("outdir".to_string(), json!("out/"));
        params.insert("sigma".to_string(), json!(1.5));
        Task::batch(vec![json!(0), item], params).remove(1)
    }

    #[test]
    fn test_render_placeholders() {
        let template = CommandTemplate::new("segment")
            .args(["--input", "{item}", "--output", "{outdir}{index}.tif", "--sigma={sigma}"])
            .env("SEGMENT_LABEL", "task-{index}");

        let rendered = template.render(&task(json!("img/a.tif"))).unwrap();

        assert_eq!(rendered.program, "segment");
        assert_eq!(
            rendered.args,
            vec!["--input", "img/a.tif", "--output", "out/1.tif", "--sigma=1.5"]
        );
        assert_eq!(rendered.env.get("SEGMENT_LABEL"), Some(&"task-1".to_string()));
    }

    #[test]
    fn test_item_appended_when_not_referenced() {
        let template = CommandTemplate::new("gzip").arg("-k");
        let rendered = template.render(&task(json!("data.csv"))).unwrap();
        assert_eq!(rendered.args, vec!["-k", "data.csv"]);
    }

    #[test]
    fn test_escaped_item_is_not_a_reference() {
        let template = CommandTemplate::new("echo").arg("literal {{item}}");
        let rendered = template.render(&task(json!("data.csv"))).unwrap();
        assert_eq!(rendered.args, vec!["literal {item}", "data.csv"]);
    }

    #[test]
    fn test_item_in_env_or_program_is_a_reference() {
        let from_env = CommandTemplate::new("segment").env("INPUT", "{item}");
        let rendered = from_env.render(&task(json!("a.tif"))).unwrap();
        assert!(rendered.args.is_empty());
        assert_eq!(rendered.env.get("INPUT"), Some(&"a.tif".to_string()));

        let from_program = CommandTemplate::new("./bin/{item}");
        let rendered = from_program.render(&task(json!("run"))).unwrap();
        assert_eq!(rendered.program, "./bin/run");
        assert!(rendered.args.is_empty());
    }

    #[test]
    fn test_literal_braces() {
        let template = CommandTemplate::new("echo").arg("{{{item}}}");
        let rendered = template.render(&task(json!(["a", "b"]))).unwrap();
        assert_eq!(rendered.args, vec![r#"{["a","b"]}"#]);
    }

    #[test]
    fn test_render_errors() {
        let t = task(json!("a"));

        let err = CommandTemplate::new("echo").arg("{missing}").render(&t).unwrap_err();
        assert_eq!(err, TemplateError::UnknownPlaceholder("missing".to_string()));
        assert_eq!(err.to_string(), "unknown placeholder '{missing}'");

        let err = CommandTemplate::new("echo").arg("{item").render(&t).unwrap_err();
        assert!(matches!(err, TemplateError::Unclosed(_)));

        let err = CommandTemplate::new("  ").render(&t).unwrap_err();
        assert_eq!(err, TemplateError::EmptyProgram);
    }

    #[test]
    fn test_label() {
        assert_eq!(CommandTemplate::new("/usr/bin/convert").label(), "convert");
        assert_eq!(CommandTemplate::new("convert").label(), "convert");
    }

    #[test]
    fn test_template_from_json() {
        let template: CommandTemplate =
            serde_json::from_str(r#"{"program": "sh", "args": ["-c", "true"]}"#).unwrap();
        assert_eq!(template, CommandTemplate::new("sh").args(["-c", "true"]));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_work_reports_exit_status() {
        let ok = CommandWork::new(CommandTemplate::new("sh").args(["-c", "exit 0", "{item}"]));
        assert_eq!(ok.name(), "sh");
        assert!(ok.execute(&task(json!("x"))).await.is_ok());

        let failing = CommandWork::new(
            CommandTemplate::new("sh").args(["-c", "echo boom >&2; exit 3", "{item}"]),
        );
        let err = failing.execute(&task(json!("x"))).await.unwrap_err().to_string();
        assert!(err.contains("boom"), "unexpected error: {err}");
    }
}
