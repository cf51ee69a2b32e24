//! fanout CLI - run a command once per item with bounded concurrency.

mod run_file;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fanout_execution::{
    log_summary, ExecutionStrategy, ProcessStrategy, StrategyKind, TaskDispatcher, TaskStrategy,
    ThreadStrategy,
};
use fanout_files::{combine_tables, list_files, Extensions};
use fanout_work::{CommandTemplate, CommandWork};
use run_file::{parse_param, Overrides, RunFile};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fanout")]
#[command(about = "Run a command once per item with bounded concurrency", long_about = None)]
struct Cli {
    /// Only log warnings and errors
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dispatch one worker per item
    Run {
        /// Folder whose files become the items
        #[arg(long, short)]
        input: Option<PathBuf>,
        /// Item given directly (repeatable)
        #[arg(long = "item")]
        items: Vec<String>,
        /// Comma-separated extensions picked from --input (default: images)
        #[arg(long)]
        ext: Option<String>,
        /// How workers run: process, thread or task
        #[arg(long, default_value = "process")]
        strategy: StrategyKind,
        /// Maximum number of workers alive at the same time
        #[arg(long, short = 'j', allow_negative_numbers = true)]
        max_concurrency: Option<i64>,
        /// Label used in progress output
        #[arg(long)]
        name: Option<String>,
        /// Extra parameter passed to every task, as key=value (repeatable)
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, Value)>,
        /// JSON run file with items, params, command and dispatch options
        #[arg(long)]
        config: Option<PathBuf>,
        /// Do not print progress lines
        #[arg(long)]
        no_progress: bool,
        /// Command to run per item; placeholders: {item}, {index}, {<param>}
        #[arg(last = true)]
        command: Vec<String>,
    },
    /// List the files a run would pick up
    List {
        /// Folder to list
        root: PathBuf,
        /// Comma-separated extensions (default: images, `*` for all)
        #[arg(long)]
        ext: Option<String>,
    },
    /// Merge the tab-separated tables of a folder into <folder>.csv
    Combine {
        /// Folder holding the tables
        dir: PathBuf,
        /// Log one line per merged table
        #[arg(long)]
        progress: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            input,
            items,
            ext,
            strategy,
            max_concurrency,
            name,
            params,
            config,
            no_progress,
            command,
        } => {
            let file = match &config {
                Some(path) => RunFile::load(path)
                    .await
                    .with_context(|| format!("failed to read run file {}", path.display()))?,
                None => RunFile::default(),
            };

            let mut all_items = file.items()?;
            if let Some(dir) = &input {
                let extensions = extensions(ext.as_deref());
                let files = list_files(dir, &extensions).await?;
                info!("Found {} files in {}", files.len(), dir.display());
                all_items.extend(files.iter().map(|rel| path_item(dir, rel)));
            }
            all_items.extend(items.into_iter().map(Value::String));

            let resolved = Overrides {
                max_concurrency,
                name,
                no_progress,
                params,
                command,
            }
            .apply(&file)?;

            let Some(template) = resolved.command else {
                bail!("no command given; pass one after `--` or in the run file");
            };

            let dispatcher = TaskDispatcher::new(build_strategy(strategy, template))
                .with_config(resolved.config);
            let summary = dispatcher.run(all_items, resolved.params).await?;

            log_summary(&summary);
            summary.into_result()?;
        }
        Commands::List { root, ext } => {
            let files = list_files(&root, &extensions(ext.as_deref())).await?;
            for file in &files {
                println!("{}", file.display());
            }
            info!("{} files", files.len());
        }
        Commands::Combine { dir, progress } => match combine_tables(&dir, progress).await? {
            Some(output) => println!("{}", output.display()),
            None => bail!("folder {} does not exist", dir.display()),
        },
    }

    Ok(())
}

fn extensions(raw: Option<&str>) -> Extensions {
    raw.and_then(|s| s.parse().ok()).unwrap_or_default()
}

fn path_item(dir: &Path, rel: &Path) -> Value {
    Value::String(dir.join(rel).to_string_lossy().into_owned())
}

fn build_strategy(kind: StrategyKind, template: CommandTemplate) -> Box<dyn ExecutionStrategy> {
    match kind {
        StrategyKind::Process => Box::new(ProcessStrategy::new(template)),
        StrategyKind::Thread => Box::new(ThreadStrategy::new(Arc::new(CommandWork::new(template)))),
        StrategyKind::Task => Box::new(TaskStrategy::new(Arc::new(CommandWork::new(template)))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from([
            "fanout", "run", "--input", "imgs", "--ext", "tif", "-j", "-1", "--strategy",
            "thread", "--param", "sigma=2", "--", "segment", "{item}",
        ])
        .unwrap();

        let Commands::Run {
            input,
            max_concurrency,
            strategy,
            params,
            command,
            ..
        } = cli.command
        else {
            panic!("expected run");
        };
        assert_eq!(input, Some(PathBuf::from("imgs")));
        assert_eq!(max_concurrency, Some(-1));
        assert_eq!(strategy, StrategyKind::Thread);
        assert_eq!(params, vec![("sigma".to_string(), serde_json::json!(2))]);
        assert_eq!(command, vec!["segment", "{item}"]);
    }

    #[test]
    fn test_strategy_labels() {
        let template = CommandTemplate::new("/usr/bin/segment");
        for kind in [StrategyKind::Process, StrategyKind::Thread, StrategyKind::Task] {
            assert_eq!(build_strategy(kind, template.clone()).name(), "segment");
        }
    }

    #[test]
    fn test_extension_flag() {
        assert_eq!(extensions(None), Extensions::images());
        assert_eq!(extensions(Some("csv")), Extensions::new(["csv"]));
        assert_eq!(
            path_item(Path::new("in"), Path::new("a/b.tif")),
            Value::String(PathBuf::from("in").join("a/b.tif").to_string_lossy().into_owned())
        );
    }
}
