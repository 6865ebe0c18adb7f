use clap::{Parser, Subcommand};
use pipewatch_cli::{commands, resolve_pipeline};
use pipewatch_config::{default_pipeline, DEFAULT_POLL_INTERVAL_MS, DEFAULT_SERVER_URL};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Orchestrator base url
    #[arg(long, global = true, env = "PIPEWATCH_SERVER", default_value = DEFAULT_SERVER_URL)]
    server: String,
    /// Snapshot poll interval in milliseconds
    #[arg(long, global = true, default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    poll_ms: u64,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a prompt to the orchestrator
    Submit {
        prompt: String,
        #[arg(short, long, value_delimiter = ',', help = "Worker order (default: Planner,Researcher,Writer,Reviewer)")]
        pipeline: Option<Vec<String>>,
        #[arg(long, help = "Leave the Reviewer stage out of the default pipeline")]
        skip_review: bool,
        #[arg(short, long, help = "Follow the task until it finishes")]
        watch: bool,
    },
    /// Follow a running task
    Watch {
        task_id: String,
        #[arg(short, long, value_delimiter = ',')]
        pipeline: Option<Vec<String>>,
    },
    /// Print one task's current snapshot
    Status { task_id: String },
    /// List all tasks
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Submit {
            prompt,
            pipeline,
            skip_review,
            watch,
        } => {
            let pipeline = resolve_pipeline(pipeline, skip_review);
            if pipeline.is_empty() {
                anyhow::bail!("Pipeline must name at least one worker");
            }
            let task_id = commands::cmd_submit(&cli.server, &prompt, pipeline.clone()).await?;
            if watch {
                let view = commands::cmd_watch(&cli.server, &task_id, pipeline, cli.poll_ms).await?;
                commands::report_outcome(&view)?;
            }
        }
        Commands::Watch { task_id, pipeline } => {
            let pipeline = pipeline
                .map(|p| resolve_pipeline(Some(p), false))
                .unwrap_or_else(default_pipeline);
            let view = commands::cmd_watch(&cli.server, &task_id, pipeline, cli.poll_ms).await?;
            commands::report_outcome(&view)?;
        }
        Commands::Status { task_id } => {
            commands::cmd_status(&cli.server, &task_id).await?;
        }
        Commands::List => {
            commands::cmd_list(&cli.server).await?;
        }
    }

    Ok(())
}
