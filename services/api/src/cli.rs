use crate::commands::{run_generate, run_preview, GenerateArgs, PreviewArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use dram_planner::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Dram Planner",
    about = "Plan weekly whiskey tastings from a bottle collection",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Build tasting schedules from a collection file
    Schedule {
        #[command(subcommand)]
        command: ScheduleCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ScheduleCommand {
    /// Generate a schedule and export it as JSON or CSV
    Generate(GenerateArgs),
    /// Print a summary and the first tastings without saving anything
    Preview(PreviewArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Schedule {
            command: ScheduleCommand::Generate(args),
        } => run_generate(args),
        Command::Schedule {
            command: ScheduleCommand::Preview(args),
        } => run_preview(args),
    }
}
