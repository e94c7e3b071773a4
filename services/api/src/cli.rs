use crate::demo::{run_demo, run_profit, DemoArgs, ProfitArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use ryde_ledger::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Ryde Ledger",
    about = "Run the job financial and scheduling engine from the command line",
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
    /// Price a single job from the command line without storing it
    Profit(ProfitArgs),
    /// Run an end-to-end demo covering booking, no-show, and import flows
    Demo(DemoArgs),
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
        Command::Profit(args) => run_profit(args),
        Command::Demo(args) => run_demo(args),
    }
}
