use crate::play::{run_decode, run_play, DecodeArgs, PlayArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use persona_quiz::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Persona Quiz",
    about = "Serve, play, and inspect the bilingual personality quiz from the command line",
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
    /// Answer the quiz non-interactively and print the result card
    Play(PlayArgs),
    /// Decode a share link and show the result it points at
    Decode(DecodeArgs),
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
        Command::Play(args) => run_play(args),
        Command::Decode(args) => run_decode(args),
    }
}
