mod cli;
mod infra;
mod play;
mod routes;
mod server;

use persona_quiz::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
