mod cli;
mod infra;
mod report;
mod routes;
mod server;
mod settings;
mod watch;

use grade_highlighter::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
