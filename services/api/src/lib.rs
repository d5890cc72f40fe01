mod cli;
mod infra;
mod routes;
mod server;

use btm_qualifier::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
