mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use turbine_crew::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
