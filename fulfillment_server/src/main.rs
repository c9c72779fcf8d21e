use std::process::ExitCode;

use dotenvy::dotenv;
use fulfillment_server::{cli::handle_command_line_args, config::ServerConfig, server::run_server};
use log::info;

#[actix_web::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init();
    if handle_command_line_args() {
        return ExitCode::SUCCESS;
    }
    let config = ServerConfig::from_env_or_default();
    info!("🚀️ Starting fulfillment server on {}:{}", config.host, config.port);
    match run_server(config).await {
        Ok(()) => {
            info!("🚀️ Fulfillment server shut down cleanly");
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        },
    }
}
