#![allow(non_snake_case)]

use scheduleBot::cli;
use scheduleBot::config::AppConfig;
use scheduleBot::runtime;

const DEFAULT_RUN_MODE: &str = "cli";
const DEFAULT_API_PORT: u16 = 8000;

#[tokio::main]
async fn main() {
    let config = AppConfig::load();

    let openai_api_key = config
        .prop("OPENAI_API_KEY")
        .expect("OPENAI_API_KEY environment variable not set");
    let run_mode = config
        .prop("RUN_MODE")
        .unwrap_or(DEFAULT_RUN_MODE.to_string());

    if run_mode == "api" {
        let port = config
            .prop("API_PORT")
            .and_then(|raw| raw.parse::<u16>().ok())
            .unwrap_or(DEFAULT_API_PORT);
        let components = runtime::build_components(&config, openai_api_key);
        runtime::run_api(components, port).await;
    } else if run_mode == "cli" {
        let components = runtime::build_components(&config, openai_api_key);
        cli::cli(components).await;
    } else {
        println!("Invalid run mode {}", run_mode);
    }
}
