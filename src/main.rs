use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use futures_order_bot::cli::{self, Cli};
use futures_order_bot::config::Config;
use futures_order_bot::console::StdConsole;
use futures_order_bot::exchange::{BinanceFutures, FuturesExchange};
use futures_order_bot::logging;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            e.print().context("printing usage")?;
            return Ok(ExitCode::from(cli::usage_exit_code(&e) as u8));
        }
    };
    let cfg = Config::from_env();
    logging::init(&cfg.log_path).with_context(|| format!("opening log file {}", cfg.log_path.display()))?;

    let mut console = StdConsole;
    let code = cli::run(cli.command, &cfg, &mut console, |cfg, creds| {
        Ok(Box::new(BinanceFutures::new(cfg, creds)?) as Box<dyn FuturesExchange>)
    })
    .await;
    Ok(ExitCode::from(code as u8))
}
