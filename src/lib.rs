//! Binance USDT-M futures order placement: validation, signed REST client,
//! simulated OCO and the command-line workflow built on them.

pub mod cli;
pub mod config;
pub mod console;
pub mod credentials;
pub mod error;
pub mod exchange;
pub mod logging;
pub mod market;
pub mod orders;
pub mod report;
pub mod submitter;
