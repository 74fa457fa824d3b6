//! Command-line surface and the per-command workflow.
//!
//! Each invocation validates its raw arguments, resolves credentials,
//! connects, then runs a fixed sequence of exchange calls. The returned
//! value is the process exit code.

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::console::Console;
use crate::credentials::{self, Credentials};
use crate::error::Result;
use crate::exchange::FuturesExchange;
use crate::logging::{self, obj, v_str, Domain, Level};
use crate::market::{current_price, log_price_context};
use crate::orders::{
    format_decimal, validate_limit, validate_market, validate_oco, validate_stop_limit, OcoPair, OcoRequest,
    OpenOrder, OrderKind, OrderRequest, PlacedOrder,
};
use crate::report::{self, describe_open_order, log_explanation, oco_explanation, stop_limit_explanation};
use crate::submitter::OrderSubmitter;

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser, Debug)]
#[command(
    name = "futures-order-bot",
    about = "Place market, limit, stop-limit and simulated OCO orders on Binance USDT-M futures"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Place a market order.
    Market {
        /// Instrument, e.g. BTCUSDT.
        symbol: String,
        /// BUY or SELL.
        side: String,
        #[arg(allow_hyphen_values = true)]
        quantity: String,
    },
    /// Place a good-till-cancelled limit order.
    Limit {
        symbol: String,
        side: String,
        #[arg(allow_hyphen_values = true)]
        quantity: String,
        #[arg(allow_hyphen_values = true)]
        price: String,
    },
    /// Place a stop-limit order: a limit order at LIMIT_PRICE once STOP_PRICE trades.
    StopLimit {
        symbol: String,
        side: String,
        #[arg(allow_hyphen_values = true)]
        quantity: String,
        #[arg(allow_hyphen_values = true)]
        stop_price: String,
        #[arg(allow_hyphen_values = true)]
        limit_price: String,
    },
    /// Simulate an OCO with two independent orders (manual management required).
    Oco {
        symbol: String,
        side: String,
        #[arg(allow_hyphen_values = true)]
        quantity: String,
        /// Profit-taking limit price.
        #[arg(allow_hyphen_values = true)]
        limit_price: String,
        /// Trigger of the stop-loss leg.
        #[arg(allow_hyphen_values = true)]
        stop_price: String,
        /// Execution price of the stop-loss leg.
        #[arg(allow_hyphen_values = true)]
        stop_limit_price: String,
        /// Skip the confirmation prompt.
        #[arg(long, short = 'y', default_value_t = false)]
        yes: bool,
    },
    /// List open orders, optionally for one symbol.
    OpenOrders { symbol: Option<String> },
}

/// `--help` and `--version` succeed; every other parse error is a failure.
pub fn usage_exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() {
        EXIT_FAILURE
    } else {
        EXIT_OK
    }
}

/// A command whose arguments passed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Validated {
    Order(OrderRequest),
    Oco { req: OcoRequest, confirmed: bool },
    OpenOrders(Option<String>),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Market { .. } => "market",
            Command::Limit { .. } => "limit",
            Command::StopLimit { .. } => "stop-limit",
            Command::Oco { .. } => "oco",
            Command::OpenOrders { .. } => "open-orders",
        }
    }

    pub fn validate(&self) -> Result<Validated> {
        match self {
            Command::Market { symbol, side, quantity } => validate_market(symbol, side, quantity).map(Validated::Order),
            Command::Limit { symbol, side, quantity, price } => {
                validate_limit(symbol, side, quantity, price).map(Validated::Order)
            }
            Command::StopLimit { symbol, side, quantity, stop_price, limit_price } => {
                validate_stop_limit(symbol, side, quantity, stop_price, limit_price).map(Validated::Order)
            }
            Command::Oco { symbol, side, quantity, limit_price, stop_price, stop_limit_price, yes } => {
                validate_oco(symbol, side, quantity, limit_price, stop_price, stop_limit_price)
                    .map(|req| Validated::Oco { req, confirmed: *yes })
            }
            Command::OpenOrders { symbol } => {
                Ok(Validated::OpenOrders(symbol.as_ref().map(|s| s.trim().to_uppercase())))
            }
        }
    }
}

/// What a successful command did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Placed(PlacedOrder),
    OcoPlaced(OcoPair),
    /// Operator declined the confirmation; nothing was placed.
    Declined,
    Listed(Vec<OpenOrder>),
}

/// Validate, resolve credentials, connect and execute one command.
/// `connect` builds the exchange client once credentials are known.
pub async fn run<F>(command: Command, cfg: &Config, console: &mut dyn Console, connect: F) -> i32
where
    F: FnOnce(&Config, Credentials) -> Result<Box<dyn FuturesExchange>>,
{
    logging::log(Level::Info, Domain::System, "start", obj(&[("command", v_str(command.name()))]));

    let validated = match command.validate() {
        Ok(v) => v,
        Err(e) => {
            logging::error(Domain::Validate, "invalid_input", "Input validation failed:");
            for msg in e.validation_messages() {
                logging::error(Domain::Validate, "invalid_input", &format!("  - {}", msg));
            }
            return EXIT_FAILURE;
        }
    };

    let exchange = match credentials::resolve(cfg, console).and_then(|creds| connect(cfg, creds)) {
        Ok(ex) => ex,
        Err(e) => {
            logging::log(
                Level::Error,
                Domain::Config,
                "setup_failed",
                obj(&[("error_kind", v_str(e.kind())), ("msg", v_str(&e.to_string()))]),
            );
            return EXIT_FAILURE;
        }
    };
    logging::log(
        Level::Info,
        Domain::Config,
        "connected",
        obj(&[("network", v_str(cfg.network_name())), ("base", v_str(&cfg.fapi_base))]),
    );

    match execute(validated, exchange.as_ref(), console).await {
        Ok(_) => EXIT_OK,
        Err(e) => {
            logging::log(
                Level::Error,
                Domain::System,
                "command_failed",
                obj(&[
                    ("command", v_str(command.name())),
                    ("error_kind", v_str(e.kind())),
                    ("msg", v_str(&e.to_string())),
                ]),
            );
            EXIT_FAILURE
        }
    }
}

/// Run an already validated command against `exchange`.
pub async fn execute(validated: Validated, exchange: &dyn FuturesExchange, console: &mut dyn Console) -> Result<Outcome> {
    match validated {
        Validated::Order(req) => execute_order(&req, exchange, console).await,
        Validated::Oco { req, confirmed } => execute_oco(&req, confirmed, exchange, console).await,
        Validated::OpenOrders(symbol) => {
            let orders = report::open_orders(exchange, symbol.as_deref()).await;
            if orders.is_empty() {
                console.print("No open orders found");
            }
            for o in &orders {
                console.print(&describe_open_order(o));
            }
            Ok(Outcome::Listed(orders))
        }
    }
}

async fn execute_order(req: &OrderRequest, exchange: &dyn FuturesExchange, console: &mut dyn Console) -> Result<Outcome> {
    report::account_snapshot(exchange).await;

    let market = matches!(req.kind, OrderKind::Market);
    if !market {
        let current = current_price(exchange, &req.symbol).await;
        match req.kind {
            OrderKind::StopLimit { price, stop_price } => {
                let (lines, warning) = stop_limit_explanation(req.side, stop_price, price, current);
                log_explanation("stop_limit_explanation", &lines, warning.as_deref());
                log_price_context(current, &[("Stop price", stop_price), ("Limit price", price)]);
            }
            OrderKind::Limit { price } => log_price_context(current, &[("Order price", price)]),
            OrderKind::Market => {}
        }
        report::open_orders(exchange, Some(&req.symbol)).await;
    }

    let order = OrderSubmitter::new(exchange).place(req).await?;
    logging::info(Domain::Exec, "order_complete", &format!("{} order placed successfully", req.kind.label()));

    console.print(&format!("Order ID: {}", order.order_id));
    console.print(&format!("Status: {}", order.status));
    if let Some(stop) = order.stop_price {
        console.print(&format!("Stop Price: {}", format_decimal(stop)));
    }
    if !market {
        console.print(&format!("Price: {}", format_decimal(order.price)));
        report::open_orders(exchange, Some(&req.symbol)).await;
    }
    Ok(Outcome::Placed(order))
}

async fn execute_oco(
    req: &OcoRequest,
    confirmed: bool,
    exchange: &dyn FuturesExchange,
    console: &mut dyn Console,
) -> Result<Outcome> {
    report::account_snapshot(exchange).await;
    let current = current_price(exchange, &req.symbol).await;
    log_explanation("oco_explanation", &oco_explanation(req, current), None);
    report::open_orders(exchange, Some(&req.symbol)).await;

    if !confirmed && !confirm_oco(console) {
        logging::info(Domain::System, "cancelled", "Operation cancelled by user");
        return Ok(Outcome::Declined);
    }

    log_price_context(
        current,
        &[("Limit price", req.limit_price), ("Stop price", req.stop_price), ("Stop limit price", req.stop_limit_price)],
    );
    let pair = OrderSubmitter::new(exchange).place_oco(req).await?;

    console.print(&format!("Limit Order ID: {} @ {}", pair.limit.order_id, format_decimal(pair.limit.price)));
    console.print(&format!(
        "Stop Order ID: {} @ {} (Stop: {})",
        pair.stop.order_id,
        format_decimal(pair.stop.price),
        pair.stop.stop_price.map(format_decimal).unwrap_or_default()
    ));
    console.print("WARNING: Remember to cancel the other order when one fills!");

    report::open_orders(exchange, Some(&req.symbol)).await;
    Ok(Outcome::OcoPlaced(pair))
}

/// Anything but `y` (including a closed stdin) declines.
fn confirm_oco(console: &mut dyn Console) -> bool {
    console.print("WARNING: This will place TWO separate orders to simulate OCO functionality.");
    console.print("You will need to manually manage them (cancel one when the other fills).");
    match console.prompt("Do you want to proceed? (y/N): ") {
        Ok(answer) => answer.eq_ignore_ascii_case("y"),
        Err(e) => {
            logging::log(Level::Warn, Domain::System, "prompt_failed", obj(&[("msg", v_str(&e.to_string()))]));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::Side;

    fn parse(args: &[&str]) -> Command {
        let mut argv = vec!["futures-order-bot"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().command
    }

    #[test]
    fn test_parse_subcommands() {
        assert_eq!(parse(&["market", "BTCUSDT", "BUY", "0.01"]).name(), "market");
        assert_eq!(parse(&["stop-limit", "BTCUSDT", "SELL", "0.01", "28500", "28000"]).name(), "stop-limit");
        assert_eq!(parse(&["open-orders"]), Command::OpenOrders { symbol: None });
        match parse(&["oco", "BTCUSDT", "SELL", "0.01", "30000", "28500", "28000", "--yes"]) {
            Command::Oco { yes, .. } => assert!(yes),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_negative_numbers_reach_validator() {
        let cmd = parse(&["limit", "BTCUSDT", "SELL", "-1", "abc"]);
        let err = cmd.validate().unwrap_err();
        assert_eq!(err.validation_messages().len(), 2);
    }

    #[test]
    fn test_wrong_arity_is_usage_error() {
        assert!(Cli::try_parse_from(["futures-order-bot", "market", "BTCUSDT", "BUY"]).is_err());
        assert!(Cli::try_parse_from(["futures-order-bot", "limit", "BTCUSDT", "BUY", "1", "2", "3"]).is_err());
    }

    #[test]
    fn test_usage_errors_exit_one_help_exits_zero() {
        let err = Cli::try_parse_from(["futures-order-bot", "market", "BTCUSDT", "BUY"]).unwrap_err();
        assert_eq!(usage_exit_code(&err), EXIT_FAILURE);

        let err = Cli::try_parse_from(["futures-order-bot", "bogus"]).unwrap_err();
        assert_eq!(usage_exit_code(&err), EXIT_FAILURE);

        let err = Cli::try_parse_from(["futures-order-bot", "--help"]).unwrap_err();
        assert_eq!(usage_exit_code(&err), EXIT_OK);
    }

    #[test]
    fn test_validate_stop_limit_argument_order() {
        let v = parse(&["stop-limit", "btcusdt", "sell", "0.01", "28500", "28000"]).validate().unwrap();
        match v {
            Validated::Order(req) => {
                assert_eq!(req.symbol, "BTCUSDT");
                assert_eq!(req.side, Side::Sell);
                assert_eq!(req.kind, OrderKind::StopLimit { price: 28000.0, stop_price: 28500.0 });
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
