//! Read-only account reporting and plain-language order explanations.
//!
//! Reporter failures degrade to empty/absent results with a logged error
//! so they never abort an order workflow.

use serde_json::json;

use crate::exchange::FuturesExchange;
use crate::logging::{self, obj, v_num, v_str, Domain, Level};
use crate::orders::{format_decimal, AccountSnapshot, OcoRequest, OpenOrder, Side};

pub const OCO_WARNING: &str = "This is a simulated OCO using two separate orders! \
You must manually cancel the remaining order when one fills.";

pub fn describe_open_order(o: &OpenOrder) -> String {
    let mut line = format!(
        "Order ID: {} | {} {} {} {} @ {}",
        o.order_id,
        o.order_type,
        o.side,
        format_decimal(o.quantity),
        o.symbol,
        format_decimal(o.price)
    );
    if let Some(stop) = o.stop_price {
        line.push_str(&format!(" (Stop: {})", format_decimal(stop)));
    }
    line
}

/// Open orders for `symbol` (or every symbol), empty on failure.
pub async fn open_orders(exchange: &dyn FuturesExchange, symbol: Option<&str>) -> Vec<OpenOrder> {
    match exchange.open_orders(symbol).await {
        Ok(orders) => {
            logging::log(
                Level::Info,
                Domain::Account,
                "open_orders",
                obj(&[("symbol", v_str(symbol.unwrap_or("*"))), ("count", json!(orders.len()))]),
            );
            for o in &orders {
                logging::info(Domain::Account, "open_order", &describe_open_order(o));
            }
            orders
        }
        Err(e) => {
            logging::log(
                Level::Error,
                Domain::Account,
                "open_orders_failed",
                obj(&[("error_kind", v_str(e.kind())), ("msg", v_str(&e.to_string()))]),
            );
            Vec::new()
        }
    }
}

pub async fn account_snapshot(exchange: &dyn FuturesExchange) -> Option<AccountSnapshot> {
    match exchange.account().await {
        Ok(snap) => {
            logging::log(
                Level::Info,
                Domain::Account,
                "account",
                obj(&[
                    ("total_wallet_balance", v_num(snap.total_wallet_balance)),
                    ("available_balance", v_num(snap.available_balance)),
                ]),
            );
            Some(snap)
        }
        Err(e) => {
            logging::log(
                Level::Error,
                Domain::Account,
                "account_failed",
                obj(&[("error_kind", v_str(e.kind())), ("msg", v_str(&e.to_string()))]),
            );
            None
        }
    }
}

fn current_label(current: Option<f64>) -> String {
    current.map(format_decimal).unwrap_or_else(|| "unknown".to_string())
}

/// Lines explaining a stop-limit order, plus a warning when the trigger
/// is already crossed and the order may fire immediately.
pub fn stop_limit_explanation(
    side: Side,
    stop_price: f64,
    limit_price: f64,
    current: Option<f64>,
) -> (Vec<String>, Option<String>) {
    let (stop, limit) = (format_decimal(stop_price), format_decimal(limit_price));
    let mut lines = Vec::new();
    let warning = match side {
        Side::Sell => {
            lines.push("SELL Stop-Limit Order (Stop-Loss):".to_string());
            lines.push(format!("Current Price: {}", current_label(current)));
            lines.push(format!("Stop Price: {} (trigger)", stop));
            lines.push(format!("Limit Price: {} (execution)", limit));
            lines.push(format!("Logic: when price drops to {}, place a limit sell order at {}", stop, limit));
            current
                .filter(|c| stop_price > *c)
                .map(|_| "Stop price is above current market price - this may trigger immediately!".to_string())
        }
        Side::Buy => {
            lines.push("BUY Stop-Limit Order (Stop-Buy):".to_string());
            lines.push(format!("Current Price: {}", current_label(current)));
            lines.push(format!("Stop Price: {} (trigger)", stop));
            lines.push(format!("Limit Price: {} (execution)", limit));
            lines.push(format!("Logic: when price rises to {}, place a limit buy order at {}", stop, limit));
            current
                .filter(|c| stop_price < *c)
                .map(|_| "Stop price is below current market price - this may trigger immediately!".to_string())
        }
    };
    (lines, warning)
}

pub fn oco_explanation(req: &OcoRequest, current: Option<f64>) -> Vec<String> {
    let limit = format_decimal(req.limit_price);
    let stop = format_decimal(req.stop_price);
    let stop_limit = format_decimal(req.stop_limit_price);
    let mut lines = Vec::new();
    match req.side {
        Side::Sell => {
            lines.push("SELL OCO Order (Profit Taking + Stop Loss):".to_string());
            lines.push(format!("Current Price: {}", current_label(current)));
            lines.push(format!("Limit Order: {} (profit taking - sell if price goes UP)", limit));
            lines.push(format!("Stop Price: {} (trigger for stop loss)", stop));
            lines.push(format!("Stop Limit: {} (stop loss execution - sell if price goes DOWN)", stop_limit));
            lines.push(format!("Logic: either take profit at {} OR stop loss at {}", limit, stop_limit));
        }
        Side::Buy => {
            lines.push("BUY OCO Order (Buy Low + Stop Loss):".to_string());
            lines.push(format!("Current Price: {}", current_label(current)));
            lines.push(format!("Limit Order: {} (buy if price goes DOWN)", limit));
            lines.push(format!("Stop Price: {} (trigger for stop loss)", stop));
            lines.push(format!("Stop Limit: {} (stop loss execution - buy if price goes UP)", stop_limit));
            lines.push(format!("Logic: either buy low at {} OR stop loss at {}", limit, stop_limit));
        }
    }
    lines.push(OCO_WARNING.to_string());
    lines
}

pub fn log_explanation(event: &str, lines: &[String], warning: Option<&str>) {
    for line in lines {
        logging::info(Domain::Exec, event, line);
    }
    if let Some(w) = warning {
        logging::warn(Domain::Exec, event, w);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrderError;
    use crate::exchange::{FuturesExchange, StubExchange};
    use crate::orders::{OrderKind, OrderRequest};

    fn oco(side: Side) -> OcoRequest {
        OcoRequest {
            symbol: "BTCUSDT".into(),
            side,
            quantity: 0.01,
            limit_price: 30000.0,
            stop_price: 28500.0,
            stop_limit_price: 28000.0,
        }
    }

    #[test]
    fn test_describe_open_order() {
        let mut o = OpenOrder {
            order_id: 9,
            symbol: "BTCUSDT".into(),
            side: "SELL".into(),
            order_type: "LIMIT".into(),
            quantity: 0.01,
            price: 29000.0,
            stop_price: None,
        };
        assert_eq!(describe_open_order(&o), "Order ID: 9 | LIMIT SELL 0.01 BTCUSDT @ 29000");
        o.stop_price = Some(28500.0);
        assert!(describe_open_order(&o).ends_with("(Stop: 28500)"));
    }

    #[test]
    fn test_stop_limit_immediate_trigger_warning() {
        let (_, warning) = stop_limit_explanation(Side::Sell, 29000.0, 28900.0, Some(28000.0));
        assert!(warning.unwrap().contains("above current"));

        let (_, warning) = stop_limit_explanation(Side::Sell, 27000.0, 26900.0, Some(28000.0));
        assert!(warning.is_none());

        let (_, warning) = stop_limit_explanation(Side::Buy, 27000.0, 27100.0, Some(28000.0));
        assert!(warning.unwrap().contains("below current"));

        let (lines, warning) = stop_limit_explanation(Side::Buy, 27000.0, 27100.0, None);
        assert!(warning.is_none());
        assert_eq!(lines[1], "Current Price: unknown");
    }

    #[test]
    fn test_oco_explanation_ends_with_warning() {
        let lines = oco_explanation(&oco(Side::Sell), Some(29000.0));
        assert_eq!(lines.last().unwrap(), OCO_WARNING);
        assert!(lines[0].starts_with("SELL OCO"));
        assert!(oco_explanation(&oco(Side::Buy), None)[0].starts_with("BUY OCO"));
    }

    #[tokio::test]
    async fn test_open_orders_failure_degrades_to_empty() {
        let ex = StubExchange::accept_all().fail_reads(OrderError::Unknown("boom".into()));
        assert!(open_orders(&ex, Some("BTCUSDT")).await.is_empty());
        assert!(account_snapshot(&ex).await.is_none());
    }

    #[tokio::test]
    async fn test_open_orders_filters_symbol() {
        let ex = StubExchange::accept_all();
        for symbol in ["BTCUSDT", "ETHUSDT"] {
            let req = OrderRequest {
                symbol: symbol.into(),
                side: Side::Buy,
                quantity: 1.0,
                kind: OrderKind::Limit { price: 10.0 },
            };
            ex.place_order(&req).await.unwrap();
        }
        assert_eq!(open_orders(&ex, Some("ETHUSDT")).await.len(), 1);
        assert_eq!(open_orders(&ex, None).await.len(), 2);
        assert!(account_snapshot(&ex).await.is_some());
    }
}
