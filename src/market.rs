//! Current-price lookup used for informational context only.

use crate::exchange::FuturesExchange;
use crate::logging::{self, obj, v_num, v_str, Domain, Level};

/// Last traded price, or `None` on any failure. Order placement never
/// depends on this value.
pub async fn current_price(exchange: &dyn FuturesExchange, symbol: &str) -> Option<f64> {
    match exchange.ticker_price(symbol).await {
        Ok(price) => {
            logging::log(
                Level::Info,
                Domain::Market,
                "current_price",
                obj(&[("symbol", v_str(symbol)), ("price", v_num(price))]),
            );
            Some(price)
        }
        Err(e) => {
            logging::log(
                Level::Error,
                Domain::Market,
                "current_price_failed",
                obj(&[("symbol", v_str(symbol)), ("error_kind", v_str(e.kind())), ("msg", v_str(&e.to_string()))]),
            );
            None
        }
    }
}

/// Absolute and percentage distance of `requested` from `current`.
pub fn price_diff(requested: f64, current: f64) -> (f64, f64) {
    let diff = requested - current;
    let pct = if current != 0.0 { diff / current * 100.0 } else { 0.0 };
    (diff, pct)
}

/// Log how far each labelled price sits from the current one.
pub fn log_price_context(current: Option<f64>, prices: &[(&str, f64)]) {
    let Some(current) = current else { return };
    for (label, requested) in prices {
        let (diff, pct) = price_diff(*requested, current);
        logging::log(
            Level::Info,
            Domain::Market,
            "price_vs_current",
            obj(&[
                ("msg", v_str(&format!("{} vs current: {:+.2} ({:+.2}%)", label, diff, pct))),
                ("requested", v_num(*requested)),
                ("current", v_num(current)),
            ]),
        );
    }
}
