//! Input validation for raw command-line order parameters.
//!
//! Every check runs before reporting, so the caller gets the full list of
//! problems in one pass. Price relationship rules only run once the
//! numbers involved parsed cleanly.

use crate::error::{OrderError, Result};
use crate::orders::types::{format_decimal, OcoRequest, OrderKind, OrderRequest, Side, MAX_DECIMALS};

pub const MIN_SYMBOL_LEN: usize = 6;

/// True when the value survives the wire rendering unchanged.
fn fits_wire_precision(v: f64) -> bool {
    format_decimal(v).parse::<f64>().map_or(false, |wire| wire == v)
}

#[derive(Default)]
struct Checks {
    errors: Vec<String>,
}

impl Checks {
    fn symbol(&mut self, raw: &str) -> String {
        let symbol = raw.trim().to_uppercase();
        if symbol.chars().count() < MIN_SYMBOL_LEN {
            self.errors.push("Symbol must be at least 6 characters (e.g., BTCUSDT)".to_string());
        }
        symbol
    }

    fn side(&mut self, raw: &str) -> Option<Side> {
        let side = Side::parse(raw);
        if side.is_none() {
            self.errors.push("Side must be either BUY or SELL".to_string());
        }
        side
    }

    fn positive(&mut self, label: &str, raw: &str) -> Option<f64> {
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v > 0.0 => {
                if !fits_wire_precision(v) {
                    self.errors
                        .push(format!("{} must have at most {} decimal places", label, MAX_DECIMALS));
                    return None;
                }
                Some(v)
            }
            Ok(v) if v.is_finite() => {
                self.errors.push(format!("{} must be greater than 0", label));
                None
            }
            _ => {
                self.errors.push(format!("{} must be a valid number", label));
                None
            }
        }
    }

    fn finish<T>(self, value: Option<T>) -> Result<T> {
        match value {
            Some(v) if self.errors.is_empty() => Ok(v),
            _ => Err(OrderError::Validation(self.errors)),
        }
    }
}

pub fn validate_market(symbol: &str, side: &str, quantity: &str) -> Result<OrderRequest> {
    let mut c = Checks::default();
    let symbol = c.symbol(symbol);
    let side = c.side(side);
    let quantity = c.positive("Quantity", quantity);

    let req = match (side, quantity) {
        (Some(side), Some(quantity)) => Some(OrderRequest { symbol, side, quantity, kind: OrderKind::Market }),
        _ => None,
    };
    c.finish(req)
}

pub fn validate_limit(symbol: &str, side: &str, quantity: &str, price: &str) -> Result<OrderRequest> {
    let mut c = Checks::default();
    let symbol = c.symbol(symbol);
    let side = c.side(side);
    let quantity = c.positive("Quantity", quantity);
    let price = c.positive("Price", price);

    let req = match (side, quantity, price) {
        (Some(side), Some(quantity), Some(price)) => {
            Some(OrderRequest { symbol, side, quantity, kind: OrderKind::Limit { price } })
        }
        _ => None,
    };
    c.finish(req)
}

/// `stop_price` is the trigger, `limit_price` the execution price.
pub fn validate_stop_limit(
    symbol: &str,
    side: &str,
    quantity: &str,
    stop_price: &str,
    limit_price: &str,
) -> Result<OrderRequest> {
    let mut c = Checks::default();
    let symbol = c.symbol(symbol);
    let side = c.side(side);
    let quantity = c.positive("Quantity", quantity);
    let stop_price = c.positive("Stop price", stop_price);
    let limit_price = c.positive("Limit price", limit_price);

    if let (Some(side), Some(stop), Some(limit)) = (side, stop_price, limit_price) {
        match side {
            Side::Sell if stop < limit => c
                .errors
                .push("For SELL orders: stop price should be >= limit price (stop-loss scenario)".to_string()),
            Side::Buy if stop < limit => c
                .errors
                .push("For BUY orders: stop price should be >= limit price (stop-buy scenario)".to_string()),
            _ => {}
        }
    }

    let req = match (side, quantity, stop_price, limit_price) {
        (Some(side), Some(quantity), Some(stop_price), Some(price)) => Some(OrderRequest {
            symbol,
            side,
            quantity,
            kind: OrderKind::StopLimit { price, stop_price },
        }),
        _ => None,
    };
    c.finish(req)
}

pub fn validate_oco(
    symbol: &str,
    side: &str,
    quantity: &str,
    limit_price: &str,
    stop_price: &str,
    stop_limit_price: &str,
) -> Result<OcoRequest> {
    let mut c = Checks::default();
    let symbol = c.symbol(symbol);
    let side = c.side(side);
    let quantity = c.positive("Quantity", quantity);
    let limit_price = c.positive("Limit price", limit_price);
    let stop_price = c.positive("Stop price", stop_price);
    let stop_limit_price = c.positive("Stop limit price", stop_limit_price);

    if let (Some(side), Some(limit), Some(stop), Some(stop_limit)) = (side, limit_price, stop_price, stop_limit_price) {
        match side {
            Side::Sell => {
                if limit <= stop {
                    c.errors.push(
                        "For SELL OCO: limit price should be > stop price (profit taking above current, stop loss below)"
                            .to_string(),
                    );
                }
                if stop_limit > stop {
                    c.errors.push("For SELL OCO: stop limit price should be <= stop price".to_string());
                }
            }
            Side::Buy => {
                if limit >= stop {
                    c.errors.push(
                        "For BUY OCO: limit price should be < stop price (buy below current, stop loss above)"
                            .to_string(),
                    );
                }
                if stop_limit < stop {
                    c.errors.push("For BUY OCO: stop limit price should be >= stop price".to_string());
                }
            }
        }
    }

    let req = match (side, quantity, limit_price, stop_price, stop_limit_price) {
        (Some(side), Some(quantity), Some(limit_price), Some(stop_price), Some(stop_limit_price)) => Some(OcoRequest {
            symbol,
            side,
            quantity,
            limit_price,
            stop_price,
            stop_limit_price,
        }),
        _ => None,
    };
    c.finish(req)
}
