use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Case-insensitive parse of `BUY` / `SELL`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "BUY" => Some(Side::Buy),
            "SELL" => Some(Side::Sell),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order kind together with the prices it needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderKind {
    Market,
    Limit { price: f64 },
    /// `price` executes once `stop_price` trades.
    StopLimit { price: f64, stop_price: f64 },
}

impl OrderKind {
    pub fn label(&self) -> &'static str {
        match self {
            OrderKind::Market => "MARKET",
            OrderKind::Limit { .. } => "LIMIT",
            OrderKind::StopLimit { .. } => "STOP_LIMIT",
        }
    }

    /// Order type as the futures API names it.
    pub fn wire_type(&self) -> &'static str {
        match self {
            OrderKind::Market => "MARKET",
            OrderKind::Limit { .. } => "LIMIT",
            OrderKind::StopLimit { .. } => "STOP",
        }
    }

    pub fn price(&self) -> Option<f64> {
        match self {
            OrderKind::Market => None,
            OrderKind::Limit { price } | OrderKind::StopLimit { price, .. } => Some(*price),
        }
    }

    pub fn stop_price(&self) -> Option<f64> {
        match self {
            OrderKind::StopLimit { stop_price, .. } => Some(*stop_price),
            _ => None,
        }
    }

    pub fn time_in_force(&self) -> Option<TimeInForce> {
        match self {
            OrderKind::Market => None,
            _ => Some(TimeInForce::Gtc),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeInForce {
    Gtc,
}

impl TimeInForce {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeInForce::Gtc => "GTC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    pub kind: OrderKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OcoRequest {
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    /// Profit-taking leg.
    pub limit_price: f64,
    /// Trigger of the protective leg.
    pub stop_price: f64,
    /// Execution price of the protective leg once triggered.
    pub stop_limit_price: f64,
}

impl OcoRequest {
    pub fn limit_leg(&self) -> OrderRequest {
        OrderRequest {
            symbol: self.symbol.clone(),
            side: self.side,
            quantity: self.quantity,
            kind: OrderKind::Limit { price: self.limit_price },
        }
    }

    pub fn stop_leg(&self) -> OrderRequest {
        OrderRequest {
            symbol: self.symbol.clone(),
            side: self.side,
            quantity: self.quantity,
            kind: OrderKind::StopLimit { price: self.stop_limit_price, stop_price: self.stop_price },
        }
    }
}

/// Order record as acknowledged by the exchange. Lives only for the run.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOrder {
    pub order_id: u64,
    pub client_order_id: Option<String>,
    pub symbol: String,
    pub side: Side,
    pub order_type: String,
    pub quantity: f64,
    pub executed_qty: f64,
    pub price: f64,
    pub stop_price: Option<f64>,
    pub status: String,
    pub time_in_force: String,
}

/// Two independent legs. Nothing links them on the exchange: when one
/// fills, the operator has to cancel the other.
#[derive(Debug, Clone, PartialEq)]
pub struct OcoPair {
    pub limit: PlacedOrder,
    pub stop: PlacedOrder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenOrder {
    pub order_id: u64,
    pub symbol: String,
    pub side: String,
    pub order_type: String,
    pub quantity: f64,
    pub price: f64,
    pub stop_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetBalance {
    pub asset: String,
    pub wallet_balance: f64,
    pub available_balance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountSnapshot {
    pub total_wallet_balance: f64,
    pub available_balance: f64,
    pub assets: Vec<AssetBalance>,
}

/// Decimal places a quantity or price keeps on the wire.
pub const MAX_DECIMALS: usize = 8;

/// Render a quantity or price without float noise or trailing zeros.
pub fn format_decimal(value: f64) -> String {
    let s = format!("{:.*}", MAX_DECIMALS, value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_parse_case_insensitive() {
        assert_eq!(Side::parse("buy"), Some(Side::Buy));
        assert_eq!(Side::parse("SeLl"), Some(Side::Sell));
        assert_eq!(Side::parse("hold"), None);
        assert_eq!(Side::parse(""), None);
    }

    #[test]
    fn test_kind_wire_mapping() {
        let stop = OrderKind::StopLimit { price: 28000.0, stop_price: 28500.0 };
        assert_eq!(stop.wire_type(), "STOP");
        assert_eq!(stop.label(), "STOP_LIMIT");
        assert_eq!(stop.price(), Some(28000.0));
        assert_eq!(stop.stop_price(), Some(28500.0));
        assert_eq!(OrderKind::Market.time_in_force(), None);
        assert_eq!(OrderKind::Limit { price: 1.0 }.time_in_force(), Some(TimeInForce::Gtc));
    }

    #[test]
    fn test_oco_legs() {
        let req = OcoRequest {
            symbol: "BTCUSDT".into(),
            side: Side::Sell,
            quantity: 0.01,
            limit_price: 30000.0,
            stop_price: 28500.0,
            stop_limit_price: 28000.0,
        };
        assert_eq!(req.limit_leg().kind, OrderKind::Limit { price: 30000.0 });
        assert_eq!(req.stop_leg().kind, OrderKind::StopLimit { price: 28000.0, stop_price: 28500.0 });
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(0.01), "0.01");
        assert_eq!(format_decimal(29000.0), "29000");
        assert_eq!(format_decimal(0.1 + 0.2), "0.3");
        assert_eq!(format_decimal(0.0), "0");
    }
}
