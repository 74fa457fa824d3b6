//! In-memory exchange for exercising order workflows without a network.
//!
//! Accepts every request unless told otherwise, and journals each call so
//! tests can assert exactly what reached the venue. Clones share state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{OrderError, Result};
use crate::exchange::FuturesExchange;
use crate::orders::{AccountSnapshot, AssetBalance, OpenOrder, OrderKind, OrderRequest, PlacedOrder};

#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeCall {
    Place(OrderRequest),
    Cancel { symbol: String, order_id: u64 },
    OpenOrders(Option<String>),
    Account,
    Ticker(String),
}

#[derive(Debug)]
struct StubState {
    calls: Vec<ExchangeCall>,
    next_id: u64,
    placements: usize,
    open: Vec<OpenOrder>,
    price: Option<f64>,
    /// Keyed by 0-based placement index.
    place_failures: HashMap<usize, OrderError>,
    cancel_failure: Option<OrderError>,
    read_failure: Option<OrderError>,
}

#[derive(Debug, Clone)]
pub struct StubExchange {
    state: Arc<Mutex<StubState>>,
}

impl Default for StubExchange {
    fn default() -> Self {
        Self::accept_all()
    }
}

impl StubExchange {
    pub fn accept_all() -> Self {
        Self {
            state: Arc::new(Mutex::new(StubState {
                calls: Vec::new(),
                next_id: 1000,
                placements: 0,
                open: Vec::new(),
                price: None,
                place_failures: HashMap::new(),
                cancel_failure: None,
                read_failure: None,
            })),
        }
    }

    pub fn with_price(self, price: f64) -> Self {
        self.with_state(|s| s.price = Some(price));
        self
    }

    /// Fail the `index`-th placement (0-based) with `err`.
    pub fn fail_placement(self, index: usize, err: OrderError) -> Self {
        self.with_state(|s| {
            s.place_failures.insert(index, err);
        });
        self
    }

    pub fn fail_cancel(self, err: OrderError) -> Self {
        self.with_state(|s| s.cancel_failure = Some(err));
        self
    }

    /// Fail ticker, account and open-orders queries.
    pub fn fail_reads(self, err: OrderError) -> Self {
        self.with_state(|s| s.read_failure = Some(err));
        self
    }

    pub fn calls(&self) -> Vec<ExchangeCall> {
        self.with_state(|s| s.calls.clone())
    }

    pub fn placements(&self) -> Vec<OrderRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ExchangeCall::Place(req) => Some(req),
                _ => None,
            })
            .collect()
    }

    pub fn cancels(&self) -> Vec<u64> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ExchangeCall::Cancel { order_id, .. } => Some(order_id),
                _ => None,
            })
            .collect()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut StubState) -> T) -> T {
        let mut guard = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}

#[async_trait]
impl FuturesExchange for StubExchange {
    async fn place_order(&self, req: &OrderRequest) -> Result<PlacedOrder> {
        self.with_state(|s| {
            s.calls.push(ExchangeCall::Place(req.clone()));
            let index = s.placements;
            s.placements += 1;
            if let Some(err) = s.place_failures.remove(&index) {
                return Err(err);
            }

            let order_id = s.next_id;
            s.next_id += 1;
            let filled = matches!(req.kind, OrderKind::Market);
            let placed = PlacedOrder {
                order_id,
                client_order_id: Some(format!("stub-{}", order_id)),
                symbol: req.symbol.clone(),
                side: req.side,
                order_type: req.kind.wire_type().to_string(),
                quantity: req.quantity,
                executed_qty: if filled { req.quantity } else { 0.0 },
                price: req.kind.price().unwrap_or(0.0),
                stop_price: req.kind.stop_price(),
                status: if filled { "FILLED" } else { "NEW" }.to_string(),
                time_in_force: req.kind.time_in_force().map(|t| t.as_str()).unwrap_or("GTC").to_string(),
            };
            if !filled {
                s.open.push(OpenOrder {
                    order_id,
                    symbol: placed.symbol.clone(),
                    side: placed.side.as_str().to_string(),
                    order_type: placed.order_type.clone(),
                    quantity: placed.quantity,
                    price: placed.price,
                    stop_price: placed.stop_price,
                });
            }
            Ok(placed)
        })
    }

    async fn cancel_order(&self, symbol: &str, order_id: u64) -> Result<()> {
        self.with_state(|s| {
            s.calls.push(ExchangeCall::Cancel { symbol: symbol.to_string(), order_id });
            if let Some(err) = s.cancel_failure.clone() {
                return Err(err);
            }
            let before = s.open.len();
            s.open.retain(|o| o.order_id != order_id);
            if s.open.len() == before {
                return Err(OrderError::ExchangeRejected { code: -2011, msg: "Unknown order sent.".to_string() });
            }
            Ok(())
        })
    }

    async fn open_orders(&self, symbol: Option<&str>) -> Result<Vec<OpenOrder>> {
        self.with_state(|s| {
            s.calls.push(ExchangeCall::OpenOrders(symbol.map(str::to_string)));
            if let Some(err) = s.read_failure.clone() {
                return Err(err);
            }
            Ok(s.open
                .iter()
                .filter(|o| symbol.map_or(true, |sym| o.symbol.eq_ignore_ascii_case(sym)))
                .cloned()
                .collect())
        })
    }

    async fn account(&self) -> Result<AccountSnapshot> {
        self.with_state(|s| {
            s.calls.push(ExchangeCall::Account);
            if let Some(err) = s.read_failure.clone() {
                return Err(err);
            }
            Ok(AccountSnapshot {
                total_wallet_balance: 10_000.0,
                available_balance: 10_000.0,
                assets: vec![AssetBalance {
                    asset: "USDT".to_string(),
                    wallet_balance: 10_000.0,
                    available_balance: 10_000.0,
                }],
            })
        })
    }

    async fn ticker_price(&self, symbol: &str) -> Result<f64> {
        self.with_state(|s| {
            s.calls.push(ExchangeCall::Ticker(symbol.to_string()));
            if let Some(err) = s.read_failure.clone() {
                return Err(err);
            }
            s.price.ok_or_else(|| OrderError::ExchangeRejected { code: -1121, msg: "Invalid symbol.".to_string() })
        })
    }
}
