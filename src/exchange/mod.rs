use async_trait::async_trait;

use crate::error::Result;
use crate::orders::{AccountSnapshot, OpenOrder, OrderRequest, PlacedOrder};

mod binance;
pub mod signing;
pub mod stub;

pub use binance::{classify_failure, BinanceFutures};
pub use stub::{ExchangeCall, StubExchange};

/// REST operations the order tools need from a futures venue.
#[async_trait]
pub trait FuturesExchange: Send + Sync {
    async fn place_order(&self, req: &OrderRequest) -> Result<PlacedOrder>;
    async fn cancel_order(&self, symbol: &str, order_id: u64) -> Result<()>;
    /// `None` lists open orders across every symbol.
    async fn open_orders(&self, symbol: Option<&str>) -> Result<Vec<OpenOrder>>;
    async fn account(&self) -> Result<AccountSnapshot>;
    async fn ticker_price(&self, symbol: &str) -> Result<f64>;
}
