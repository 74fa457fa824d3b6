//! Turns validated requests into exchange order placements.
//!
//! A simulated OCO is two independent orders: the limit leg first, then
//! the stop-limit leg. If the second leg fails, the first is cancelled
//! once on a best-effort basis and the placement error is returned.
//! Nothing watches for fills afterwards.

use serde_json::json;

use crate::error::Result;
use crate::exchange::FuturesExchange;
use crate::logging::{self, obj, v_str, Domain, Level};
use crate::orders::{format_decimal, OcoPair, OcoRequest, OrderRequest, PlacedOrder};
use crate::report::OCO_WARNING;

pub struct OrderSubmitter<'a> {
    exchange: &'a dyn FuturesExchange,
}

impl<'a> OrderSubmitter<'a> {
    pub fn new(exchange: &'a dyn FuturesExchange) -> Self {
        Self { exchange }
    }

    pub async fn place(&self, req: &OrderRequest) -> Result<PlacedOrder> {
        self.place_stage(req, req.kind.label()).await
    }

    async fn place_stage(&self, req: &OrderRequest, stage: &str) -> Result<PlacedOrder> {
        logging::log_order_submit(
            req.kind.label(),
            &req.symbol,
            req.side.as_str(),
            req.quantity,
            req.kind.price(),
            req.kind.stop_price(),
        );
        match self.exchange.place_order(req).await {
            Ok(order) => {
                logging::log_order_placed(
                    order.order_id,
                    &order.symbol,
                    order.side.as_str(),
                    &order.order_type,
                    &order.status,
                );
                Ok(order)
            }
            Err(e) => {
                logging::log_order_failed(stage, e.kind(), &e.to_string());
                Err(e)
            }
        }
    }

    pub async fn place_oco(&self, req: &OcoRequest) -> Result<OcoPair> {
        logging::warn(
            Domain::Exec,
            "oco_simulated",
            "The exchange has no native OCO; placing two separate orders that need manual management",
        );

        let limit = self.place_stage(&req.limit_leg(), "oco_limit_leg").await?;
        let stop = match self.place_stage(&req.stop_leg(), "oco_stop_leg").await {
            Ok(order) => order,
            Err(e) => {
                self.rollback(&limit).await;
                return Err(e);
            }
        };

        logging::log(
            Level::Info,
            Domain::Exec,
            "oco_placed",
            obj(&[
                ("symbol", v_str(&req.symbol)),
                ("limit_order_id", json!(limit.order_id)),
                ("limit_price", v_str(&format_decimal(limit.price))),
                ("stop_order_id", json!(stop.order_id)),
                ("stop_price", v_str(&stop.stop_price.map(format_decimal).unwrap_or_default())),
            ]),
        );
        logging::warn(Domain::Exec, "oco_manual_cancel", OCO_WARNING);

        Ok(OcoPair { limit, stop })
    }

    /// Single cancellation attempt; the outcome is logged and never retried.
    async fn rollback(&self, leg: &PlacedOrder) {
        logging::log(
            Level::Warn,
            Domain::Exec,
            "oco_rollback",
            obj(&[("msg", v_str("cancelling partially placed OCO leg")), ("order_id", json!(leg.order_id))]),
        );
        match self.exchange.cancel_order(&leg.symbol, leg.order_id).await {
            Ok(()) => logging::log(Level::Info, Domain::Exec, "order_cancelled", obj(&[("order_id", json!(leg.order_id))])),
            Err(e) => logging::log(
                Level::Error,
                Domain::Exec,
                "order_cancel_failed",
                obj(&[
                    ("order_id", json!(leg.order_id)),
                    ("error_kind", v_str(e.kind())),
                    ("msg", v_str(&e.to_string())),
                ]),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrderError;
    use crate::exchange::{ExchangeCall, StubExchange};
    use crate::orders::{OrderKind, Side};

    fn sell_oco() -> OcoRequest {
        OcoRequest {
            symbol: "BTCUSDT".into(),
            side: Side::Sell,
            quantity: 0.01,
            limit_price: 30000.0,
            stop_price: 28500.0,
            stop_limit_price: 28000.0,
        }
    }

    #[tokio::test]
    async fn test_market_order_single_call() {
        let ex = StubExchange::accept_all();
        let req = OrderRequest { symbol: "BTCUSDT".into(), side: Side::Buy, quantity: 0.01, kind: OrderKind::Market };
        let placed = OrderSubmitter::new(&ex).place(&req).await.unwrap();
        assert_eq!(placed.status, "FILLED");
        assert_eq!(ex.calls(), vec![ExchangeCall::Place(req)]);
    }

    #[tokio::test]
    async fn test_oco_places_limit_then_stop() {
        let ex = StubExchange::accept_all();
        let pair = OrderSubmitter::new(&ex).place_oco(&sell_oco()).await.unwrap();

        let placed = ex.placements();
        assert_eq!(placed.len(), 2);
        assert_eq!(placed[0].kind, OrderKind::Limit { price: 30000.0 });
        assert_eq!(placed[1].kind, OrderKind::StopLimit { price: 28000.0, stop_price: 28500.0 });
        assert_ne!(pair.limit.order_id, pair.stop.order_id);
        assert!(ex.cancels().is_empty());
    }

    #[tokio::test]
    async fn test_oco_second_leg_failure_cancels_first_once() {
        let rejected = OrderError::ExchangeRejected { code: -2021, msg: "Order would immediately trigger.".into() };
        let ex = StubExchange::accept_all().fail_placement(1, rejected.clone());

        let err = OrderSubmitter::new(&ex).place_oco(&sell_oco()).await.unwrap_err();
        assert_eq!(err, rejected);

        let calls = ex.calls();
        let first_id = 1000;
        assert_eq!(ex.cancels(), vec![first_id]);
        assert!(matches!(calls.last(), Some(ExchangeCall::Cancel { order_id, .. }) if *order_id == first_id));
    }

    #[tokio::test]
    async fn test_oco_cancel_failure_does_not_mask_error() {
        let ex = StubExchange::accept_all()
            .fail_placement(1, OrderError::Network("connection reset".into()))
            .fail_cancel(OrderError::Network("still down".into()));

        let err = OrderSubmitter::new(&ex).place_oco(&sell_oco()).await.unwrap_err();
        assert_eq!(err, OrderError::Network("connection reset".into()));
        assert_eq!(ex.cancels().len(), 1);
    }

    #[tokio::test]
    async fn test_oco_first_leg_failure_places_nothing_else() {
        let ex = StubExchange::accept_all().fail_placement(0, OrderError::Authentication("-2015".into()));
        let err = OrderSubmitter::new(&ex).place_oco(&sell_oco()).await.unwrap_err();
        assert_eq!(err.kind(), "authentication");
        assert_eq!(ex.placements().len(), 1);
        assert!(ex.cancels().is_empty());
    }
}
