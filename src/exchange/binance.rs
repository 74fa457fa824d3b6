use std::time::Duration;

use reqwest::{Client, Method};
use serde::Deserialize;

use crate::config::Config;
use crate::credentials::Credentials;
use crate::error::{OrderError, Result};
use crate::exchange::signing::signed_query;
use crate::exchange::FuturesExchange;
use crate::orders::{format_decimal, AccountSnapshot, AssetBalance, OpenOrder, OrderRequest, PlacedOrder, Side};

/// Binance error codes that mean the key, secret or signature is wrong.
const AUTH_ERROR_CODES: &[i64] = &[-1022, -2014, -2015];

/// Signed REST client for Binance USDⓈ-M futures.
pub struct BinanceFutures {
    client: Client,
    base: String,
    credentials: Credentials,
    recv_window_ms: u64,
}

impl BinanceFutures {
    pub fn new(cfg: &Config, credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()
            .map_err(|e| OrderError::Unknown(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            base: cfg.fapi_base.trim_end_matches('/').to_string(),
            credentials,
            recv_window_ms: cfg.recv_window_ms,
        })
    }

    fn timestamp_ms() -> u64 {
        chrono::Utc::now().timestamp_millis() as u64
    }

    async fn send_signed(&self, method: Method, path: &str, params: &[(&str, String)]) -> Result<String> {
        let query = signed_query(params, Self::timestamp_ms(), self.recv_window_ms, &self.credentials.api_secret)?;
        let url = format!("{}{}?{}", self.base, path, query);

        let resp = self
            .client
            .request(method, &url)
            .header("X-MBX-APIKEY", &self.credentials.api_key)
            .send()
            .await?;
        Self::read_body(resp).await
    }

    async fn send_public(&self, path: &str, params: &[(&str, String)]) -> Result<String> {
        let url = format!("{}{}", self.base, path);
        let resp = self.client.get(&url).query(params).send().await?;
        Self::read_body(resp).await
    }

    async fn read_body(resp: reqwest::Response) -> Result<String> {
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(classify_failure(status.as_u16(), &body));
        }
        Ok(body)
    }
}

#[derive(Deserialize, Debug)]
struct BinanceError {
    code: i64,
    msg: String,
}

/// Map a non-2xx response onto the error taxonomy.
pub fn classify_failure(status: u16, body: &str) -> OrderError {
    let parsed: Option<BinanceError> = serde_json::from_str(body).ok();
    match parsed {
        Some(err) if status == 401 || status == 403 || AUTH_ERROR_CODES.contains(&err.code) => {
            OrderError::Authentication(format!("{} - {}", err.code, err.msg))
        }
        None if status == 401 || status == 403 => OrderError::Authentication(format!("HTTP {}: {}", status, body)),
        Some(err) if (400..500).contains(&status) => OrderError::ExchangeRejected { code: err.code, msg: err.msg },
        Some(err) => OrderError::Unknown(format!("HTTP {}: {} - {}", status, err.code, err.msg)),
        None => OrderError::Unknown(format!("HTTP {}: {}", status, body)),
    }
}

/// Binance sends numbers as strings; "0" stands for "not set".
fn num(raw: &str) -> f64 {
    raw.parse().unwrap_or(0.0)
}

fn optional_num(raw: &str) -> Option<f64> {
    Some(num(raw)).filter(|v| *v > 0.0)
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct FuturesOrderResponse {
    order_id: u64,
    symbol: String,
    side: String,
    #[serde(rename = "type")]
    order_type: String,
    #[serde(default)]
    client_order_id: Option<String>,
    #[serde(default)]
    orig_qty: String,
    #[serde(default)]
    executed_qty: String,
    #[serde(default)]
    price: String,
    #[serde(default)]
    stop_price: String,
    status: String,
    #[serde(default)]
    time_in_force: String,
}

impl FuturesOrderResponse {
    fn into_placed(self, fallback_side: Side) -> PlacedOrder {
        PlacedOrder {
            order_id: self.order_id,
            client_order_id: self.client_order_id,
            side: Side::parse(&self.side).unwrap_or(fallback_side),
            symbol: self.symbol,
            order_type: self.order_type,
            quantity: num(&self.orig_qty),
            executed_qty: num(&self.executed_qty),
            price: num(&self.price),
            stop_price: optional_num(&self.stop_price),
            status: self.status,
            time_in_force: self.time_in_force,
        }
    }

    fn into_open(self) -> OpenOrder {
        OpenOrder {
            order_id: self.order_id,
            quantity: num(&self.orig_qty),
            price: num(&self.price),
            stop_price: optional_num(&self.stop_price),
            symbol: self.symbol,
            side: self.side,
            order_type: self.order_type,
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    total_wallet_balance: String,
    available_balance: String,
    #[serde(default)]
    assets: Vec<AccountAsset>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct AccountAsset {
    asset: String,
    wallet_balance: String,
    available_balance: String,
}

#[derive(Deserialize, Debug)]
struct TickerPrice {
    price: String,
}

/// Query parameters for `POST /fapi/v1/order`.
fn order_params(req: &OrderRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("symbol", req.symbol.to_uppercase()),
        ("side", req.side.as_str().to_string()),
        ("type", req.kind.wire_type().to_string()),
    ];
    if let Some(tif) = req.kind.time_in_force() {
        params.push(("timeInForce", tif.as_str().to_string()));
    }
    params.push(("quantity", format_decimal(req.quantity)));
    if let Some(price) = req.kind.price() {
        params.push(("price", format_decimal(price)));
    }
    if let Some(stop) = req.kind.stop_price() {
        params.push(("stopPrice", format_decimal(stop)));
    }
    params
}

fn parse_account(body: &str) -> Result<AccountSnapshot> {
    let acct: AccountResponse = serde_json::from_str(body)?;
    Ok(AccountSnapshot {
        total_wallet_balance: num(&acct.total_wallet_balance),
        available_balance: num(&acct.available_balance),
        assets: acct
            .assets
            .into_iter()
            .map(|a| AssetBalance {
                wallet_balance: num(&a.wallet_balance),
                available_balance: num(&a.available_balance),
                asset: a.asset,
            })
            .collect(),
    })
}

fn parse_ticker(body: &str) -> Result<f64> {
    let ticker: TickerPrice = serde_json::from_str(body)?;
    ticker
        .price
        .parse()
        .map_err(|_| OrderError::Unknown(format!("unparseable ticker price: {}", ticker.price)))
}

#[async_trait::async_trait]
impl FuturesExchange for BinanceFutures {
    async fn place_order(&self, req: &OrderRequest) -> Result<PlacedOrder> {
        let body = self.send_signed(Method::POST, "/fapi/v1/order", &order_params(req)).await?;
        let order: FuturesOrderResponse = serde_json::from_str(&body)?;
        Ok(order.into_placed(req.side))
    }

    async fn cancel_order(&self, symbol: &str, order_id: u64) -> Result<()> {
        let params = [("symbol", symbol.to_uppercase()), ("orderId", order_id.to_string())];
        self.send_signed(Method::DELETE, "/fapi/v1/order", &params).await?;
        Ok(())
    }

    async fn open_orders(&self, symbol: Option<&str>) -> Result<Vec<OpenOrder>> {
        let params: Vec<(&str, String)> = symbol.map(|s| vec![("symbol", s.to_uppercase())]).unwrap_or_default();
        let body = self.send_signed(Method::GET, "/fapi/v1/openOrders", &params).await?;
        let orders: Vec<FuturesOrderResponse> = serde_json::from_str(&body)?;
        Ok(orders.into_iter().map(FuturesOrderResponse::into_open).collect())
    }

    async fn account(&self) -> Result<AccountSnapshot> {
        let body = self.send_signed(Method::GET, "/fapi/v2/account", &[]).await?;
        parse_account(&body)
    }

    async fn ticker_price(&self, symbol: &str) -> Result<f64> {
        let body = self.send_public("/fapi/v1/ticker/price", &[("symbol", symbol.to_uppercase())]).await?;
        parse_ticker(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::OrderKind;

    fn req(kind: OrderKind) -> OrderRequest {
        OrderRequest { symbol: "btcusdt".into(), side: Side::Sell, quantity: 0.01, kind }
    }

    #[test]
    fn test_timestamp() {
        let ts = BinanceFutures::timestamp_ms();
        assert!(ts > 1700000000000);
    }

    #[test]
    fn test_market_params_have_no_price() {
        let params = order_params(&req(OrderKind::Market));
        let keys: Vec<&str> = params.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["symbol", "side", "type", "quantity"]);
        assert_eq!(params[0].1, "BTCUSDT");
        assert_eq!(params[3].1, "0.01");
    }

    #[test]
    fn test_limit_params_are_gtc() {
        let params = order_params(&req(OrderKind::Limit { price: 29000.0 }));
        assert!(params.contains(&("type", "LIMIT".to_string())));
        assert!(params.contains(&("timeInForce", "GTC".to_string())));
        assert!(params.contains(&("price", "29000".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "stopPrice"));
    }

    #[test]
    fn test_stop_limit_params() {
        let params = order_params(&req(OrderKind::StopLimit { price: 28000.0, stop_price: 28500.0 }));
        assert!(params.contains(&("type", "STOP".to_string())));
        assert!(params.contains(&("price", "28000".to_string())));
        assert!(params.contains(&("stopPrice", "28500".to_string())));
    }

    #[test]
    fn test_classify_auth_failures() {
        let err = classify_failure(401, r#"{"code":-2015,"msg":"Invalid API-key, IP, or permissions for action."}"#);
        assert!(matches!(err, OrderError::Authentication(_)));

        let err = classify_failure(400, r#"{"code":-1022,"msg":"Signature for this request is not valid."}"#);
        assert!(matches!(err, OrderError::Authentication(_)));

        let err = classify_failure(403, "<html>forbidden</html>");
        assert!(matches!(err, OrderError::Authentication(_)));
    }

    #[test]
    fn test_classify_rejection_is_verbatim() {
        let err = classify_failure(400, r#"{"code":-2019,"msg":"Margin is insufficient."}"#);
        assert_eq!(err, OrderError::ExchangeRejected { code: -2019, msg: "Margin is insufficient.".into() });
    }

    #[test]
    fn test_classify_other_failures_unknown() {
        assert!(matches!(classify_failure(502, "bad gateway"), OrderError::Unknown(_)));
        assert!(matches!(classify_failure(500, r#"{"code":-1000,"msg":"internal"}"#), OrderError::Unknown(_)));
        assert!(matches!(classify_failure(400, "not json"), OrderError::Unknown(_)));
    }

    #[test]
    fn test_parse_order_response() {
        let body = r#"{"orderId":4051256813,"symbol":"BTCUSDT","status":"NEW","clientOrderId":"x-abc",
            "price":"28000","avgPrice":"0.00","origQty":"0.010","executedQty":"0","cumQuote":"0",
            "timeInForce":"GTC","type":"STOP","reduceOnly":false,"side":"SELL","stopPrice":"28500",
            "workingType":"CONTRACT_PRICE","updateTime":1700000000000}"#;
        let order: FuturesOrderResponse = serde_json::from_str(body).unwrap();
        let placed = order.into_placed(Side::Buy);
        assert_eq!(placed.order_id, 4051256813);
        assert_eq!(placed.side, Side::Sell);
        assert_eq!(placed.order_type, "STOP");
        assert_eq!(placed.quantity, 0.01);
        assert_eq!(placed.price, 28000.0);
        assert_eq!(placed.stop_price, Some(28500.0));
        assert_eq!(placed.client_order_id.as_deref(), Some("x-abc"));
    }

    #[test]
    fn test_parse_market_response_zero_stop_is_none() {
        let body = r#"{"orderId":7,"symbol":"BTCUSDT","status":"FILLED","price":"0","origQty":"0.01",
            "executedQty":"0.01","timeInForce":"GTC","type":"MARKET","side":"BUY","stopPrice":"0"}"#;
        let order: FuturesOrderResponse = serde_json::from_str(body).unwrap();
        let open = order.into_open();
        assert_eq!(open.stop_price, None);
        assert_eq!(open.side, "BUY");
    }

    #[test]
    fn test_parse_account_and_ticker() {
        let body = r#"{"totalWalletBalance":"15000.50","availableBalance":"14000.25",
            "assets":[{"asset":"USDT","walletBalance":"15000.50","availableBalance":"14000.25","marginBalance":"1"}],
            "positions":[]}"#;
        let snap = parse_account(body).unwrap();
        assert_eq!(snap.total_wallet_balance, 15000.5);
        assert_eq!(snap.assets.len(), 1);
        assert_eq!(snap.assets[0].asset, "USDT");

        assert_eq!(parse_ticker(r#"{"symbol":"BTCUSDT","price":"28750.10","time":1}"#).unwrap(), 28750.1);
        assert!(parse_ticker(r#"{"symbol":"BTCUSDT","price":"n/a"}"#).is_err());
    }
}
