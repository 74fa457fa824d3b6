use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{OrderError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Sign a query string with HMAC-SHA256 (Binance style).
/// Returns hex-encoded signature.
pub fn sign_binance(query: &str, secret: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| OrderError::Unknown(format!("HMAC error: {}", e)))?;
    mac.update(query.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// URL-encode `params` in order, then append `timestamp`, `recvWindow`
/// and the signature over everything before it.
pub fn signed_query(params: &[(&str, String)], timestamp_ms: u64, recv_window_ms: u64, secret: &str) -> Result<String> {
    let mut ser = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in params {
        ser.append_pair(k, v);
    }
    ser.append_pair("timestamp", &timestamp_ms.to_string());
    ser.append_pair("recvWindow", &recv_window_ms.to_string());
    let query = ser.finish();

    let signature = sign_binance(&query, secret)?;
    Ok(format!("{}&signature={}", query, signature))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binance_sign() {
        let query = "symbol=BTCUSDT&side=BUY&type=LIMIT&timeInForce=GTC&quantity=0.001&price=50000&timestamp=1234567890000";
        let sig = sign_binance(query, "test_secret").unwrap();
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_binance_documented_vector() {
        // Example from the Binance API docs (SIGNED endpoint security).
        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        let secret = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
        assert_eq!(
            sign_binance(query, secret).unwrap(),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn test_signed_query_layout() {
        let params = [("symbol", "BTCUSDT".to_string()), ("side", "SELL".to_string())];
        let q = signed_query(&params, 1700000000000, 5000, "s").unwrap();
        assert!(q.starts_with("symbol=BTCUSDT&side=SELL&timestamp=1700000000000&recvWindow=5000&signature="));
        let unsigned = q.rsplit_once("&signature=").unwrap();
        assert_eq!(unsigned.1, sign_binance(unsigned.0, "s").unwrap());
    }
}
