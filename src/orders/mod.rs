pub mod types;
pub mod validate;

pub use types::{
    format_decimal, AccountSnapshot, AssetBalance, OcoPair, OcoRequest, OpenOrder, OrderKind, OrderRequest,
    PlacedOrder, Side, TimeInForce, MAX_DECIMALS,
};
pub use validate::{validate_limit, validate_market, validate_oco, validate_stop_limit};
