mod api;
mod config;
mod decode;
mod error;
mod order_record;
mod signing;

pub use api::{GatewayApi, GatewayEnvelope};
pub use config::{GatewayConfig, SigningCredentials};
pub use decode::{decode_order, decode_order_list};
pub use error::GatewayError;
pub use order_record::OrderRecord;
pub use signing::sign;
