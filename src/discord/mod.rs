//! Discord transport: gateway WebSocket, REST client and the wire models.

pub mod gateway;
pub mod http;
pub mod model;

pub use gateway::{connect, GatewayConfig, GatewayHandle};
pub use http::{DiscordHttp, HttpError, MessageRef};
pub use model::GatewayEvent;
