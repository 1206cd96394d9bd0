//! Pumble API client.
//!
//! Layers, bottom to top:
//! - [`transport`]: the request shape and the [`Transport`] seam
//! - [`http`]: the `reqwest` transport
//! - [`client`]: one method per endpoint, raw JSON out
//! - [`normalize`] and [`models`]: tolerant decoding into records
//! - [`pagination`] and [`query`]: full-history walks and filters
//! - [`service`]: the facade applications use

pub mod client;
pub mod http;
pub mod models;
pub mod normalize;
pub mod pagination;
pub mod query;
pub mod service;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{PumbleClient, SendAs};
pub use http::{DEFAULT_BASE_URL, HttpTransport};
pub use models::{Channel, Message, MessageCollection, User};
pub use normalize::Normalize;
pub use pagination::{PageSource, fetch_all};
pub use service::PumbleService;
pub use transport::{ApiRequest, Method, Transport};
