pub mod client;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod filter;
pub mod ip;
pub mod logs;
pub mod normalize;
pub mod request;
pub mod system;
pub mod transport;

pub use client::RouterClient;
pub use error::ClientError;
pub use logs::{LogOptions, LogsClient, ResultSet, DEFAULT_MAX_RECORDS};
pub use normalize::Record;
