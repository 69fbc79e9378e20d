pub mod bootstrap;
pub mod config;
pub mod error;
pub mod tracker;

pub use bootstrap::{StoreBackend, open_store};
pub use config::{RuttConfig, StoreConfig};
pub use error::EngineError;
pub use tracker::Tracker;

pub use rutt_api::StoreError;
