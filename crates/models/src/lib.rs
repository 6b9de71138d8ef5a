pub mod api;
pub mod config;
pub mod error;
pub mod paper;
pub mod species;

pub use api::*;
pub use config::*;
pub use error::*;
pub use paper::*;
pub use species::*;
