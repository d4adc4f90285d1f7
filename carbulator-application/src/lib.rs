#![warn(clippy::uninlined_format_args)]

pub mod error;
pub mod model;
pub mod payoff_service;
pub mod ports;

pub use error::{FailureKind, PayoffError, StoreError};
pub use model::NewDebt;
pub use payoff_service::PayoffService;
pub use ports::{PayoffStore, PayoffTransaction};
