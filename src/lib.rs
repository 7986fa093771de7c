pub mod config;
pub mod db;
pub mod error;
pub mod services;
pub mod validation;

pub use db::models::{Account, Entry, Transfer};
pub use error::LedgerError;
pub use services::transfer::{TransferParams, TransferResult, TransferService};
