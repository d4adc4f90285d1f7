#![warn(clippy::uninlined_format_args)]

pub mod ledger;
pub mod memory_store;

pub use ledger::{LedgerImport, LedgerImportError, import_ledger};
pub use memory_store::{InMemoryPayoffStore, InMemoryTransaction};
