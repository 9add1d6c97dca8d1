#[cfg(feature = "cli")]
pub mod cli;
pub mod ledger;

pub use ledger::TailLedger;
