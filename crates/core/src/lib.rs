pub mod approval;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod ledger;
pub mod messages;
pub mod permit;

pub use approval::*;
pub use classify::*;
pub use client::*;
pub use config::*;
pub use error::*;
pub use executor::{
    ActionMeta, InvalidationKey, LifecycleEvent, NoOpNotifier, Notifier, RunError,
    TransactionExecutor, TransactionRun, TransactionState,
};
pub use ledger::*;
pub use permit::*;
