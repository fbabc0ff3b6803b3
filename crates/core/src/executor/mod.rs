pub mod core;
pub mod events;
pub mod run;

pub use self::core::{InvalidationKey, TransactionExecutor};
pub use events::{LifecycleEvent, NoOpNotifier, Notifier};
pub use run::{ActionMeta, RunError, TransactionRun, TransactionState};
