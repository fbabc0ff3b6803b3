use alloy::primitives::TxHash;

/// Lifecycle events emitted while a run progresses. The presentation layer
/// decides what (if anything) to render for each.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Dispatched to the wallet; waiting for the user to confirm.
    Pending { action: String, label: String },
    /// Hash obtained; waiting for ledger finality.
    Confirming { action: String, hash: TxHash },
    Success { action: String, hash: TxHash },
    Error {
        action: String,
        title: String,
        message: String,
    },
}

/// Sink for lifecycle events.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: LifecycleEvent);

    /// Clear any pending notification for an action. Used on user rejection,
    /// which surfaces nothing.
    fn dismiss(&self, action: &str);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpNotifier;

impl Notifier for NoOpNotifier {
    fn notify(&self, _event: LifecycleEvent) {}

    fn dismiss(&self, _action: &str) {}
}
