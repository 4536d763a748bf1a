pub mod config;
pub mod job_reconciler;
pub mod maintenance;

// Re-export commonly used types
pub use config::{ExpiryAction, ReconcilerConfig};
pub use job_reconciler::{JobReconciler, ReconcileReport};
