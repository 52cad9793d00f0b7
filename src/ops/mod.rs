pub mod notify;
pub mod reconcile;
pub mod session;

pub use reconcile::{Discarded, Reconciliation, reconcile};
pub use session::{BootstrapOptions, Session, bootstrap};
