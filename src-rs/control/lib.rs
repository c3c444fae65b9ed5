pub mod cancel;
pub mod guard;

pub use cancel::CancellationToken;
pub use guard::{ActiveTask, ConcurrencyGuard, GuardLease};
