//! Latest-value core: versioned store, wait coordinator, and query handle.

mod builder;
mod coordinator;
mod facade;
mod store;
mod validation;

pub use builder::LatestValueBuilder;
pub use coordinator::{WaitCoordinator, WaitOutcome};
pub use facade::LatestValue;
pub use store::{VersionedStore, VersionedValue};
pub use validation::Validate;
