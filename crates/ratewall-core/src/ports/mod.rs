//! Ports - trait definitions for the limiter's external collaborators.
//! Infrastructure crates provide the concrete implementations.

mod counter;
mod membership;
mod pubsub;

pub use counter::{CounterError, WindowCounter};
pub use membership::{MembershipStore, StoreError};
pub use pubsub::{PubSub, PubSubError, PubSubMessage, Publisher};
