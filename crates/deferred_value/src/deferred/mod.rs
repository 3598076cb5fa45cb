//! Core deferred-value components.
//!
//! This module provides the building blocks for deferred outcomes:
//!
//! - `Deferred`: a container that eventually settles as fulfilled or
//!   rejected, with `then`/`catch`/`finally` chaining
//! - `Payload` and `Fault`: the dynamically-typed settled value and the
//!   failure reason it carries on rejection
//! - `TurnQueue`: a deterministic FIFO scheduler that runs root
//!   computations one turn at a time
//!
//! # Example
//!
//! ```rust
//! use deferred_value::{Deferred, Payload, Produced, TurnQueue};
//!
//! let queue = TurnQueue::new();
//!
//! // The computation does not run here; it runs on a later turn.
//! let value = Deferred::new(&queue, |fulfill, _reject| {
//!     fulfill.call("PROMISE_A_VALUE");
//!     Ok(())
//! });
//!
//! let chained = value.then(|payload| {
//!     Ok(Produced::Value(payload))
//! });
//!
//! queue.run_until_idle();
//!
//! assert_eq!(chained.payload(), Some(Payload::from("PROMISE_A_VALUE")));
//! ```

mod payload;
mod scheduler;
mod value;

pub use payload::{Fault, Payload};
pub use scheduler::{Scheduler, Task, TurnQueue};
pub use value::{Deferred, Fulfill, Produced, Reject, SettlementState};
