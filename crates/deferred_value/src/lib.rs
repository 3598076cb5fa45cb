//! A thread-safe deferred-value primitive with chainable reactions.
//!
//! A [`Deferred`] eventually holds either a success payload or a failure
//! reason, produced by a single computation that runs asynchronously on an
//! injected [`Scheduler`]. Observers register reactions with
//! [`Deferred::then`], [`Deferred::catch`] and [`Deferred::finally`]; each
//! reaction is itself a deferred value, so registrations compose into a
//! forward-only tree of dependent outcomes.
//!
//! # Key properties
//!
//! - Settlement is monotonic and first-write-wins: a value settles once,
//!   and late settlement calls never overwrite the stored outcome
//! - Reactions registered before settlement run in registration order when
//!   the value settles; reactions registered after settlement run
//!   immediately, in the same turn
//! - A reaction callback may hand back another deferred value, which the
//!   chain flattens into its eventual outcome
//! - A failure in a fulfillment callback becomes a rejection observable by
//!   the nearest rejection handler downstream; rejection callbacks have no
//!   such safety net (see [`Deferred::catch`])
//!
//! # Example
//!
//! ```rust
//! use deferred_value::{Deferred, Fault, Payload, Produced, TurnQueue};
//!
//! let queue = TurnQueue::new();
//!
//! let value = Deferred::new(&queue, |_fulfill, reject| {
//!     reject.call(Fault::new("X"));
//!     Ok(())
//! });
//!
//! // A handled rejection converts the chain back to fulfilled.
//! let message = value.catch(|reason| Produced::from(reason.to_string()));
//!
//! queue.run_until_idle();
//!
//! assert_eq!(message.payload(), Some(Payload::from("X")));
//! ```

pub mod deferred;

pub use deferred::{
    Deferred, Fault, Fulfill, Payload, Produced, Reject, Scheduler, SettlementState, Task,
    TurnQueue,
};
