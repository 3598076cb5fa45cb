use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::deferred::payload::{Fault, Payload};
use crate::deferred::scheduler::Scheduler;

type OnFulfilled = Box<dyn FnOnce(Payload) -> Result<Produced, Fault> + Send + 'static>;
type OnRejected = Box<dyn FnOnce(Payload) -> Produced + Send + 'static>;
type OnSettled = Box<dyn FnOnce() + Send + 'static>;

/// The settlement state of a deferred value.
///
/// Settlement is monotonic: once a value leaves `Pending` its state and
/// payload never change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementState {
    Pending,
    Fulfilled,
    Rejected,
}

/// What a reaction callback hands back: either an immediate payload, or
/// another deferred value whose eventual outcome the reaction node adopts.
pub enum Produced {
    Value(Payload),
    Deferred(Deferred),
}

impl Produced {
    pub fn value(payload: impl Into<Payload>) -> Self {
        Produced::Value(payload.into())
    }

    pub fn none() -> Self {
        Produced::Value(Payload::None)
    }
}

impl From<Payload> for Produced {
    fn from(payload: Payload) -> Self {
        Produced::Value(payload)
    }
}

impl From<Deferred> for Produced {
    fn from(deferred: Deferred) -> Self {
        Produced::Deferred(deferred)
    }
}

impl From<&str> for Produced {
    fn from(value: &str) -> Self {
        Produced::Value(value.into())
    }
}

impl From<String> for Produced {
    fn from(value: String) -> Self {
        Produced::Value(value.into())
    }
}

impl From<i64> for Produced {
    fn from(value: i64) -> Self {
        Produced::Value(value.into())
    }
}

impl From<f64> for Produced {
    fn from(value: f64) -> Self {
        Produced::Value(value.into())
    }
}

impl From<bool> for Produced {
    fn from(value: bool) -> Self {
        Produced::Value(value.into())
    }
}

impl From<Fault> for Produced {
    fn from(fault: Fault) -> Self {
        Produced::Value(fault.into())
    }
}

/// Settles the owning deferred value with a success payload.
///
/// Handed to a root computation as its first argument.
#[derive(Clone)]
pub struct Fulfill {
    target: Deferred,
}

impl Fulfill {
    pub fn call(&self, value: impl Into<Payload>) {
        self.target.fulfill(value);
    }
}

/// Settles the owning deferred value with a failure reason.
///
/// Handed to a root computation as its second argument.
#[derive(Clone)]
pub struct Reject {
    target: Deferred,
}

impl Reject {
    pub fn call(&self, reason: impl Into<Payload>) {
        self.target.reject(reason);
    }
}

/// Distinguishes what a node does with its parent's outcome at fan-out time.
///
/// Plain nodes (roots) have no parent. Reaction nodes derive their own
/// settlement by invoking one of two optional callbacks against the parent's
/// payload. Finalizer nodes run a side-effect callback and then mirror the
/// parent's outcome unchanged. Callbacks are taken out of the role on first
/// use, so each runs at most once.
enum Role {
    Plain,
    Reaction {
        on_fulfilled: Option<OnFulfilled>,
        on_rejected: Option<OnRejected>,
    },
    Finalizer {
        on_settled: Option<OnSettled>,
    },
}

struct Inner {
    state: SettlementState,
    payload: Payload,
    reactions: Vec<Deferred>,
    finalizers: Vec<Deferred>,
    role: Role,
}

/// A container that eventually holds either a success payload or a failure
/// reason, produced by a single asynchronous computation.
///
/// `Deferred` is a cheap cloneable handle to shared state. Reactions
/// registered with [`Deferred::then`], [`Deferred::catch`] and
/// [`Deferred::finally`] are themselves deferred values, so chains compose:
/// each link settles from the previous link's outcome.
///
/// Ownership runs strictly parent to children: a node holds handles to the
/// reactions registered on it and never a reference back to its parent, so
/// chains form a forward-only tree with no cycles.
#[derive(Clone)]
pub struct Deferred {
    inner: Arc<Mutex<Inner>>,
}

impl Deferred {
    /// Creates a deferred value driven by `computation`.
    ///
    /// The computation is not invoked here; it is deferred as a single task
    /// onto `scheduler` and runs when the scheduler's owner gets to it. It
    /// receives [`Fulfill`] and [`Reject`] handles to settle the value with,
    /// and may instead return an error, which rejects the value. A
    /// computation failure never escapes past the deferred value.
    pub fn new<S, C>(scheduler: &S, computation: C) -> Self
    where
        S: Scheduler + ?Sized,
        C: FnOnce(Fulfill, Reject) -> Result<(), Fault> + Send + 'static,
    {
        let deferred = Self::with_role(Role::Plain);

        let target = deferred.clone();
        scheduler.defer(Box::new(move || {
            let fulfill = Fulfill {
                target: target.clone(),
            };
            let reject = Reject {
                target: target.clone(),
            };
            if let Err(fault) = computation(fulfill, reject) {
                target.reject(fault);
            }
        }));
        trace!("deferred root computation");

        deferred
    }

    /// Creates a deferred value with no computation; it stays pending until
    /// settled externally.
    pub fn pending() -> Self {
        Self::with_role(Role::Plain)
    }

    fn with_role(role: Role) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: SettlementState::Pending,
                payload: Payload::None,
                reactions: Vec::new(),
                finalizers: Vec::new(),
                role,
            })),
        }
    }

    pub fn state(&self) -> SettlementState {
        self.inner.lock().state
    }

    pub fn is_pending(&self) -> bool {
        self.state() == SettlementState::Pending
    }

    pub fn is_fulfilled(&self) -> bool {
        self.state() == SettlementState::Fulfilled
    }

    pub fn is_rejected(&self) -> bool {
        self.state() == SettlementState::Rejected
    }

    pub fn is_settled(&self) -> bool {
        !self.is_pending()
    }

    /// The settled payload, or `None` while pending.
    pub fn payload(&self) -> Option<Payload> {
        let inner = self.inner.lock();
        match inner.state {
            SettlementState::Pending => None,
            _ => Some(inner.payload.clone()),
        }
    }

    /// Settles this value as fulfilled.
    ///
    /// Only the first settlement writes the stored state and payload. A
    /// later call never overwrites them, but it still fans out with the
    /// argument it was given — over queues that a prior settlement already
    /// emptied, so no reaction runs twice.
    pub fn fulfill(&self, value: impl Into<Payload>) {
        self.settle(SettlementState::Fulfilled, value.into());
    }

    /// Settles this value as rejected. Same first-write-wins rules as
    /// [`Deferred::fulfill`].
    pub fn reject(&self, reason: impl Into<Payload>) {
        self.settle(SettlementState::Rejected, reason.into());
    }

    fn settle(&self, to: SettlementState, payload: Payload) {
        let (state, reactions, finalizers) = {
            let mut inner = self.inner.lock();
            if inner.state == SettlementState::Pending {
                inner.state = to;
                inner.payload = payload.clone();
            }
            (
                inner.state,
                std::mem::take(&mut inner.reactions),
                std::mem::take(&mut inner.finalizers),
            )
        };

        trace!("settled. state: {:?}, payload: {:?}", state, payload);

        // Fan-out dispatches on the stored state, with the payload this call
        // was given; the lock is released first so callbacks can chain onto
        // this value again.
        Self::fan_out(state, payload, reactions, finalizers);
    }

    fn fan_out(
        state: SettlementState,
        payload: Payload,
        reactions: Vec<Deferred>,
        finalizers: Vec<Deferred>,
    ) {
        match state {
            SettlementState::Fulfilled => {
                for node in reactions {
                    node.run_on_fulfilled(payload.clone());
                }
                for node in finalizers {
                    node.run_finalizer();
                    node.fulfill(payload.clone());
                }
            }
            SettlementState::Rejected => {
                for node in reactions {
                    node.run_on_rejected(payload.clone());
                }
                for node in finalizers {
                    node.run_finalizer();
                    node.reject(payload.clone());
                }
            }
            SettlementState::Pending => unreachable!("fan-out before settlement"),
        }
    }

    /// Registers a fulfillment callback, returning the reaction node that
    /// settles from the callback's result.
    ///
    /// The callback runs when (or immediately, if) this value is fulfilled.
    /// Returning `Ok(Produced::Value)` fulfills the node; returning
    /// `Ok(Produced::Deferred)` makes the node adopt that inner value's
    /// eventual outcome; returning `Err` rejects the node, which the nearest
    /// rejection handler downstream can observe.
    ///
    /// If this value is rejected instead, the node rejects with the same
    /// reason, propagating it down the chain.
    pub fn then<F>(&self, on_fulfilled: F) -> Deferred
    where
        F: FnOnce(Payload) -> Result<Produced, Fault> + Send + 'static,
    {
        self.react(Some(Box::new(on_fulfilled)), None)
    }

    /// Registers both a fulfillment and a rejection callback on one node.
    pub fn then_catch<F, R>(&self, on_fulfilled: F, on_rejected: R) -> Deferred
    where
        F: FnOnce(Payload) -> Result<Produced, Fault> + Send + 'static,
        R: FnOnce(Payload) -> Produced + Send + 'static,
    {
        self.react(Some(Box::new(on_fulfilled)), Some(Box::new(on_rejected)))
    }

    /// Registers a rejection callback, returning the reaction node.
    ///
    /// A rejection callback that returns a plain payload converts the chain
    /// back to fulfilled for everything downstream. Note the asymmetry with
    /// [`Deferred::then`]: the rejection callback has no error channel, so a
    /// failure inside it propagates to whoever triggered the fan-out instead
    /// of becoming a rejection.
    pub fn catch<R>(&self, on_rejected: R) -> Deferred
    where
        R: FnOnce(Payload) -> Produced + Send + 'static,
    {
        self.react(None, Some(Box::new(on_rejected)))
    }

    /// Registers a reaction with no callbacks.
    ///
    /// The returned node is a distinct deferred value. On rejection it
    /// mirrors this value's reason; on fulfillment it settles with an empty
    /// payload, not this value's payload.
    pub fn chain(&self) -> Deferred {
        self.react(None, None)
    }

    fn react(&self, on_fulfilled: Option<OnFulfilled>, on_rejected: Option<OnRejected>) -> Deferred {
        let node = Self::with_role(Role::Reaction {
            on_fulfilled,
            on_rejected,
        });

        let already_settled = {
            let mut inner = self.inner.lock();
            inner.reactions.push(node.clone());
            match inner.state {
                SettlementState::Pending => None,
                state => Some((
                    state,
                    inner.payload.clone(),
                    std::mem::take(&mut inner.reactions),
                    std::mem::take(&mut inner.finalizers),
                )),
            }
        };

        // Registration on a settled value runs the callback in the same
        // turn, with the stored payload.
        if let Some((state, payload, reactions, finalizers)) = already_settled {
            Self::fan_out(state, payload, reactions, finalizers);
        }

        node
    }

    /// Registers a callback invoked once this value settles, regardless of
    /// outcome.
    ///
    /// On a pending value this returns a finalizer node that adopts this
    /// value's exact outcome (payload and state unchanged) after the
    /// callback runs. On an already-settled value the callback runs here and
    /// there is no node left to chain onto, hence `None`; the stored outcome
    /// is re-fanned-out first, a no-op over the already-drained queues.
    pub fn finally<F>(&self, on_settled: F) -> Option<Deferred>
    where
        F: FnOnce() + Send + 'static,
    {
        let (state, payload) = {
            let mut inner = self.inner.lock();
            if inner.state == SettlementState::Pending {
                let node = Self::with_role(Role::Finalizer {
                    on_settled: Some(Box::new(on_settled)),
                });
                inner.finalizers.push(node.clone());
                return Some(node);
            }
            (inner.state, inner.payload.clone())
        };

        if state == SettlementState::Fulfilled {
            self.fulfill(payload);
        } else {
            self.reject(payload);
        }
        on_settled();

        None
    }

    fn run_on_fulfilled(&self, payload: Payload) {
        let Some(callback) = self.take_on_fulfilled() else {
            // No fulfillment callback degrades to an empty payload rather
            // than passing the parent's value through.
            self.fulfill(Payload::None);
            return;
        };

        match callback(payload) {
            Ok(Produced::Value(value)) => self.fulfill(value),
            Ok(Produced::Deferred(inner)) => inner.pipe_into(self.clone()),
            Err(fault) => self.run_on_rejected(Payload::Fault(fault)),
        }
    }

    fn run_on_rejected(&self, payload: Payload) {
        let Some(callback) = self.take_on_rejected() else {
            // No rejection callback propagates the reason unchanged.
            self.reject(payload);
            return;
        };

        match callback(payload) {
            // A handled rejection converts the node back to fulfilled.
            Produced::Value(value) => self.fulfill(value),
            Produced::Deferred(inner) => inner.pipe_into(self.clone()),
        }
    }

    fn run_finalizer(&self) {
        let callback = {
            let mut inner = self.inner.lock();
            match &mut inner.role {
                Role::Finalizer { on_settled } => on_settled.take(),
                _ => None,
            }
        };
        if let Some(callback) = callback {
            callback();
        }
    }

    fn take_on_fulfilled(&self) -> Option<OnFulfilled> {
        let mut inner = self.inner.lock();
        match &mut inner.role {
            Role::Reaction { on_fulfilled, .. } => on_fulfilled.take(),
            _ => None,
        }
    }

    fn take_on_rejected(&self) -> Option<OnRejected> {
        let mut inner = self.inner.lock();
        match &mut inner.role {
            Role::Reaction { on_rejected, .. } => on_rejected.take(),
            _ => None,
        }
    }

    /// Routes this value's eventual outcome into `target`, unchanged. This
    /// is how a reaction node adopts a deferred value returned by its
    /// callback; nesting flattens because the inner value resolves through
    /// this same path.
    fn pipe_into(&self, target: Deferred) {
        let fulfill_target = target.clone();
        let reject_target = target;
        self.react(
            Some(Box::new(move |value| {
                fulfill_target.fulfill(value);
                Ok(Produced::none())
            })),
            Some(Box::new(move |reason| {
                reject_target.reject(reason);
                Produced::none()
            })),
        );
    }
}

/// Handle identity: two `Deferred`s are equal when they refer to the same
/// underlying node.
impl PartialEq for Deferred {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Deferred {}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Deferred")
            .field("state", &inner.state)
            .field("payload", &inner.payload)
            .finish()
    }
}
