use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use deferred_value::{Deferred, Fault, Payload, Produced, TurnQueue};
use parking_lot::Mutex;

#[test]
fn root_value_flows_through_a_chain_of_reactions() {
    // given
    let queue = TurnQueue::new();
    let observed = Arc::new(Mutex::new(None));

    let root = Deferred::new(&queue, |fulfill, _reject| {
        fulfill.call("PROMISE_A_VALUE");
        Ok(())
    });

    let slot = observed.clone();
    root.then(|value| {
        assert_eq!(value, Payload::from("PROMISE_A_VALUE"));
        Ok(Produced::from("PROMISE_B_VALUE"))
    })
    .then(move |value| {
        slot.lock().replace(value);
        Ok(Produced::none())
    });

    // when
    queue.run_until_idle();

    // then
    assert_eq!(
        observed.lock().clone(),
        Some(Payload::from("PROMISE_B_VALUE"))
    );
}

#[test]
fn a_reaction_returning_a_scheduled_deferred_value_flattens() {
    // given
    let queue = Arc::new(TurnQueue::new());
    let observed = Arc::new(Mutex::new(None));

    let root = Deferred::new(queue.as_ref(), |fulfill, _reject| {
        fulfill.call("PROMISE_A_VALUE");
        Ok(())
    });

    let inner_queue = queue.clone();
    let slot = observed.clone();
    root.then(move |value| {
        assert_eq!(value, Payload::from("PROMISE_A_VALUE"));
        let inner = Deferred::new(inner_queue.as_ref(), |fulfill, _reject| {
            fulfill.call("PROMISE_D_VALUE");
            Ok(())
        });
        Ok(Produced::from(inner))
    })
    .then(move |value| {
        slot.lock().replace(value);
        Ok(Produced::none())
    });

    // when: the inner computation is deferred mid-drain and still runs
    queue.run_until_idle();

    // then
    assert_eq!(
        observed.lock().clone(),
        Some(Payload::from("PROMISE_D_VALUE"))
    );
}

#[test]
fn a_rejection_reason_is_observed_as_a_fulfilled_message() {
    // given
    let queue = TurnQueue::new();
    let root = Deferred::new(&queue, |_fulfill, reject| {
        reject.call(Fault::new("X"));
        Ok(())
    });

    let message = root.then_catch(
        |_| panic!("the fulfillment callback must not run"),
        |reason| Produced::from(reason.to_string()),
    );

    // when
    queue.run_until_idle();

    // then
    assert!(message.is_fulfilled());
    assert_eq!(message.payload(), Some(Payload::from("X")));
}

#[test]
fn a_failure_raised_mid_chain_is_caught_and_recovered_from() {
    // given
    let queue = TurnQueue::new();
    let observed = Arc::new(Mutex::new(None));

    let root = Deferred::new(&queue, |fulfill, _reject| {
        fulfill.call("PROMISE_A_RESOLUTION_VALUE");
        Ok(())
    });

    let slot = observed.clone();
    root.then(|_| Err(Fault::new("PROMISE_B_REJECTION_VALUE")))
        .catch(|reason| {
            assert_eq!(
                reason,
                Payload::Fault(Fault::new("PROMISE_B_REJECTION_VALUE"))
            );
            Produced::from("PROMISE_C_RESOLUTION_VALUE")
        })
        .then(move |value| {
            slot.lock().replace(value);
            Ok(Produced::none())
        });

    // when
    queue.run_until_idle();

    // then
    assert_eq!(
        observed.lock().clone(),
        Some(Payload::from("PROMISE_C_RESOLUTION_VALUE"))
    );
}

#[test]
fn an_uncaught_rejection_is_stored_silently_at_the_end_of_the_chain() {
    // given
    let queue = TurnQueue::new();
    let root = Deferred::new(&queue, |_fulfill, reject| {
        reject.call("PROMISE_A_REJECTION_VALUE");
        Ok(())
    });

    let tail = root.then(|_| {
        panic!("the fulfillment callback must not run");
    });

    // when
    queue.run_until_idle();

    // then: the reason propagated unchanged, with no reporting side channel
    assert!(tail.is_rejected());
    assert_eq!(
        tail.payload(),
        Some(Payload::from("PROMISE_A_REJECTION_VALUE"))
    );
}

#[test]
fn finalizers_run_for_fulfilled_rejected_and_recovered_chains() {
    // given
    let queue = TurnQueue::new();
    let invocations = Arc::new(AtomicUsize::new(0));

    let fulfilled_root = Deferred::new(&queue, |fulfill, _reject| {
        fulfill.call("PROMISE_A_RESOLUTION_VALUE");
        Ok(())
    });
    let second_root = Deferred::new(&queue, |fulfill, _reject| {
        fulfill.call(());
        Ok(())
    });

    let counter = invocations.clone();
    fulfilled_root.then(|_| Ok(Produced::none())).finally(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let counter = invocations.clone();
    second_root
        .then(|_| Err(Fault::new("Something went wrong")))
        .finally(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

    let counter = invocations.clone();
    second_root
        .then(|_| Err(Fault::new("PROMISE_B_REJECTION_VALUE")))
        .catch(|_| Produced::none())
        .finally(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

    // when
    queue.run_until_idle();

    // then
    assert_eq!(invocations.load(Ordering::SeqCst), 3);
}

#[test]
fn reactions_can_be_registered_from_inside_the_computation_after_settling() {
    // given
    let queue = TurnQueue::new();
    let observed = Arc::new(Mutex::new(None));

    let root = Deferred::pending();
    let handle = root.clone();
    let slot = observed.clone();
    let bootstrap = Deferred::new(&queue, move |fulfill, _reject| {
        handle.fulfill("PROMISE_A_VALUE");

        // registration after settlement runs immediately, in this same turn
        handle.then(move |value| {
            slot.lock().replace(value);
            Ok(Produced::none())
        });

        fulfill.call(());
        Ok(())
    });

    // when
    queue.run_until_idle();

    // then
    assert!(bootstrap.is_fulfilled());
    assert_eq!(
        observed.lock().clone(),
        Some(Payload::from("PROMISE_A_VALUE"))
    );
}

#[test]
fn settlement_from_another_thread_fans_out_to_registered_reactions() {
    // given
    let root = Deferred::pending();
    let observed = Arc::new(Mutex::new(None));
    let finalized = Arc::new(AtomicBool::new(false));

    let slot = observed.clone();
    root.then(move |value| {
        slot.lock().replace(value);
        Ok(Produced::none())
    });
    let flag = finalized.clone();
    root.finally(move || {
        flag.store(true, Ordering::SeqCst);
    });

    // when
    let settler = root.clone();
    let settling_thread = thread::spawn(move || {
        settler.fulfill(42_i64);
    });
    settling_thread
        .join()
        .expect("settling thread panicked");

    // then
    assert_eq!(observed.lock().clone(), Some(Payload::Integer(42)));
    assert!(finalized.load(Ordering::SeqCst));
    assert_eq!(root.payload(), Some(Payload::Integer(42)));
}
