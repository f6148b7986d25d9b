#![forbid(unsafe_code)]

//! Property-based invariant tests for the event loop.
//!
//! 1. Timers fire ordered by due time, ties broken by arming order.
//! 2. Cleared timers never fire; every other timer fires exactly once.
//! 3. An interval fires `floor(span / period)` times over a lab span.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use vireo_core::scheduler::Scheduler;
use web_time::Duration;

// ── Strategies ──────────────────────────────────────────────────────────

/// Timer delays in milliseconds, with plenty of collisions.
fn delays() -> impl Strategy<Value = Vec<u64>> {
    proptest::collection::vec(0u64..20, 0..60)
}

proptest! {
    #[test]
    fn fire_order_is_due_then_arming(delays in delays()) {
        let (scheduler, _clock) = Scheduler::lab();
        let fired = Rc::new(RefCell::new(Vec::new()));
        for (idx, &delay) in delays.iter().enumerate() {
            let fired = Rc::clone(&fired);
            scheduler.set_timeout(Duration::from_millis(delay), move || {
                fired.borrow_mut().push(idx);
            });
        }

        scheduler.run_for(Duration::from_millis(20));

        let mut expected: Vec<usize> = (0..delays.len()).collect();
        expected.sort_by_key(|&idx| (delays[idx], idx));
        prop_assert_eq!(&*fired.borrow(), &expected);
        prop_assert_eq!(scheduler.pending_timers(), 0);
    }

    #[test]
    fn cleared_timers_never_fire(
        delays in delays(),
        clear_mask in proptest::collection::vec(any::<bool>(), 60),
    ) {
        let (scheduler, _clock) = Scheduler::lab();
        let fired = Rc::new(RefCell::new(Vec::new()));
        let mut ids = Vec::new();
        for (idx, &delay) in delays.iter().enumerate() {
            let fired = Rc::clone(&fired);
            ids.push(scheduler.set_timeout(Duration::from_millis(delay), move || {
                fired.borrow_mut().push(idx);
            }));
        }
        for (idx, id) in ids.iter().enumerate() {
            if clear_mask[idx] {
                prop_assert!(scheduler.clear_timer(*id));
            }
        }

        scheduler.run_for(Duration::from_millis(25));

        let mut got = fired.borrow().clone();
        got.sort_unstable();
        let expected: Vec<usize> = (0..delays.len()).filter(|&idx| !clear_mask[idx]).collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn interval_count_matches_span(period in 1u64..50, span in 0u64..500) {
        let (scheduler, _clock) = Scheduler::lab();
        let hits = Rc::new(RefCell::new(0u64));
        let h = Rc::clone(&hits);
        scheduler.set_interval(Duration::from_millis(period), move || *h.borrow_mut() += 1);

        scheduler.run_for(Duration::from_millis(span));
        prop_assert_eq!(*hits.borrow(), span / period);
    }
}
