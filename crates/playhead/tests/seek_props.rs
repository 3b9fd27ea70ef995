//! Property tests for the playhead's clamp and de-duplication rules.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use proptest::prelude::*;
use reelsync_common::clock::ManualClock;
use reelsync_common::config::PlayheadConfig;
use reelsync_playhead::{PlayheadController, PlayheadObserver};

fn controller(duration: f64) -> (PlayheadController, Rc<RefCell<Vec<f64>>>) {
    let clock = Arc::new(ManualClock::new(0));
    let mut ctl = PlayheadController::new(PlayheadConfig::default(), clock).with_duration(duration);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    ctl.register_observer(
        "sink",
        PlayheadObserver::new().on_position_changed(move |t| {
            sink.borrow_mut().push(t);
            Ok(())
        }),
    );
    (ctl, seen)
}

proptest! {
    #[test]
    fn position_always_within_bounds(
        duration in 0.0f64..1_000.0,
        seeks in prop::collection::vec(-2_000.0f64..2_000.0, 1..40),
    ) {
        let (mut ctl, seen) = controller(duration);
        for t in seeks {
            ctl.seek_to(t, true);
            prop_assert!(ctl.current_time() >= 0.0);
            prop_assert!(ctl.current_time() <= duration);
        }
        for t in seen.borrow().iter() {
            prop_assert!(*t >= 0.0 && *t <= duration);
        }
    }

    #[test]
    fn repeated_seek_notifies_once(
        duration in 1.0f64..1_000.0,
        t in -100.0f64..1_100.0,
    ) {
        let (mut ctl, seen) = controller(duration);
        ctl.seek_to(t, true);
        let after_first = seen.borrow().len();
        prop_assert!(!ctl.seek_to(t, true));
        prop_assert_eq!(seen.borrow().len(), after_first);
    }

    #[test]
    fn sub_epsilon_moves_are_suppressed(
        t in 1.0f64..200.0,
        delta in -0.000_9f64..0.000_9,
    ) {
        let (mut ctl, seen) = controller(300.0);
        ctl.seek_to(t, true);
        prop_assert!(!ctl.seek_to(t + delta, true));
        prop_assert_eq!(seen.borrow().len(), 1);
    }
}
