//! Fuzz target comparing the app against the reference model
//!
//! # Strategy
//!
//! - Arbitrary sequences of opens, closes, list toggles, deliveries and
//!   auth changes over a small fixed set of peers
//! - Every operation is applied to both the model and the real app wired to
//!   the simulated backend
//!
//! # Invariants
//!
//! - Both worlds return the same result for every operation
//! - Observable state (tabs, unread, inbox) matches after every operation
//! - The standard invariant registry holds after every operation

#![no_main]

use huddle_app::AppConfig;
use huddle_harness::{InvariantRegistry, ModelWorld, Operation, SimEnv, SimWorld};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|ops: Vec<Operation>| {
    let mut model = ModelWorld::new();
    let mut real = SimWorld::new(SimEnv::default(), AppConfig::default());
    let invariants = InvariantRegistry::standard();

    for (step, op) in ops.iter().take(256).enumerate() {
        let expected = model.apply(op);
        let actual = real.apply(op);
        assert_eq!(actual, expected, "step {step}: result diverged on {op:?}");
        assert_eq!(
            real.observable_state(),
            model.observable_state(),
            "step {step}: state diverged after {op:?}"
        );
        invariants.assert_all(&real.snapshot(), &format!("step {step} after {op:?}"));
    }
});
