//! Edge case tests for tally-engine
//!
//! These tests cover boundary conditions and the quantity invariants across
//! arbitrary sequences of operations.

use proptest::prelude::*;
use tally_engine::{
    Correction, Error, ErrorKind, Ledger, MovementKind, MovementRequest, NewItem, Quantity,
};

fn ledger_with_item(minimum: Option<Quantity>) -> Ledger {
    let mut ledger = Ledger::new();
    ledger
        .register(
            "item1",
            NewItem {
                name: "Widget".into(),
                unit: "pcs".into(),
                minimum,
            },
            1000,
        )
        .unwrap();
    ledger
}

fn quantity(ledger: &Ledger) -> Quantity {
    ledger.item("item1").unwrap().quantity
}

// ============================================================================
// Numeric Edge Cases
// ============================================================================

#[test]
fn inbound_near_max_saturates() {
    let mut ledger = ledger_with_item(None);
    ledger
        .apply(
            "item1",
            "op1",
            MovementRequest::new(MovementKind::Absolute, Quantity::MAX - 5),
            1000,
        )
        .unwrap();

    let outcome = ledger
        .apply(
            "item1",
            "op2",
            MovementRequest::new(MovementKind::Inbound, 100),
            2000,
        )
        .unwrap();

    assert_eq!(outcome.item.quantity, Quantity::MAX);
}

#[test]
fn outbound_of_max_magnitude_clamps() {
    let mut ledger = ledger_with_item(None);
    let outcome = ledger
        .apply(
            "item1",
            "op1",
            MovementRequest::new(MovementKind::Outbound, Quantity::MAX),
            1000,
        )
        .unwrap();

    assert_eq!(outcome.item.quantity, 0);
    assert_eq!(outcome.movement.magnitude, Quantity::MAX);
    assert!(!outcome.transition.is_change());
}

#[test]
fn absolute_zero_on_empty_item_does_not_alert() {
    let mut ledger = ledger_with_item(Some(5));
    let outcome = ledger
        .apply(
            "item1",
            "op1",
            MovementRequest::new(MovementKind::Absolute, 0),
            1000,
        )
        .unwrap();

    assert_eq!(outcome.item.quantity, 0);
    assert!(!outcome.crossed_minimum());
}

#[test]
fn minimum_zero_alerts_only_when_emptied() {
    let mut ledger = ledger_with_item(Some(0));
    ledger
        .apply(
            "item1",
            "op1",
            MovementRequest::new(MovementKind::Inbound, 2),
            1000,
        )
        .unwrap();

    let partial = ledger
        .apply(
            "item1",
            "op2",
            MovementRequest::new(MovementKind::Outbound, 1),
            2000,
        )
        .unwrap();
    assert!(!partial.crossed_minimum());

    let emptied = ledger
        .apply(
            "item1",
            "op3",
            MovementRequest::new(MovementKind::Outbound, 5),
            3000,
        )
        .unwrap();
    assert!(emptied.crossed_minimum());
}

#[test]
fn correction_to_same_magnitude_is_noop() {
    let mut ledger = ledger_with_item(Some(100));
    ledger
        .apply(
            "item1",
            "op1",
            MovementRequest::new(MovementKind::Inbound, 7),
            1000,
        )
        .unwrap();

    let outcome = ledger
        .correct("op1", Correction::new(7, Some("recount".into())), 2000)
        .unwrap();

    assert_eq!(outcome.item.quantity, 7);
    assert_eq!(outcome.movement.reason.as_deref(), Some("recount"));
    // Quantity did not move, so no alert even though 7 <= 100.
    assert!(!outcome.crossed_minimum());
}

#[test]
fn correction_after_clamp_uses_current_quantity() {
    let mut ledger = ledger_with_item(None);
    ledger
        .apply(
            "item1",
            "op1",
            MovementRequest::new(MovementKind::Inbound, 3),
            1000,
        )
        .unwrap();
    ledger
        .apply(
            "item1",
            "op2",
            MovementRequest::new(MovementKind::Outbound, 10),
            2000,
        )
        .unwrap();
    assert_eq!(quantity(&ledger), 0);

    // Shrinking the outbound from 10 to 4 returns 6 to whatever is on hand now.
    ledger
        .correct("op2", Correction::new(4, None), 3000)
        .unwrap();
    assert_eq!(quantity(&ledger), 6);
}

#[test]
fn errors_map_to_taxonomy() {
    let mut ledger = ledger_with_item(None);
    ledger
        .apply(
            "item1",
            "op1",
            MovementRequest::new(MovementKind::Absolute, 4),
            1000,
        )
        .unwrap();

    let invalid = ledger
        .apply(
            "item1",
            "op2",
            MovementRequest::new(MovementKind::Outbound, 0),
            2000,
        )
        .unwrap_err();
    assert_eq!(invalid.kind(), ErrorKind::InvalidInput);

    let missing = ledger.reverse("nope", 2000).unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);

    let forbidden = ledger.reverse("op1", 2000).unwrap_err();
    assert_eq!(forbidden, Error::AbsoluteMovementLocked("op1".into()));
    assert_eq!(forbidden.kind(), ErrorKind::Forbidden);
}

#[test]
fn unicode_reason() {
    let mut ledger = ledger_with_item(None);
    let outcome = ledger
        .apply(
            "item1",
            "op1",
            MovementRequest::new(MovementKind::Inbound, 1).with_reason("入庫 ✓"),
            1000,
        )
        .unwrap();
    assert_eq!(outcome.movement.reason.as_deref(), Some("入庫 ✓"));
}

// ============================================================================
// Property tests
// ============================================================================

#[derive(Debug, Clone)]
enum Step {
    Apply(MovementKind, Quantity),
    Correct(usize, Quantity),
    Reverse(usize),
}

fn arb_kind() -> impl Strategy<Value = MovementKind> {
    prop_oneof![
        Just(MovementKind::Inbound),
        Just(MovementKind::Outbound),
        Just(MovementKind::Absolute),
    ]
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (arb_kind(), 0i64..50).prop_map(|(k, m)| Step::Apply(k, m)),
        (0usize..20, 1i64..50).prop_map(|(i, m)| Step::Correct(i, m)),
        (0usize..20).prop_map(Step::Reverse),
    ]
}

proptest! {
    #[test]
    fn prop_quantity_never_negative(steps in prop::collection::vec(arb_step(), 1..60)) {
        let mut ledger = ledger_with_item(Some(10));
        let mut ids: Vec<String> = Vec::new();

        for (n, step) in steps.into_iter().enumerate() {
            let ts = 1000 + n as u64;
            match step {
                Step::Apply(kind, magnitude) => {
                    let id = format!("op{}", n);
                    if ledger
                        .apply("item1", id.clone(), MovementRequest::new(kind, magnitude), ts)
                        .is_ok()
                    {
                        ids.push(id);
                    }
                }
                Step::Correct(i, magnitude) => {
                    if let Some(id) = ids.get(i) {
                        let _ = ledger.correct(id, Correction::new(magnitude, None), ts);
                    }
                }
                Step::Reverse(i) => {
                    if let Some(id) = ids.get(i).cloned() {
                        if ledger.reverse(&id, ts).is_ok() {
                            ids.retain(|x| x != &id);
                        }
                    }
                }
            }
            prop_assert!(quantity(&ledger) >= 0);
        }
    }

    #[test]
    fn prop_inbound_then_outbound_restores(start in 0i64..1000, n in 1i64..1000) {
        prop_assume!(start >= n);
        let mut ledger = ledger_with_item(None);
        ledger
            .apply("item1", "seed", MovementRequest::new(MovementKind::Absolute, start), 1000)
            .unwrap();

        ledger
            .apply("item1", "in", MovementRequest::new(MovementKind::Inbound, n), 2000)
            .unwrap();
        ledger
            .apply("item1", "out", MovementRequest::new(MovementKind::Outbound, n), 3000)
            .unwrap();

        prop_assert_eq!(quantity(&ledger), start);
    }

    #[test]
    fn prop_absolute_sets_exact(prior in 0i64..1000, target in 0i64..1000) {
        let mut ledger = ledger_with_item(None);
        ledger
            .apply("item1", "seed", MovementRequest::new(MovementKind::Inbound, prior.max(1)), 1000)
            .unwrap();
        ledger
            .apply("item1", "count", MovementRequest::new(MovementKind::Absolute, target), 2000)
            .unwrap();

        prop_assert_eq!(quantity(&ledger), target);
        prop_assert!(ledger.correct("count", Correction::new(1, None), 3000).is_err());
        prop_assert!(ledger.reverse("count", 3000).is_err());
    }

    #[test]
    fn prop_reverse_undoes_unclamped_apply(start in 0i64..1000, kind in arb_kind(), n in 1i64..1000) {
        prop_assume!(kind != MovementKind::Absolute);
        prop_assume!(kind == MovementKind::Inbound || start >= n);
        let mut ledger = ledger_with_item(None);
        ledger
            .apply("item1", "seed", MovementRequest::new(MovementKind::Absolute, start), 1000)
            .unwrap();
        ledger
            .apply("item1", "mv", MovementRequest::new(kind, n), 2000)
            .unwrap();
        ledger.reverse("mv", 3000).unwrap();

        prop_assert_eq!(quantity(&ledger), start);
    }
}
