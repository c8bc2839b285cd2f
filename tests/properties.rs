use std::collections::HashSet;

use gmat_cat::{
    estimate_theta, initialize_question_bank, item_information, neg_log_likelihood,
    probability_correct, simulate_cat_exam, CorrectnessSchedule, ResponseRecord, ThetaBounds,
};
use proptest::prelude::*;

fn response_strategy() -> impl Strategy<Value = ResponseRecord> {
    (0.2f64..1.5, -2.0f64..2.0, 0.0f64..0.3, any::<bool>())
        .prop_map(|(a, b, c, correct)| ResponseRecord::new(a, b, c, correct).unwrap())
}

proptest! {
    /// Property: the 3PL probability is a probability
    #[test]
    fn prop_probability_in_unit_interval(
        theta in -50.0f64..50.0,
        a in 0.01f64..5.0,
        b in -10.0f64..10.0,
        c in 0.0f64..1.0,
    ) {
        let p = probability_correct(theta, a, b, c).unwrap();
        prop_assert!((0.0..=1.0).contains(&p));
        prop_assert!(p >= c - 1e-12);
    }

    /// Property: information is non-negative and vanishes for degenerate guessing
    #[test]
    fn prop_information_non_negative(
        theta in -6.0f64..6.0,
        a in 0.01f64..5.0,
        b in -4.0f64..4.0,
        c in 0.0f64..0.99,
    ) {
        prop_assert!(item_information(theta, a, b, c).unwrap() >= 0.0);
        prop_assert_eq!(item_information(theta, a, b, 1.0).unwrap(), 0.0);
    }

    /// Property: the likelihood sum ignores history order
    #[test]
    fn prop_likelihood_order_independent(
        history in prop::collection::vec(response_strategy(), 1..30),
        theta in -4.0f64..4.0,
        rotation in 0usize..30,
    ) {
        let mut permuted = history.clone();
        let len = permuted.len();
        permuted.rotate_left(rotation % len);
        permuted.reverse();
        let original = neg_log_likelihood(theta, &history).unwrap();
        let shuffled = neg_log_likelihood(theta, &permuted).unwrap();
        prop_assert!((original - shuffled).abs() <= 1e-9 * original.abs().max(1.0));
    }

    /// Property: estimates never leave the configured bounds
    #[test]
    fn prop_estimate_within_bounds(
        history in prop::collection::vec(response_strategy(), 0..15),
        initial in -3.0f64..3.0,
    ) {
        let bounds = ThetaBounds::default();
        let theta = estimate_theta(&history, initial, bounds);
        prop_assert!(bounds.contains(theta));
    }

    /// Property: a simulated exam never administers the same item twice
    #[test]
    fn prop_trace_ids_unique(
        seed in 0u64..1000,
        total in 1usize..25,
        wrong in prop::collection::btree_set(1usize..25, 0..10),
    ) {
        let bank = initialize_question_bank(40, seed).unwrap();
        let schedule = CorrectnessSchedule::from_wrong_positions(wrong.iter().copied()).unwrap();
        let trace =
            simulate_cat_exam(&bank, total, 0.0, &schedule, ThetaBounds::default()).unwrap();

        prop_assert_eq!(trace.len(), total);
        let ids: HashSet<_> = trace.entries().iter().map(|e| e.item_id).collect();
        prop_assert_eq!(ids.len(), trace.len());
        for entry in trace.entries() {
            prop_assert_eq!(entry.answered_correctly, !wrong.contains(&entry.question_number));
        }
    }
}
