use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::policy::{BackoffPolicy, BinaryExponentialBackoff, MAX_BACKOFF};

#[test]
fn backoff_window_doubles_and_caps() {
    let p = BinaryExponentialBackoff::default();
    assert_eq!(p.window(0), 1);
    assert_eq!(p.window(1), 2);
    assert_eq!(p.window(2), 4);
    assert_eq!(p.window(3), MAX_BACKOFF);
    assert_eq!(p.window(10), MAX_BACKOFF);
    // 移位溢出也不能越过上限
    assert_eq!(p.window(64), MAX_BACKOFF);
}

#[test]
fn backoff_draws_stay_within_window() {
    let p = BinaryExponentialBackoff::default();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for k in 1..=12u32 {
        let hi = p.window(k);
        let mut seen_hi = false;
        for _ in 0..2_000 {
            let b = p.backoff_slots(k, &mut rng);
            assert!((1..=hi).contains(&b), "k={k} drew {b} outside [1, {hi}]");
            seen_hi |= b == hi;
        }
        assert!(seen_hi, "k={k} never drew the top of the window");
    }
}

#[test]
fn backoff_after_first_collision_is_one_or_two() {
    let p = BinaryExponentialBackoff::default();
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    for _ in 0..1_000 {
        let b = p.backoff_slots(1, &mut rng);
        assert!(b == 1 || b == 2);
    }
}
