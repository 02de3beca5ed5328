use assert_matches::assert_matches;
use fingertap::{score, ScoreError};

const TARGET: [u8; 5] = [4, 1, 3, 2, 4];

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn scan_accounts_for_every_keystroke() {
    // Three clean repeats with stray taps between them
    let stream = [4, 1, 3, 2, 4, 2, 4, 1, 3, 2, 4, 1, 1, 4, 1, 3, 2, 4];
    let result = score(&stream, &TARGET).unwrap();
    assert_eq!(result.speed, 3.0);
    assert_eq!(result.errors, 2);
    assert!(close(result.accuracy, 1.0 - 2.0 / 3.0));
}

#[test]
fn partial_repeat_at_end_earns_fractional_credit() {
    let stream = [4, 1, 3, 2, 4, 4, 1, 3, 2, 4, 4, 1, 3];
    let result = score(&stream, &TARGET).unwrap();
    assert!(close(result.speed, 2.6));
    assert_eq!(result.errors, 0);
    assert_eq!(result.accuracy, 1.0);
}

#[test]
fn unaligned_tail_counts_as_one_error() {
    let stream = [4, 1, 3, 2, 4, 1, 3, 2];
    let result = score(&stream, &TARGET).unwrap();
    assert_eq!(result.speed, 1.0);
    assert_eq!(result.errors, 1);
}

#[test]
fn long_garbage_run_counts_per_five() {
    // 15 keys that never contain the target: three episodes of five
    let stream = [1u8; 15];
    let result = score(&stream, &TARGET).unwrap();
    assert_eq!(result.speed, 0.0);
    assert_eq!(result.errors, 3);
    assert!(result.accuracy.is_nan());
    assert!(result.never_matched());
}

#[test]
fn works_over_any_comparable_alphabet() {
    let target = ["index", "middle", "ring"];
    let stream = ["index", "middle", "ring", "pinky", "index", "middle", "ring", "index"];
    let result = score(&stream, &target).unwrap();
    assert!(close(result.speed, 2.0 + 1.0 / 3.0));
    assert_eq!(result.errors, 1);
}

#[test]
fn empty_target_is_a_precondition_violation() {
    let empty: [u8; 0] = [];
    assert_matches!(score(&[1, 2], &empty), Err(ScoreError::EmptyTarget));
    assert_matches!(score(&empty, &empty), Err(ScoreError::EmptyTarget));
}

#[test]
fn empty_stream_is_not_an_error() {
    let result = score(&[], &TARGET).unwrap();
    assert_eq!(result.speed, 0.0);
    assert_eq!(result.errors, 0);
    assert!(result.accuracy.is_nan());
}
