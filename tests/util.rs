/// Check that two floats differ by at most an absolute tolerance.
#[macro_export]
macro_rules! assert_floats_near_equal {
    ($expected:expr, $actual:expr, $tolerance:expr, $msg:expr) => {{
        let expected: f64 = $expected;
        let actual: f64 = $actual;
        let diff = (expected - actual).abs();
        assert!(
            diff <= $tolerance,
            "{}: expected {} but got {} (off by {})",
            $msg,
            expected,
            actual,
            diff
        );
    }};
}
