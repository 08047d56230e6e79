//! Property tests for the requantization primitives and the kernels'
//! zero-weight behavior.

use proptest::prelude::*;
use zynq_ml::kernels::conv5x5;
use zynq_ml::quant::{clamp_u8, requant_shift7};

// Accumulator range with headroom over the worst case the kernels can
// produce (5*5*3*255*127 ≈ 2.43M).
const ACC_RANGE: i32 = 10_000_000;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// requant_shift7 equals the rounding-shift reference for any
    /// reachable accumulator, and u8 output keeps it in [0, 255].
    #[test]
    fn requant_matches_rounding_shift(acc in -ACC_RANGE..=ACC_RANGE) {
        prop_assert_eq!(requant_shift7(acc), clamp_u8((acc + 64) >> 7));
    }

    /// A larger accumulator never produces a smaller activation.
    #[test]
    fn requant_is_monotonic(acc in -ACC_RANGE..ACC_RANGE) {
        prop_assert!(requant_shift7(acc) <= requant_shift7(acc + 1));
    }

    /// Zero weights wipe the output regardless of input contents.
    #[test]
    fn conv_zero_weights_is_zero(img in proptest::collection::vec(any::<u8>(), 36)) {
        let weights = [0i8; 25];
        let mut out = [0xFFu8; 4];
        conv5x5(&img, &weights, &mut out, 6, 6, 1, 1);
        prop_assert_eq!(out, [0u8; 4]);
    }
}
