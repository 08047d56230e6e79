//! Quantized CNN operators - correct, portable reference implementations.
//!
//! All activation tensors are flat `u8` slices in row-major, channel-last
//! order: element (r, c, ch) lives at `(r*W + c)*C + ch`, with no padding
//! and no stride gaps. Weights are flat `i8`, biases `i32`. Accumulation
//! is `i32` throughout; only the convolution output is requantized.
//!
//! Shape arguments are preconditions. Every kernel asserts that each slice
//! length matches its declared shape exactly, so a mismatched buffer
//! panics instead of reading out of bounds.

use crate::quant::requant_shift7;

/// Convolution kernel side length.
const CONV_K: usize = 5;

/// 5×5 convolution, stride 1, no padding, with shift-7 requantization.
///
/// - `input`:   [H, W, Cin] u8 activations
/// - `weights`: [5, 5, Cin, Cout] i8, element (ki, kj, cin, cout) at
///   `(ki*5*Cin*Cout) + (kj*Cin*Cout) + (cin*Cout) + cout`
/// - `output`:  [H-4, W-4, Cout] u8 activations
///
/// Each output element is `requant_shift7` of the i32 sum over the 5×5
/// window and all input channels. With Cin ≤ 3 the accumulator peaks at
/// 5*5*3*255*127 ≈ 2.43M, well inside i32; larger channel counts need the
/// bound re-derived.
///
/// # Panics
///
/// If `h` or `w` is smaller than 5, or any slice length does not match
/// its shape arguments.
pub fn conv5x5(
    input: &[u8],
    weights: &[i8],
    output: &mut [u8],
    h: usize,
    w: usize,
    cin: usize,
    cout: usize,
) {
    assert!(h >= CONV_K && w >= CONV_K, "conv5x5: input below 5x5");
    let h_out = h - (CONV_K - 1);
    let w_out = w - (CONV_K - 1);
    assert_eq!(input.len(), h * w * cin, "conv5x5: input len != H*W*Cin");
    assert_eq!(
        weights.len(),
        CONV_K * CONV_K * cin * cout,
        "conv5x5: weight len != 5*5*Cin*Cout"
    );
    assert_eq!(
        output.len(),
        h_out * w_out * cout,
        "conv5x5: output len != (H-4)*(W-4)*Cout"
    );

    for r in 0..h_out {
        for c in 0..w_out {
            for k in 0..cout {
                let mut acc: i32 = 0;
                for i in 0..CONV_K {
                    for j in 0..CONV_K {
                        for ch in 0..cin {
                            let in_idx = ((r + i) * w + (c + j)) * cin + ch;
                            let w_idx =
                                (i * CONV_K * cin * cout) + (j * cin * cout) + (ch * cout) + k;
                            acc += i32::from(input[in_idx]) * i32::from(weights[w_idx]);
                        }
                    }
                }
                output[(r * w_out + c) * cout + k] = requant_shift7(acc);
            }
        }
    }
}

/// 2×2 max-pooling, stride 2, per channel.
///
/// - `input`:  [H, W, C] u8 activations
/// - `output`: [H/2, W/2, C] u8 activations (truncating division)
///
/// The running maximum starts at 0, a valid floor for unsigned
/// activations. If `h` or `w` is odd the trailing row/column is ignored;
/// the fixed topology only ever pools even dimensions.
///
/// # Panics
///
/// If a slice length does not match its shape arguments.
pub fn max_pool2x2(input: &[u8], output: &mut [u8], h: usize, w: usize, c: usize) {
    let h_out = h / 2;
    let w_out = w / 2;
    assert_eq!(input.len(), h * w * c, "max_pool2x2: input len != H*W*C");
    assert_eq!(
        output.len(),
        h_out * w_out * c,
        "max_pool2x2: output len != (H/2)*(W/2)*C"
    );

    for r in 0..h_out {
        for col in 0..w_out {
            for k in 0..c {
                let mut max_val = 0u8;
                for i in 0..2 {
                    for j in 0..2 {
                        let v = input[((r * 2 + i) * w + (col * 2 + j)) * c + k];
                        if v > max_val {
                            max_val = v;
                        }
                    }
                }
                output[(r * w_out + col) * c + k] = max_val;
            }
        }
    }
}

/// Dense (fully-connected) layer over a flattened activation vector.
///
/// - `input`:   [in_size] u8, the previous tensor read in its flat
///   channel-last order
/// - `weights`: [in_size, out_size] i8, element (i, o) at `i*out_size + o`
/// - `bias`:    [out_size] i32, added after accumulation
/// - `output`:  [out_size] i32 logits
///
/// No requantization: the output keeps full i32 precision.
///
/// # Panics
///
/// If a slice length does not match `in_size`/`out_size`.
pub fn dense(
    input: &[u8],
    weights: &[i8],
    bias: &[i32],
    output: &mut [i32],
    in_size: usize,
    out_size: usize,
) {
    assert_eq!(input.len(), in_size, "dense: input len != in_size");
    assert_eq!(
        weights.len(),
        in_size * out_size,
        "dense: weight len != in_size*out_size"
    );
    assert_eq!(bias.len(), out_size, "dense: bias len != out_size");
    assert_eq!(output.len(), out_size, "dense: output len != out_size");

    for o in 0..out_size {
        let mut acc: i32 = 0;
        for i in 0..in_size {
            acc += i32::from(input[i]) * i32::from(weights[i * out_size + o]);
        }
        output[o] = acc + bias[o];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conv_zero_weights_gives_zero_output() {
        // 6x6x1 input, 1 output channel -> 2x2 output
        let input = [200u8; 36];
        let weights = [0i8; 25];
        let mut output = [0xAAu8; 4];
        conv5x5(&input, &weights, &mut output, 6, 6, 1, 1);
        assert_eq!(output, [0u8; 4]);
    }

    #[test]
    fn conv_uniform_window_known_value() {
        // acc = 25 * 64 = 1600, requant -> (1600 + 64) >> 7 = 13
        let input = [1u8; 25];
        let weights = [64i8; 25];
        let mut output = [0u8; 1];
        conv5x5(&input, &weights, &mut output, 5, 5, 1, 1);
        assert_eq!(output[0], 13);
    }

    #[test]
    fn conv_saturates_at_clamp_boundaries() {
        let input = [255u8; 25];
        let mut output = [0u8; 1];
        // acc = 25 * 255 * 127 = 809_625, far past the top of the u8 range
        conv5x5(&input, &[127i8; 25], &mut output, 5, 5, 1, 1);
        assert_eq!(output[0], 255);
        // all-negative weights clamp at zero
        conv5x5(&input, &[-128i8; 25], &mut output, 5, 5, 1, 1);
        assert_eq!(output[0], 0);
    }

    #[test]
    fn conv_weight_layout_is_output_channel_minor() {
        // Single active pixel at (0,0): the two output channels read
        // adjacent weight slots (cout varies fastest).
        let mut input = [0u8; 25];
        input[0] = 128;
        let mut weights = [0i8; 50];
        weights[0] = 10; // (ki=0, kj=0, cin=0, cout=0)
        weights[1] = 20; // (ki=0, kj=0, cin=0, cout=1)
        let mut output = [0u8; 2];
        conv5x5(&input, &weights, &mut output, 5, 5, 1, 2);
        assert_eq!(output, [10, 20]);
    }

    #[test]
    fn conv_output_shape_28x28x1_to_24x24x3() {
        let input = [7u8; 28 * 28];
        let weights = [1i8; 5 * 5 * 3];
        let mut output = [0u8; 24 * 24 * 3];
        conv5x5(&input, &weights, &mut output, 28, 28, 1, 3);
        // acc = 25 * 7 = 175 -> (175 + 64) >> 7 = 1, at every position
        assert!(output.iter().all(|&v| v == 1));
    }

    #[test]
    fn pool_takes_window_maximum() {
        let input = [10u8, 200, 5, 199];
        let mut output = [0u8; 1];
        max_pool2x2(&input, &mut output, 2, 2, 1);
        assert_eq!(output[0], 200);
    }

    #[test]
    fn pool_keeps_channels_separate() {
        // 2x2x2: channel 0 holds small values, channel 1 large ones
        let input = [1u8, 100, 2, 101, 3, 102, 4, 103];
        let mut output = [0u8; 2];
        max_pool2x2(&input, &mut output, 2, 2, 2);
        assert_eq!(output, [4, 103]);
    }

    #[test]
    fn pool_24x24x3_yields_12x12x3() {
        let mut input = [0u8; 24 * 24 * 3];
        input[..3].copy_from_slice(&[9, 8, 7]);
        let mut output = [1u8; 12 * 12 * 3];
        max_pool2x2(&input, &mut output, 24, 24, 3);
        assert_eq!(&output[..3], &[9, 8, 7]);
        assert!(output[3..].iter().all(|&v| v == 0));
    }

    #[test]
    fn pool_ignores_odd_trailing_row_and_column() {
        // 3x3 input: only the top-left 2x2 window contributes
        let input = [1u8, 2, 90, 3, 4, 91, 92, 93, 94];
        let mut output = [0u8; 1];
        max_pool2x2(&input, &mut output, 3, 3, 1);
        assert_eq!(output[0], 4);
    }

    #[test]
    fn dense_known_value() {
        // out[0] = 10*3 + 5*(-3) + 7 = 22
        let input = [10u8, 5];
        let weights = [3i8, -3];
        let bias = [7i32];
        let mut output = [0i32; 1];
        dense(&input, &weights, &bias, &mut output, 2, 1);
        assert_eq!(output[0], 22);
    }

    #[test]
    fn dense_output_stays_full_precision() {
        // 48*255*127 = 1_554_480 must come through unquantized
        let input = [255u8; 48];
        let weights = [127i8; 48];
        let bias = [-30_000i32];
        let mut output = [0i32; 1];
        dense(&input, &weights, &bias, &mut output, 48, 1);
        assert_eq!(output[0], 48 * 255 * 127 - 30_000);
    }

    #[test]
    fn dense_weight_layout_is_output_minor() {
        // weight index i*Out + o: input 0 feeds weights [1, 2]
        let input = [128u8, 0];
        let weights = [1i8, 2, 3, 4];
        let bias = [0i32, 0];
        let mut output = [0i32; 2];
        dense(&input, &weights, &bias, &mut output, 2, 2);
        assert_eq!(output, [128, 256]);
    }

    #[test]
    #[should_panic(expected = "conv5x5: input len")]
    fn conv_rejects_short_input() {
        let input = [0u8; 10];
        let weights = [0i8; 25];
        let mut output = [0u8; 4];
        conv5x5(&input, &weights, &mut output, 6, 6, 1, 1);
    }

    #[test]
    #[should_panic(expected = "max_pool2x2: output len")]
    fn pool_rejects_short_output() {
        let input = [0u8; 16];
        let mut output = [0u8; 2];
        max_pool2x2(&input, &mut output, 4, 4, 1);
    }

    #[test]
    #[should_panic(expected = "dense: weight len")]
    fn dense_rejects_weight_size_mismatch() {
        let input = [0u8; 4];
        let weights = [0i8; 7];
        let bias = [0i32; 2];
        let mut output = [0i32; 2];
        dense(&input, &weights, &bias, &mut output, 4, 2);
    }
}
