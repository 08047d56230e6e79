//! Integer-only CNN inference kernels.
//!
//! Quantized operators (5×5 convolution, 2×2 max-pooling, dense) on 8-bit
//! activations and 8-bit weights, with a fixed-point shift-7 requantization
//! step that reproduces the arithmetic of the integer hardware accelerator
//! the model was exported for.
//!
//! The crate is `no_std` (core only, no heap) so the kernels can be linked
//! into a bare-metal image. The fixed MNIST model and the host benchmark
//! harness live in the `mnist-bench` crate.

#![cfg_attr(not(test), no_std)]

pub mod bench;
pub mod kernels;
pub mod quant;
