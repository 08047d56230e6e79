//! Fixed MNIST classifier: two conv+pool stages and a dense head.
//!
//! Integer-only pipeline over the `zynq_ml` kernels. The topology and
//! every tensor dimension are compile-time constants; weights, biases and
//! the benchmark input image are baked in from `weights.bin` (layout
//! below). Each run fully overwrites its stage buffers, so repeated runs
//! on the same input produce bit-identical logits.

use zynq_ml::kernels::{conv5x5, dense, max_pool2x2};

// ---------------------------------------------------------------------------
// Topology
// ---------------------------------------------------------------------------

/// Operator kind for one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Conv5x5,
    MaxPool2x2,
    Dense,
}

/// One stage of the fixed pipeline: op kind plus its input geometry.
/// For `Dense`, `w` holds the flattened input length.
#[derive(Debug, Clone, Copy)]
pub struct LayerDesc {
    pub op: OpKind,
    pub h: usize,
    pub w: usize,
    pub cin: usize,
    pub cout: usize,
}

/// The network, input to output. The dense stage consumes the pool2
/// tensor in its existing flat channel-last order (no reshuffle).
pub const LAYERS: [LayerDesc; 5] = [
    LayerDesc { op: OpKind::Conv5x5, h: 28, w: 28, cin: 1, cout: 3 },
    LayerDesc { op: OpKind::MaxPool2x2, h: 24, w: 24, cin: 3, cout: 3 },
    LayerDesc { op: OpKind::Conv5x5, h: 12, w: 12, cin: 3, cout: 3 },
    LayerDesc { op: OpKind::MaxPool2x2, h: 8, w: 8, cin: 3, cout: 3 },
    LayerDesc { op: OpKind::Dense, h: 1, w: 48, cin: 1, cout: 10 },
];

/// Input image length (28×28, single channel).
pub const IMG_LEN: usize = 28 * 28;
/// Number of output classes.
pub const NUM_CLASSES: usize = 10;

const C1_LEN: usize = 24 * 24 * 3;
const P1_LEN: usize = 12 * 12 * 3;
const C2_LEN: usize = 8 * 8 * 3;
const P2_LEN: usize = 4 * 4 * 3;
/// The dense input is pool2 read flat, channel-last.
const FC_IN: usize = P2_LEN;

pub const NUM_OPS: usize = 5;
pub const OP_NAMES: [&str; NUM_OPS] =
    ["conv5x5", "max_pool2x2", "conv5x5", "max_pool2x2", "dense"];

// ---------------------------------------------------------------------------
// Inference
// ---------------------------------------------------------------------------

/// Run the fixed pipeline on one image.
pub fn forward(input: &[u8; IMG_LEN]) -> [i32; NUM_CLASSES] {
    let mut c1 = [0u8; C1_LEN];
    let mut p1 = [0u8; P1_LEN];
    let mut c2 = [0u8; C2_LEN];
    let mut p2 = [0u8; P2_LEN];
    let mut logits = [0i32; NUM_CLASSES];

    conv5x5(input, w1(), &mut c1, 28, 28, 1, 3);
    max_pool2x2(&c1, &mut p1, 24, 24, 3);
    conv5x5(&p1, w2(), &mut c2, 12, 12, 3, 3);
    max_pool2x2(&c2, &mut p2, 8, 8, 3);
    // p2 already is the dense input vector: flat [4,4,3], channel-last
    dense(&p2, wd(), bd(), &mut logits, FC_IN, NUM_CLASSES);

    logits
}

/// Instrumented inference: accumulates per-op tick deltas into `op_ticks`.
pub fn forward_timed(
    input: &[u8; IMG_LEN],
    op_ticks: &mut [u64; NUM_OPS],
    get_tick: fn() -> u64,
) -> [i32; NUM_CLASSES] {
    let mut c1 = [0u8; C1_LEN];
    let mut p1 = [0u8; P1_LEN];
    let mut c2 = [0u8; C2_LEN];
    let mut p2 = [0u8; P2_LEN];
    let mut logits = [0i32; NUM_CLASSES];

    let t0 = get_tick();
    conv5x5(input, w1(), &mut c1, 28, 28, 1, 3);
    op_ticks[0] += get_tick() - t0;

    let t0 = get_tick();
    max_pool2x2(&c1, &mut p1, 24, 24, 3);
    op_ticks[1] += get_tick() - t0;

    let t0 = get_tick();
    conv5x5(&p1, w2(), &mut c2, 12, 12, 3, 3);
    op_ticks[2] += get_tick() - t0;

    let t0 = get_tick();
    max_pool2x2(&c2, &mut p2, 8, 8, 3);
    op_ticks[3] += get_tick() - t0;

    let t0 = get_tick();
    dense(&p2, wd(), bd(), &mut logits, FC_IN, NUM_CLASSES);
    op_ticks[4] += get_tick() - t0;

    logits
}

/// Run the fixed pipeline once on the embedded benchmark image.
pub fn run_inference_once() -> [i32; NUM_CLASSES] {
    forward(img_in())
}

// ---------------------------------------------------------------------------
// Constant data
// ---------------------------------------------------------------------------

// weights.bin layout (byte offsets):
//   img_in  u8[784]   @ 0
//   w1      i8[75]    @ 784    (5,5,1,3)
//   w2      i8[225]   @ 859    (5,5,3,3)
//   wd      i8[480]   @ 1084   (48,10)
//   bd      i32[10]   @ 1564   little-endian
const IMG_OFFSET: usize = 0;
const W1_OFFSET: usize = IMG_OFFSET + IMG_LEN;
const W1_LEN: usize = 5 * 5 * 1 * 3;
const W2_OFFSET: usize = W1_OFFSET + W1_LEN;
const W2_LEN: usize = 5 * 5 * 3 * 3;
const WD_OFFSET: usize = W2_OFFSET + W2_LEN;
const WD_LEN: usize = FC_IN * NUM_CLASSES;
const BD_OFFSET: usize = WD_OFFSET + WD_LEN;
const BD_LEN: usize = NUM_CLASSES;
const BLOB_LEN: usize = BD_OFFSET + 4 * BD_LEN;

// the i32 view below requires a 4-byte-aligned bias region
const _: () = assert!(BD_OFFSET % 4 == 0);

#[repr(align(4))]
struct AlignedBytes<const N: usize>([u8; N]);

static TENSOR_DATA_BYTES: AlignedBytes<BLOB_LEN> = AlignedBytes(*include_bytes!("weights.bin"));

/// The embedded 28×28 benchmark input image.
pub fn img_in() -> &'static [u8; IMG_LEN] {
    // Infallible: a compile-time-constant range of the blob.
    unsafe { &*(TENSOR_DATA_BYTES.0.as_ptr().add(IMG_OFFSET) as *const [u8; IMG_LEN]) }
}

fn i8_view(offset: usize, len: usize) -> &'static [i8] {
    unsafe {
        core::slice::from_raw_parts(TENSOR_DATA_BYTES.0.as_ptr().add(offset) as *const i8, len)
    }
}

fn w1() -> &'static [i8] {
    i8_view(W1_OFFSET, W1_LEN)
}

fn w2() -> &'static [i8] {
    i8_view(W2_OFFSET, W2_LEN)
}

fn wd() -> &'static [i8] {
    i8_view(WD_OFFSET, WD_LEN)
}

fn bd() -> &'static [i32] {
    // BD_OFFSET is 4-byte aligned (checked above) and the blob wrapper is
    // #[repr(align(4))]; values are little-endian, as exported.
    unsafe {
        core::slice::from_raw_parts(
            TENSOR_DATA_BYTES.0.as_ptr().add(BD_OFFSET) as *const i32,
            BD_LEN,
        )
    }
}
