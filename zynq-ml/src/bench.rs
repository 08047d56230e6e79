//! Benchmark helpers for the inference pipeline.
//!
//! Provides [`argmax`] to turn logits into a class index and
//! [`format_results`] to serialize a benchmark run as self-describing
//! JSON. The JSON includes op names and timing so host-side tooling needs
//! no knowledge of the model. Formatting goes through [`JsonBuf`], a
//! fixed-size stack buffer, so the crate stays heap-free.

/// Benchmark results ready for serialization.
pub struct BenchmarkResult<'a> {
    /// Number of timed pipeline runs (warm-up excluded).
    pub loop_count: usize,
    /// Ticks per second of the harness tick source.
    pub tick_resolution: u64,
    /// Wall-clock ticks for the whole timed loop.
    pub total_ticks: u64,
    /// Per-op names, in pipeline order.
    pub op_names: &'a [&'a str],
    /// Per-op ticks accumulated across all runs.
    pub op_ticks: &'a [u64],
    /// Logits of the final run.
    pub logits: &'a [i32],
    /// Argmax of the logits.
    pub predicted: usize,
}

/// Index of the maximum element. Ties resolve to the earliest class.
pub fn argmax(logits: &[i32]) -> usize {
    let mut best = 0;
    for i in 1..logits.len() {
        if logits[i] > logits[best] {
            best = i;
        }
    }
    best
}

/// Format benchmark results as self-describing JSON.
pub fn format_results(r: &BenchmarkResult) -> JsonBuf {
    let total_us = if r.tick_resolution > 0 {
        (r.total_ticks * 1_000_000) / r.tick_resolution
    } else {
        0
    };
    let per_run_us = if r.loop_count > 0 {
        total_us / r.loop_count as u64
    } else {
        0
    };

    let mut j = JsonBuf::new();
    j.push_str("{\n");

    j.push_str("  \"model\": \"cnn_int8_shift7\",\n");

    j.push_str("  \"loop_count\": ");
    j.push_u64(r.loop_count as u64);
    j.push_str(",\n");

    j.push_str("  \"tick_resolution\": ");
    j.push_u64(r.tick_resolution);
    j.push_str(",\n");

    j.push_str("  \"total_ticks\": ");
    j.push_u64(r.total_ticks);
    j.push_str(",\n");

    j.push_str("  \"total_us\": ");
    j.push_u64(total_us);
    j.push_str(",\n");

    j.push_str("  \"per_run_us\": ");
    j.push_u64(per_run_us);
    j.push_str(",\n");

    j.push_str("  \"predicted\": ");
    j.push_u64(r.predicted as u64);
    j.push_str(",\n");

    j.push_str("  \"logits\": [");
    for (i, &v) in r.logits.iter().enumerate() {
        if i > 0 {
            j.push_str(", ");
        }
        j.push_i64(i64::from(v));
    }
    j.push_str("],\n");

    j.push_str("  \"ops\": [\n");
    let num_ops = r.op_names.len().min(r.op_ticks.len());
    for i in 0..num_ops {
        let us = if r.tick_resolution > 0 {
            (r.op_ticks[i] * 1_000_000) / r.tick_resolution
        } else {
            0
        };
        j.push_str("    { \"name\": \"");
        j.push_str(r.op_names[i]);
        j.push_str("\", \"ticks\": ");
        j.push_u64(r.op_ticks[i]);
        j.push_str(", \"us\": ");
        j.push_u64(us);
        j.push_str(" }");
        if i + 1 < num_ops {
            j.push_byte(b',');
        }
        j.push_byte(b'\n');
    }
    j.push_str("  ]\n");

    j.push_str("}\n");
    j
}

// ---------------------------------------------------------------------------
// Minimal no_std JSON buffer
// ---------------------------------------------------------------------------

/// Fixed-size JSON buffer. No heap allocation; overflow truncates.
pub struct JsonBuf {
    buf: [u8; 2048],
    pos: usize,
}

impl JsonBuf {
    fn new() -> Self {
        JsonBuf {
            buf: [0u8; 2048],
            pos: 0,
        }
    }

    /// The formatted JSON bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    fn push_byte(&mut self, b: u8) {
        if self.pos < self.buf.len() {
            self.buf[self.pos] = b;
            self.pos += 1;
        }
    }

    fn push_str(&mut self, s: &str) {
        for &b in s.as_bytes() {
            self.push_byte(b);
        }
    }

    fn push_u64(&mut self, mut val: u64) {
        if val == 0 {
            self.push_byte(b'0');
            return;
        }
        let start = self.pos;
        while val > 0 {
            self.push_byte(b'0' + (val % 10) as u8);
            val /= 10;
        }
        // digits came out backwards
        let end = self.pos;
        let mut i = start;
        let mut j = end - 1;
        while i < j {
            self.buf.swap(i, j);
            i += 1;
            j -= 1;
        }
    }

    fn push_i64(&mut self, val: i64) {
        if val < 0 {
            self.push_byte(b'-');
            self.push_u64(val.unsigned_abs());
        } else {
            self.push_u64(val as u64);
        }
    }
}
