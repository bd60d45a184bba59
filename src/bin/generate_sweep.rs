//! Generate a synthetic C-V sweep text file for trying the profiler:
//!
//! ```text
//! cargo run --bin generate_sweep -- [PATH]
//! ```
//!
//! The default path encodes the metadata the profiler expects in file
//! names: `CV_DEMO1_100kHz.txt`. Output is deterministic.

use std::fs;

/// Minimal deterministic PRNG (splitmix64).
struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        SimpleRng { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e3779b97f4a7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        z ^ (z >> 31)
    }

    /// Uniform in [-1, 1).
    fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 52) as f64 * 2.0 - 1.0
    }
}

/// Depletion-style capacitance: C falls with reverse bias as the depleted
/// region widens.
fn capacitance(voltage: f64, c_zero: f64, built_in: f64) -> f64 {
    c_zero / (1.0 + (built_in - voltage) / built_in).sqrt()
}

fn main() -> std::io::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "CV_DEMO1_100kHz.txt".to_string());

    let mut rng = SimpleRng::new(7);
    let n_points = 50;
    let (v_start, v_end) = (-2.0, 0.5);
    let c_zero = 1.0e-9;
    let built_in = 0.7;

    let mut out = String::new();
    out.push_str("Synthetic C-V sweep\n");
    out.push_str("Voltage(V) C_Forward(F) C_Backward(F)\n");
    for i in 0..n_points {
        let v = v_start + (v_end - v_start) * i as f64 / (n_points - 1) as f64;
        let noise = 1.0 + rng.unit() * 5e-3;
        let c_forward = capacitance(v, c_zero, built_in) * noise;
        // Small hysteresis between scan directions.
        let c_backward = capacitance(v - 0.05, c_zero, built_in) * noise;
        out.push_str(&format!("{v:.4e} {c_forward:.6e} {c_backward:.6e}\n"));
    }

    fs::write(&path, out)?;
    println!("wrote {path}");
    Ok(())
}
