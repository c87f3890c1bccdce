use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::model::{Component, ComponentKind, ComponentTable, Point3};

/// File name used by [`write_example_data`].
pub const SAMPLE_FILE_NAME: &str = "sample_capacitor_data.csv";

/// Ten capacitors spread over two z-levels, values from 3e-3 to 2.5e-2 fF.
pub const SAMPLE_CAPACITOR_CSV: &str = "\
Capacitor_Name,Start_X,Start_Y,Start_Z,End_X,End_Y,End_Z,Value,Unit
Cap1,0.0,0.0,0.0,0.1,0.1,0.01,0.005,fF
Cap2,0.05,0.05,0.0,0.15,0.15,0.01,0.008,fF
Cap3,0.1,0.1,0.0,0.2,0.2,0.01,0.012,fF
Cap4,0.0,0.15,0.0,0.1,0.25,0.01,0.007,fF
Cap5,0.15,0.0,0.0,0.25,0.1,0.01,0.009,fF
Cap6,0.08,0.08,0.0,0.18,0.18,0.01,0.015,fF
Cap7,0.12,0.12,0.0,0.22,0.22,0.01,0.020,fF
Cap8,0.05,0.15,0.0,0.15,0.25,0.01,0.004,fF
Cap9,0.18,0.05,0.0,0.28,0.15,0.01,0.003,fF
Cap10,0.15,0.15,0.0,0.25,0.25,0.01,0.025,fF
";

/// Write the example table into `dir` (created if needed) and return its path.
pub fn write_example_data(dir: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(SAMPLE_FILE_NAME);
    fs::write(&path, SAMPLE_CAPACITOR_CSV)?;
    log::info!("Wrote example data to {}", path.display());
    Ok(path)
}

// ---------------------------------------------------------------------------
// Synthetic tables
// ---------------------------------------------------------------------------

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    /// Uniform in `[0, 1)`.
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Typical magnitude and unit of generated values.
fn value_scale(kind: ComponentKind) -> (f64, &'static str) {
    match kind {
        ComponentKind::Capacitor => (1e-2, "fF"),
        ComponentKind::Resistor => (50.0, "Ohm"),
    }
}

/// `count` random components on a 1x1 footprint spread over four metal
/// layers. Values are log-normal around a kind-specific magnitude; the same
/// seed always gives the same table.
pub fn synthetic_table(kind: ComponentKind, count: usize, seed: u64) -> ComponentTable {
    const LAYER_PITCH: f64 = 0.01;
    let mut rng = SimpleRng::new(seed);
    let (magnitude, unit) = value_scale(kind);
    let prefix = match kind {
        ComponentKind::Capacitor => "Cap",
        ComponentKind::Resistor => "Res",
    };

    let components = (1..=count)
        .map(|i| {
            let layer = (rng.next_u64() % 4) as f64;
            let start = Point3::new(rng.uniform(0.0, 0.9), rng.uniform(0.0, 0.9), layer * LAYER_PITCH);
            let length = rng.uniform(0.02, 0.12);
            let angle = rng.uniform(0.0, std::f64::consts::TAU);
            let end = Point3::new(
                start.x + length * angle.cos(),
                start.y + length * angle.sin(),
                start.z + LAYER_PITCH,
            );
            Component {
                name: format!("{prefix}{i}"),
                start,
                end,
                value: magnitude * rng.gauss(0.0, 0.6).exp(),
                unit: unit.to_string(),
            }
        })
        .collect();

    ComponentTable::new(kind, components)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_file;

    #[test]
    fn synthetic_tables_are_deterministic_and_valid() {
        let a = synthetic_table(ComponentKind::Resistor, 50, 7);
        let b = synthetic_table(ComponentKind::Resistor, 50, 7);
        assert_eq!(a.components, b.components);
        assert_eq!(a.len(), 50);
        assert_eq!(a.unit, "Ohm");
        assert_eq!(a.components[0].name, "Res1");
        assert!(a.values().iter().all(|v| v.is_finite() && *v > 0.0));

        let c = synthetic_table(ComponentKind::Resistor, 50, 8);
        assert_ne!(a.components, c.components);
    }

    #[test]
    fn example_data_round_trips_through_loader() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_example_data(&dir.path().join("samples")).unwrap();
        assert!(path.ends_with(SAMPLE_FILE_NAME));

        let table = load_file(&path).unwrap();
        assert_eq!(table.len(), 10);
    }
}
