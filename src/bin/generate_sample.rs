use std::fs;
use std::io::Write;
use std::path::Path;

/// Gaussian bump in dB, used to shape carrier peaks over the noise floor.
fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

fn generate_sweep(
    frequencies: &[f64],
    floor_db: f64,
    noise_db: f64,
    carriers: &[(f64, f64, f64)],
    rng: &mut SimpleRng,
) -> Vec<f64> {
    frequencies
        .iter()
        .map(|&f| {
            let bumps: f64 = carriers
                .iter()
                .map(|&(mu, sigma, amp)| gaussian(f, mu, sigma, amp))
                .sum();
            floor_db + bumps + rng.gauss(0.0, noise_db)
        })
        .collect()
}

/// Minimal deterministic PRNG (splitmix64)
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

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn write_measurement(
    path: &Path,
    run_id: &str,
    band_label: &str,
    frequencies: &[f64],
    amplitudes: &[f64],
) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    writeln!(file, "Instrument,ESU 26")?;
    writeln!(file, "Run,{run_id}")?;
    writeln!(file, "Band,{band_label}")?;
    writeln!(file, "Detector,Peak")?;
    writeln!(file, "# Units: Hz, dBuV/m")?;
    writeln!(file, "DATA")?;
    for (f, a) in frequencies.iter().zip(amplitudes) {
        writeln!(file, "{f:.1},{a:.2}")?;
    }
    Ok(())
}

fn main() {
    let mut rng = SimpleRng::new(42);

    // (filename, start Hz, end Hz, floor dB, noise dB, carriers (mu, sigma, amp))
    let scenarios: Vec<(&str, f64, f64, f64, f64, Vec<(f64, f64, f64)>)> = vec![
        (
            "b2_site1_quiet.csv",
            0.5e6,
            3e6,
            -68.0,
            1.5,
            vec![(1.0e6, 0.02e6, 18.0), (2.4e6, 0.03e6, 12.0)],
        ),
        (
            "b2_site1_train_passing.csv",
            0.5e6,
            3e6,
            -44.0,
            4.0,
            vec![(0.9e6, 0.05e6, 20.0), (1.7e6, 0.04e6, 16.0), (2.6e6, 0.02e6, 10.0)],
        ),
        (
            "b5_ambient.csv",
            25e6,
            325e6,
            -62.0,
            2.0,
            vec![(98.1e6, 0.8e6, 30.0), (162.4e6, 0.5e6, 14.0)],
        ),
        (
            "b5_traction_on.csv",
            25e6,
            325e6,
            -38.0,
            5.0,
            vec![(98.1e6, 0.8e6, 22.0), (145.0e6, 2.0e6, 12.0), (260.0e6, 1.5e6, 9.0)],
        ),
        (
            "band 6 rooftop.csv",
            300e6,
            1300e6,
            -55.0,
            3.0,
            vec![(750.0e6, 5.0e6, 25.0), (1100.0e6, 8.0e6, 18.0)],
        ),
    ];

    let out_dir = Path::new("sample_data");
    fs::create_dir_all(out_dir).expect("Failed to create sample_data directory");

    let points_per_sweep = 801;
    let mut written = 0usize;

    for (filename, start, end, floor, noise, carriers) in &scenarios {
        let frequencies: Vec<f64> = (0..points_per_sweep)
            .map(|i| start + (end - start) * i as f64 / (points_per_sweep - 1) as f64)
            .collect();
        let amplitudes = generate_sweep(&frequencies, *floor, *noise, carriers, &mut rng);

        let band_label = filename
            .split(['_', ' '])
            .next()
            .unwrap_or("unknown")
            .to_uppercase();
        let run_id = format!("RUN{:03}", written + 1);

        let path = out_dir.join(filename);
        write_measurement(&path, &run_id, &band_label, &frequencies, &amplitudes)
            .unwrap_or_else(|e| panic!("Failed to write {}: {e}", path.display()));
        written += 1;
    }

    println!(
        "Wrote {written} sweeps ({points_per_sweep} points each) to {}",
        out_dir.display()
    );
}
