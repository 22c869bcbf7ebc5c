//! Quantize a pixel dataset stored as a .npy file for several palette sizes
//!
//! The input is an `f64` array of shape (n_pixels, 4) holding one
//! alpha/red/green/blue sample per row, in the traversal order of the image.
//! For every K the quantized array is written to `<output_prefix>_k<K>.npy`
//! with the same row order.
//!
//! Usage: `quantize-npy <input.npy> <output_prefix> <seed> <iterations> [k ...]`

use ndarray::Array2;
use ndarray_npy::{ReadNpyExt, WriteNpyExt};
use pixelkmeans_rs::{run_sweep, KMeansConfig, DEFAULT_DIAGNOSTIC_K, DEFAULT_K_VALUES};
use std::env;
use std::fs::File;
use std::io::{BufReader, BufWriter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 5 {
        eprintln!(
            "Usage: {} <input.npy> <output_prefix> <seed> <iterations> [k ...]",
            args[0]
        );
        std::process::exit(1);
    }

    let input_path = &args[1];
    let output_prefix = &args[2];
    let seed: u64 = args[3].parse()?;
    let max_iters: usize = args[4].parse()?;
    let k_values: Vec<usize> = if args.len() > 5 {
        args[5..]
            .iter()
            .map(|k| k.parse::<usize>())
            .collect::<Result<_, _>>()?
    } else {
        DEFAULT_K_VALUES.to_vec()
    };

    let reader = BufReader::new(File::open(input_path)?);
    let data: Array2<f64> = Array2::read_npy(reader)?;

    tracing::info!(
        n_samples = data.nrows(),
        n_features = data.ncols(),
        ?k_values,
        seed,
        max_iters,
        "loaded dataset"
    );

    let base = KMeansConfig::default()
        .with_seed(seed)
        .with_max_iters(max_iters);
    let runs = run_sweep(&data.view(), &k_values, &base, Some(DEFAULT_DIAGNOSTIC_K))?;

    println!("k\taverage_error\taverage_distance\titerations");
    for run in &runs {
        let output_path = format!("{}_k{}.npy", output_prefix, run.k);
        let writer = BufWriter::new(File::create(&output_path)?);
        run.quantized.write_npy(writer)?;
        tracing::info!(k = run.k, path = %output_path, "saved quantized dataset");

        println!(
            "{}\t{:.6}\t{:.6}\t{}",
            run.k, run.average_error, run.average_distance, run.outcome.n_iterations
        );
    }

    Ok(())
}
