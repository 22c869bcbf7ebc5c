//! Basic example demonstrating pixelkmeans-rs usage
//!
//! Run with: cargo run --example basic --release

use ndarray::Array2;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use pixelkmeans_rs::{run_sweep, KMeans, KMeansConfig};

fn main() {
    println!("=== pixelkmeans-rs example ===\n");

    // Synthetic 40x30 image: opaque pixels around three colours
    let (width, height) = (40, 30);
    let n_pixels = width * height;
    let palette: [[f64; 4]; 3] = [
        [255.0, 200.0, 30.0, 30.0],
        [255.0, 30.0, 180.0, 60.0],
        [255.0, 20.0, 40.0, 220.0],
    ];

    let noise = Array2::random((n_pixels, 4), Uniform::new(-8.0, 8.0));
    let mut pixels = Array2::<f64>::zeros((n_pixels, 4));
    for i in 0..n_pixels {
        let colour = palette[i % palette.len()];
        for j in 0..4 {
            pixels[[i, j]] = (colour[j] + noise[[i, j]]).clamp(0.0, 255.0);
        }
    }

    println!("Generated {} pixels ({}x{})\n", n_pixels, width, height);

    let config = KMeansConfig::new(3).with_seed(42);
    let mut kmeans = KMeans::with_config(config);
    kmeans.train(&pixels.view()).expect("Training failed");

    println!("Learned palette:");
    let centroids = kmeans.centroids().unwrap();
    for (i, c) in centroids.outer_iter().enumerate() {
        println!(
            "  Colour {}: a={:.1} r={:.1} g={:.1} b={:.1}",
            i, c[0], c[1], c[2], c[3]
        );
    }
    println!();

    let labels = kmeans.predict(&pixels.view()).expect("Prediction failed");
    let mut counts = vec![0usize; kmeans.k()];
    for &label in &labels {
        counts[label] += 1;
    }
    println!("Cluster distribution:");
    for (i, count) in counts.iter().enumerate() {
        println!(
            "  Colour {}: {} pixels ({:.1}%)",
            i,
            count,
            (*count as f64 / n_pixels as f64) * 100.0
        );
    }
    println!();

    println!(
        "Average WSSSE with k=3: {:.4}\n",
        kmeans.average_error(&pixels.view()).expect("Reporting failed")
    );

    println!("Palette size sweep:");
    let runs = run_sweep(&pixels.view(), &[2, 3, 5, 10], &KMeansConfig::default(), None)
        .expect("Sweep failed");
    for run in runs {
        println!(
            "  k={:>3}: average error {:>10.4}, average distance {:>8.4}",
            run.k, run.average_error, run.average_distance
        );
    }

    println!("\n=== Done! ===");
}
