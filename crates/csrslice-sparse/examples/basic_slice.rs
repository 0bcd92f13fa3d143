//! Basic Row Slicing Example
//!
//! This example demonstrates:
//! - Building a CSR store from raw parts
//! - Saving it in the binary layout and loading it back
//! - Slicing an unordered, repeating row list into a dense matrix
//!
//! Run with: cargo run --example basic_slice

use csrslice_sparse::io::{load, save};
use csrslice_sparse::{constructors, CsrStore, LoadOptions};

fn main() -> anyhow::Result<()> {
    println!("=== csrslice: Basic Row Slicing Example ===\n");

    // 1. A small 4x5 matrix
    println!("1. Building a 4x5 CSR store...");
    let csr = CsrStore::new(
        vec![0, 2, 2, 5, 6],
        vec![0, 3, 1, 2, 4, 0],
        vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        (4, 5),
    )?;
    println!(
        "   {}x{} with {} stored entries, density {:.1}%\n",
        csr.nrows(),
        csr.ncols(),
        csr.nnz(),
        csr.density() * 100.0
    );

    // 2. Binary round trip
    println!("2. Saving and reloading...");
    let path = std::env::temp_dir().join("csrslice_basic_slice.bin");
    save(&csr, &path)?;
    let loaded = load(&path, &LoadOptions::default())?;
    println!("   Reloaded store equal to original: {}\n", loaded == csr);

    // 3. Slice rows in arbitrary order, with a duplicate
    println!("3. Slicing rows [2, 0, 2, 1]...");
    let dense = loaded.slice_rows(&[2i32, 0, 2, 1])?;
    let (nrows, ncols) = dense.shape();
    println!("   Dense output: {}x{}", nrows, ncols);
    for row in dense.rows() {
        println!("   {:?}", row);
    }
    println!();

    // 4. Out-of-range requests fail without producing output
    println!("4. Requesting row -1...");
    match loaded.slice_rows(&[0i32, -1]) {
        Ok(_) => println!("   unexpected success"),
        Err(e) => println!("   rejected: {}\n", e),
    }

    // 5. Larger synthetic matrix
    println!("5. Slicing a random 1000x1000 matrix at density 0.3...");
    let big = constructors::random(1000, 1000, 0.3, 7)?;
    let picks: Vec<i64> = (0..64).map(|i| (i * 13) % 1000).collect();
    let dense = big.slice_rows(&picks)?;
    println!(
        "   {} stored entries, slice shape {:?}",
        big.nnz(),
        dense.shape()
    );

    std::fs::remove_file(&path)?;
    println!("\n=== Done ===");
    Ok(())
}
