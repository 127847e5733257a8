//! # Marching Terrain Entry Point
//!
//! Headless generator: loads an optional JSON configuration, generates the
//! spawn area and logs what it produced.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- terrain.json
//! ```

use std::path::PathBuf;

fn main() {
    marching_terrain::init_logger();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    if let Err(err) = marching_terrain::run(config_path.as_deref()) {
        log::error!("{err}");
        std::process::exit(1);
    }
}
