//! Writes the API's OpenAPI document.
//!
//! Usage:
//!   cargo run --bin generate_openapi            # to stdout
//!   cargo run --bin generate_openapi -- api.json

use std::{env, fs, io::Write};

use anyhow::{Context, Result};

fn main() -> Result<()> {
    let json = meter_tracker::api::openapi_json().context("failed to render OpenAPI document")?;

    match env::args().nth(1) {
        Some(path) => {
            fs::write(&path, &json).with_context(|| format!("failed to write {path}"))?;
            eprintln!("OpenAPI document written to {path}");
        }
        None => std::io::stdout()
            .write_all(json.as_bytes())
            .context("failed to write to stdout")?,
    }
    Ok(())
}
