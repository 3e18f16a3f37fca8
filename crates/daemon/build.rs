// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = std::env::var("OUT_DIR")?;
    let path = std::path::Path::new(&out_dir).join("env_names.rs");
    let mut f = std::fs::File::create(path)?;

    let vars = [
        (
            "POORMANS_SYNC_ROOT",
            "Override the sync root (default: ~/Dropbox/Apps/Poormans).",
        ),
        (
            "POORMANS_STATE_DIR",
            "Override the daemon state directory (lock, PID file).",
        ),
        ("XDG_STATE_HOME", "XDG base directory for state data."),
        (
            "RUST_LOG",
            "Controls log level filtering (used by tracing-subscriber).",
        ),
    ];

    for (name, doc) in &vars {
        writeln!(f, "/// Environment variable: {doc}")?;
        writeln!(f, "pub const {name}: &str = \"{name}\";")?;
        writeln!(f)?;
    }

    Ok(())
}
