mod trace;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: zoomreta <trace.json>");
        std::process::exit(1);
    }

    let path = PathBuf::from(&args[1]);
    let data = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
    let trace: trace::Trace = serde_json::from_slice(&data)
        .with_context(|| format!("parsing trace {}", path.display()))?;
    log::info!("replaying {} step(s) from {}", trace.steps.len(), path.display());

    let replay = trace::replay(&trace)?;

    let mut out = std::io::stdout().lock();
    for record in &replay.records {
        serde_json::to_writer(&mut out, record)?;
        writeln!(out)?;
    }
    serde_json::to_writer(&mut out, &serde_json::json!({ "history": replay.history }))?;
    writeln!(out)?;
    Ok(())
}
