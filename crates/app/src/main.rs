use anyhow::{bail, Context, Result};
use std::path::Path;

use concord_core::MatchCandidate;
use concord_engine::{MatchConfig, Matcher};
use concord_ingest::StatementRow;

mod export;

const USAGE: &str = "usage: concord <left.json> (<right.json> | --bank-rows=<rows.json>) \
                     [--config=<profile.toml>] [--export=<out.csv>]";

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut positional: Vec<String> = Vec::new();
    let mut bank_rows: Option<String> = None;
    let mut config_path: Option<String> = None;
    let mut export_path: Option<String> = None;

    for arg in std::env::args().skip(1) {
        if let Some(value) = arg.strip_prefix("--bank-rows=") {
            bank_rows = Some(value.to_string());
        } else if let Some(value) = arg.strip_prefix("--config=") {
            config_path = Some(value.to_string());
        } else if let Some(value) = arg.strip_prefix("--export=") {
            export_path = Some(value.to_string());
        } else if arg.starts_with("--") {
            bail!("unknown flag {arg}\n{USAGE}");
        } else {
            positional.push(arg);
        }
    }

    let Some(left_path) = positional.first() else {
        bail!("{USAGE}");
    };
    let left = load_candidates(left_path)?;

    let right = match (positional.get(1), &bank_rows) {
        (Some(path), None) => load_candidates(path)?,
        (None, Some(path)) => load_bank_rows(path)?,
        _ => bail!("supply exactly one right side\n{USAGE}"),
    };

    let config = match config_path {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {path}"))?;
            MatchConfig::from_toml_str(&text).with_context(|| format!("parsing config {path}"))?
        }
        None => MatchConfig::default(),
    };

    let matcher = Matcher::new(config).context("invalid matching configuration")?;
    let outcome = matcher.reconcile(&left, &right)?;

    let s = &outcome.summary;
    println!("matched:          {}", s.matched_count);
    println!("suggested:        {}", s.suggested_count);
    println!("unmatched left:   {}", s.unmatched_left);
    println!("unmatched right:  {}", s.unmatched_right);
    println!("matched amount:   {}", s.matched_amount);
    println!("unmatched amount: {}", s.unmatched_amount);
    println!("match rate:       {:.1}%", s.match_rate * 100.0);

    if let Some(path) = export_path {
        let file = std::fs::File::create(&path)
            .with_context(|| format!("creating export file {path}"))?;
        export::write_outcome_csv(file, &outcome)?;
        tracing::info!("results exported to {path}");
    }

    Ok(())
}

fn load_candidates(path: &str) -> Result<Vec<MatchCandidate>> {
    let text = std::fs::read_to_string(Path::new(path))
        .with_context(|| format!("reading candidates {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing candidates {path}"))
}

/// Load extracted bank-statement rows, dedupe by content fingerprint (the
/// file may concatenate overlapping chunk outputs), convert to candidates.
fn load_bank_rows(path: &str) -> Result<Vec<MatchCandidate>> {
    let text = std::fs::read_to_string(Path::new(path))
        .with_context(|| format!("reading bank rows {path}"))?;
    let rows: Vec<StatementRow> =
        serde_json::from_str(&text).with_context(|| format!("parsing bank rows {path}"))?;

    let mut seen = std::collections::HashSet::new();
    let mut candidates = Vec::new();
    for (i, row) in rows.into_iter().enumerate() {
        if seen.insert(row.fingerprint()) {
            candidates.push(row.into_candidate(&format!("{path}/{i}")));
        }
    }
    Ok(candidates)
}
