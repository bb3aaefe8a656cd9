use anyhow::Result;
use std::io::Write;

use concord_core::MatchResult;
use concord_engine::ReconciliationOutcome;

/// Write the run's results (auto-accepted, then suggested, then unmatched
/// leftovers) as one flat CSV for the downstream report generator.
pub fn write_outcome_csv<W: Write>(writer: W, outcome: &ReconciliationOutcome) -> Result<()> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record([
        "kind",
        "id",
        "left_ref",
        "right_ref",
        "confidence",
        "match_type",
        "status",
        "date_score",
        "amount_score",
        "entity_score",
        "day_delta",
        "amount_pct_delta",
    ])?;

    for result in &outcome.results {
        write_result(&mut w, "match", result)?;
    }
    for result in &outcome.suggested {
        write_result(&mut w, "suggested", result)?;
    }
    for r in &outcome.unmatched_left {
        let left_ref = r.to_string();
        w.write_record([
            "unmatched_left",
            "",
            left_ref.as_str(),
            "",
            "",
            "",
            "",
            "",
            "",
            "",
            "",
            "",
        ])?;
    }
    for r in &outcome.unmatched_right {
        let right_ref = r.to_string();
        w.write_record([
            "unmatched_right",
            "",
            "",
            right_ref.as_str(),
            "",
            "",
            "",
            "",
            "",
            "",
            "",
            "",
        ])?;
    }

    w.flush()?;
    Ok(())
}

fn write_result<W: Write>(w: &mut csv::Writer<W>, kind: &str, result: &MatchResult) -> Result<()> {
    let scores = &result.criterion_scores;
    let status = serde_json::to_value(result.status)?
        .as_str()
        .unwrap_or_default()
        .to_string();
    let record = [
        kind.to_string(),
        result.id.to_string(),
        result.left_ref.to_string(),
        result.right_ref.to_string(),
        format!("{:.4}", result.confidence),
        result.match_type.to_string(),
        status,
        format!("{:.4}", scores.date_score),
        format!("{:.4}", scores.amount_score),
        format!("{:.4}", scores.entity_score),
        result.details.get("day_delta").cloned().unwrap_or_default(),
        result.details.get("amount_pct_delta").cloned().unwrap_or_default(),
    ];
    w.write_record(&record)?;
    Ok(())
}
