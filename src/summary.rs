//! Plain-text rendering of an [`AnalysisReport`] for terminals.

use std::fmt::Write as _;

use crate::{
    classify::SemanticType,
    report::AnalysisReport,
    table::{self, Align},
};

const PREVIEW_LIMIT: usize = 5;

pub fn render(report: &AnalysisReport) -> String {
    let profile = &report.profile;
    let quality = &report.quality;
    let domain = &report.domain;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Dataset: {} row(s) x {} column(s), {:.2} MB in memory",
        profile.row_count, profile.column_count, profile.memory_mb
    );
    let _ = writeln!(
        out,
        "Missing cells: {} ({:.1}%)",
        profile.total_missing, profile.total_missing_pct
    );
    let types = SemanticType::variants()
        .iter()
        .filter_map(|kind| {
            profile
                .type_summary
                .get(kind)
                .map(|count| format!("{kind}={count}"))
        })
        .collect::<Vec<_>>();
    let _ = writeln!(out, "Column types: {}", types.join(", "));
    let _ = writeln!(out);

    let rows = profile
        .columns
        .iter()
        .map(|column| {
            let issues = column
                .quality_issues
                .iter()
                .map(|issue| issue.as_str())
                .collect::<Vec<_>>();
            vec![
                column.name.clone(),
                column.semantic_type.to_string(),
                format!("{:.1}%", column.missing_pct),
                column.unique.to_string(),
                issues.join(" "),
            ]
        })
        .collect::<Vec<_>>();
    out.push_str(&table::render_table(
        &["column", "type", "missing", "unique", "issues"],
        &[Align::Left, Align::Left, Align::Right, Align::Right],
        &rows,
    ));
    let _ = writeln!(out);

    let _ = writeln!(out, "Quality score: {}/100 ({})", quality.score, quality.status);
    for issue in &quality.issues {
        let _ = writeln!(out, "  issue: {issue}");
    }
    write_preview(&mut out, "warning", &quality.warnings);

    if !profile.correlations.is_empty() {
        let _ = writeln!(out, "Strong correlations:");
        for (pair, coefficient) in profile.correlations.iter().take(PREVIEW_LIMIT) {
            let _ = writeln!(out, "  {pair}: {coefficient:.3}");
        }
    }

    if domain.is_unknown() {
        let _ = writeln!(out, "Domain: unknown");
    } else {
        let _ = writeln!(
            out,
            "Domain: {} ({:.1}% confidence)",
            domain.primary_domain,
            domain.confidence * 100.0
        );
        if !domain.secondary_domains.is_empty() {
            let _ = writeln!(out, "  secondary: {}", domain.secondary_domains.join(", "));
        }
        write_preview(&mut out, "entity", &domain.detected_entities);
        for recommendation in &domain.recommendations {
            let _ = writeln!(out, "  - {recommendation}");
        }
    }
    out
}

fn write_preview(out: &mut String, label: &str, items: &[String]) {
    for item in items.iter().take(PREVIEW_LIMIT) {
        let _ = writeln!(out, "  {label}: {item}");
    }
    if items.len() > PREVIEW_LIMIT {
        let _ = writeln!(out, "  ... and {} more", items.len() - PREVIEW_LIMIT);
    }
}
