//! Rendering helpers for human-readable sweep output.

use bulkedit_types::event::SweepEvent;
use bulkedit_types::report::{
    EntryStatus, EntryTarget, ExecutionReport, ItemFailure, ReportEntry,
};

/// One progress line for a sweep event.
///
/// Returns `None` for events that are not worth a line (unchanged variations).
pub fn render_event_line(event: &SweepEvent) -> Option<String> {
    match event {
        SweepEvent::ProductVisited { id, title } => {
            if title.is_empty() {
                Some(format!("ID: {}", id))
            } else {
                Some(format!("ID: {} {}", id, title))
            }
        }
        SweepEvent::ProductSkipped { id, kind } => {
            Some(format!("ID: {} skipped ({} product)", id, kind.as_str()))
        }
        SweepEvent::Correction(entry) => render_entry_line(entry),
        SweepEvent::Failure(failure) => Some(render_failure_line(failure)),
    }
}

fn render_entry_line(entry: &ReportEntry) -> Option<String> {
    match entry.target {
        EntryTarget::Parent => Some(format!(
            "ID: {} change {} to {} [{}] {}",
            entry.product_id,
            entry.from,
            entry.to,
            entry.attribute_key,
            status_label(entry.status)
        )),
        EntryTarget::Variation if entry.status == EntryStatus::Unchanged => None,
        EntryTarget::Variation => Some(format!(
            "ID: {} variation {} change {} to {} [{}] {}",
            entry.product_id,
            entry
                .variation_id
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string()),
            entry.from,
            entry.to,
            entry.attribute_key,
            status_label(entry.status)
        )),
    }
}

fn render_failure_line(failure: &ItemFailure) -> String {
    let mut out = String::from("error:");
    if let Some(id) = failure.product_id {
        out.push_str(&format!(" ID: {}", id));
    }
    if let Some(v) = failure.variation_id {
        out.push_str(&format!(" variation {}", v));
    }
    if let Some(attr) = &failure.attribute_key {
        out.push_str(&format!(" [{}]", attr));
    }
    out.push_str(&format!(" {}: {}", failure.stage.as_str(), failure.message));
    out
}

/// Single-line run summary.
pub fn render_summary_line(report: &ExecutionReport) -> String {
    let c = &report.counts;
    let mut out = format!(
        "{}visited {}, skipped {}, parent corrections {}, variation corrections {}, \
         variations unchanged {}, load failures {}, resolution errors {}, persistence failures {}",
        if report.dry_run { "dry-run: " } else { "" },
        c.products_visited,
        c.products_skipped,
        c.parent_corrections,
        c.variation_corrections,
        c.variations_unchanged,
        c.load_failures,
        c.resolution_errors,
        c.persistence_failures,
    );
    if report.interrupted {
        out.push_str(" (interrupted)");
    }
    out
}

pub fn render_report_md(report: &ExecutionReport) -> String {
    let c = &report.counts;
    let mut out = String::new();
    out.push_str("# bulkedit report\n\n");
    out.push_str(&format!(
        "- Mode: {}\n",
        if report.dry_run { "dry-run" } else { "apply" }
    ));
    if report.interrupted {
        out.push_str("- Interrupted: yes\n");
    }
    out.push_str(&format!(
        "- Products visited: {} (skipped {})\n- Parent corrections: {}\n- Variation corrections: {} (unchanged {})\n- Failures: load {}, resolution {}, persistence {}\n\n",
        c.products_visited,
        c.products_skipped,
        c.parent_corrections,
        c.variation_corrections,
        c.variations_unchanged,
        c.load_failures,
        c.resolution_errors,
        c.persistence_failures,
    ));

    out.push_str("## Specs\n\n");
    if report.specs.is_empty() {
        out.push_str("_No correction specs._\n\n");
    } else {
        for spec in &report.specs {
            out.push_str(&format!(
                "- `{}`: `{}` → `{}`\n",
                spec.attribute_key, spec.old_value, spec.new_value
            ));
        }
        out.push('\n');
    }

    out.push_str("## Changes\n\n");
    let changes: Vec<&ReportEntry> = report
        .entries
        .iter()
        .filter(|e| e.status != EntryStatus::Unchanged)
        .collect();
    if changes.is_empty() {
        out.push_str("_No changes._\n");
    } else {
        out.push_str("| Product | Variation | Attribute | From | To | Status |\n");
        out.push_str("|---|---|---|---|---|---|\n");
        for e in changes {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                e.product_id,
                e.variation_id
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                e.attribute_key,
                e.from,
                e.to,
                status_label(e.status)
            ));
        }
    }

    if !report.failures.is_empty() {
        out.push_str("\n## Failures\n\n");
        for f in &report.failures {
            out.push_str(&format!("- {}\n", render_failure_line(f)));
        }
    }

    out
}

fn status_label(s: EntryStatus) -> &'static str {
    match s {
        EntryStatus::Applied => "applied",
        EntryStatus::Planned => "planned",
        EntryStatus::Unchanged => "unchanged",
        EntryStatus::Failed => "failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulkedit_types::catalog::ProductKind;
    use bulkedit_types::ids::ProductId;
    use bulkedit_types::report::{FailureStage, ReportRunInfo, ReportToolInfo};
    use bulkedit_types::spec::CorrectionSpec;
    use pretty_assertions::assert_eq;

    fn entry(target: EntryTarget, variation: Option<u64>, status: EntryStatus) -> ReportEntry {
        ReportEntry {
            product_id: ProductId(7),
            variation_id: variation.map(ProductId),
            target,
            attribute_key: "color".to_string(),
            from: "red".to_string(),
            to: "crimson".to_string(),
            status,
        }
    }

    fn report(dry_run: bool) -> ExecutionReport {
        ExecutionReport::new(
            ReportToolInfo {
                name: "bulkedit".into(),
                version: "0.0.0-test".into(),
            },
            ReportRunInfo {
                run_id: "r".into(),
                started_at: "now".into(),
                ended_at: None,
                duration_ms: None,
            },
            dry_run,
        )
    }

    #[test]
    fn product_lines() {
        let visited = SweepEvent::ProductVisited {
            id: ProductId(7),
            title: "Shirt".into(),
        };
        assert_eq!(render_event_line(&visited).as_deref(), Some("ID: 7 Shirt"));

        let untitled = SweepEvent::ProductVisited {
            id: ProductId(7),
            title: String::new(),
        };
        assert_eq!(render_event_line(&untitled).as_deref(), Some("ID: 7"));

        let skipped = SweepEvent::ProductSkipped {
            id: ProductId(8),
            kind: ProductKind::Simple,
        };
        assert_eq!(
            render_event_line(&skipped).as_deref(),
            Some("ID: 8 skipped (simple product)")
        );
    }

    #[test]
    fn correction_lines() {
        let parent = SweepEvent::Correction(entry(EntryTarget::Parent, None, EntryStatus::Planned));
        assert_eq!(
            render_event_line(&parent).as_deref(),
            Some("ID: 7 change red to crimson [color] planned")
        );

        let variation = SweepEvent::Correction(entry(
            EntryTarget::Variation,
            Some(9),
            EntryStatus::Applied,
        ));
        assert_eq!(
            render_event_line(&variation).as_deref(),
            Some("ID: 7 variation 9 change red to crimson [color] applied")
        );

        let unchanged = SweepEvent::Correction(entry(
            EntryTarget::Variation,
            Some(9),
            EntryStatus::Unchanged,
        ));
        assert!(render_event_line(&unchanged).is_none());
    }

    #[test]
    fn failure_line_includes_context() {
        let failure = SweepEvent::Failure(ItemFailure {
            product_id: Some(ProductId(7)),
            variation_id: None,
            attribute_key: Some("color".into()),
            stage: FailureStage::TermResolution,
            message: "term 'red' not found in pa_color".into(),
        });
        assert_eq!(
            render_event_line(&failure).as_deref(),
            Some("error: ID: 7 [color] term_resolution: term 'red' not found in pa_color")
        );
    }

    #[test]
    fn summary_marks_dry_run_and_interruption() {
        let mut r = report(true);
        r.counts.products_visited = 3;
        r.interrupted = true;
        let line = render_summary_line(&r);
        assert!(line.starts_with("dry-run: visited 3"));
        assert!(line.ends_with("(interrupted)"));
    }

    #[test]
    fn report_md_lists_changes_only() {
        let mut r = report(false);
        r.specs.push(CorrectionSpec::new("color", "red", "crimson"));
        r.record_entry(entry(EntryTarget::Parent, None, EntryStatus::Applied));
        r.record_entry(entry(EntryTarget::Variation, Some(9), EntryStatus::Unchanged));

        let md = render_report_md(&r);
        assert!(md.contains("- Mode: apply"));
        assert!(md.contains("- `color`: `red` → `crimson`"));
        assert!(md.contains("| 7 | - | color | red | crimson | applied |"));
        assert!(!md.contains("unchanged |"));
        assert!(!md.contains("## Failures"));
    }

    #[test]
    fn report_md_empty() {
        let md = render_report_md(&report(true));
        assert!(md.contains("_No correction specs._"));
        assert!(md.contains("_No changes._"));
    }
}
