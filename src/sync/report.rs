//! Change report rendering.
//!
//! One line per changed page in git-status style, then a comma-joined
//! summary. Paths come from state; a page not yet tracked (only possible
//! in the new bucket) falls back to its id.

use crate::state::{ExportState, SyncDelta};

/// Render the report for a computed delta.
#[must_use]
pub fn render_report(delta: &SyncDelta, state: &ExportState) -> String {
    let path_for = |page_id: &str| -> String {
        state
            .pages
            .get(page_id)
            .map_or_else(|| format!("page {page_id}"), |r| r.output_path.clone())
    };

    let mut lines: Vec<String> = Vec::new();
    for id in &delta.new {
        lines.push(format!("  new:  {}", path_for(id)));
    }
    for id in &delta.modified {
        lines.push(format!("  mod:  {}", path_for(id)));
    }
    for id in &delta.stale {
        lines.push(format!("  stale:  {}", path_for(id)));
    }
    for id in &delta.deleted {
        lines.push(format!("  del:  {}", path_for(id)));
    }

    let mut parts = vec![
        format!("{} new", delta.new.len()),
        format!("{} modified", delta.modified.len()),
    ];
    // Stale pages only exist after a forced re-export, so the segment
    // stays out of the everyday summary.
    if !delta.stale.is_empty() {
        parts.push(format!("{} stale", delta.stale.len()));
    }
    parts.push(format!("{} deleted", delta.deleted.len()));
    parts.push(format!("{} unchanged", delta.unchanged.len()));
    lines.push(parts.join(", "));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta() -> SyncDelta {
        SyncDelta::default()
    }

    fn state_with_page(id: &str, path: &str) -> ExportState {
        let mut state = ExportState::new("https://example.atlassian.net");
        state.update_page(id, 1, path);
        state
    }

    #[test]
    fn test_untracked_new_page_falls_back_to_id() {
        let mut d = delta();
        d.new.push("123".to_string());
        let state = ExportState::new("https://example.atlassian.net");

        let report = render_report(&d, &state);
        assert_eq!(report, "  new:  page 123\n1 new, 0 modified, 0 deleted, 0 unchanged");
    }

    #[test]
    fn test_tracked_pages_show_their_output_path() {
        let mut d = delta();
        d.modified.push("100".to_string());
        let state = state_with_page("100", "ENG/Guide.md");

        let report = render_report(&d, &state);
        assert!(report.starts_with("  mod:  ENG/Guide.md\n"));
    }

    #[test]
    fn test_stale_segment_only_appears_when_nonzero() {
        let mut d = delta();
        d.unchanged.push("1".to_string());
        let state = ExportState::new("https://example.atlassian.net");
        assert_eq!(render_report(&d, &state), "0 new, 0 modified, 0 deleted, 1 unchanged");

        d.stale.push("2".to_string());
        let report = render_report(&d, &state);
        assert!(report.ends_with("0 new, 0 modified, 1 stale, 0 deleted, 1 unchanged"));
    }

    #[test]
    fn test_mixed_delta_report_layout() {
        let mut d = delta();
        d.new.push("1".to_string());
        d.modified.push("2".to_string());
        d.deleted.push("3".to_string());
        d.unchanged.push("4".to_string());

        let mut state = ExportState::new("https://example.atlassian.net");
        state.update_page("2", 5, "ENG/Changed.md");
        state.update_page("3", 2, "ENG/Removed.md");

        let report = render_report(&d, &state);
        let expected = "  new:  page 1\n\
                        \x20 mod:  ENG/Changed.md\n\
                        \x20 del:  ENG/Removed.md\n\
                        1 new, 1 modified, 1 deleted, 1 unchanged";
        assert_eq!(report, expected);
    }
}
