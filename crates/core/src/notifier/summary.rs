//! Batch summary formatting shared by notifiers.

use crate::tracker::CheckOutcome;

/// Maximum length of the per-shipment block (Discord embed field limit).
pub const SUMMARY_FIELD_LIMIT: usize = 1024;

/// Counts over one batch of check outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub total: usize,
    pub changed: usize,
    pub delivered: usize,
    pub errors: usize,
    pub skipped: usize,
}

impl CheckSummary {
    pub fn from_outcomes(outcomes: &[CheckOutcome]) -> Self {
        Self {
            total: outcomes.len(),
            changed: outcomes.iter().filter(|o| o.status_changed()).count(),
            delivered: outcomes.iter().filter(|o| o.is_delivered()).count(),
            errors: outcomes.iter().filter(|o| o.is_error()).count(),
            skipped: outcomes.iter().filter(|o| o.is_skipped()).count(),
        }
    }

    /// One-line counts, or a fixed message for an empty batch.
    pub fn headline(&self) -> String {
        if self.total == 0 {
            return "No active shipments to check".to_string();
        }
        format!(
            "Checked: **{}** | Changed: **{}** | Delivered: **{}** | Errors: **{}**",
            self.total, self.changed, self.delivered, self.errors
        )
    }

    /// One line per outcome, cut to [`SUMMARY_FIELD_LIMIT`] characters.
    pub fn shipment_lines(outcomes: &[CheckOutcome]) -> String {
        let joined = outcomes
            .iter()
            .map(shipment_line)
            .collect::<Vec<_>>()
            .join("\n");
        truncate_chars(&joined, SUMMARY_FIELD_LIMIT)
    }
}

/// Human-readable line for one outcome.
pub fn shipment_line(outcome: &CheckOutcome) -> String {
    match outcome {
        CheckOutcome::Skipped { shipment_id, .. } => {
            format!("• **#{}** - Skipped (delivered)", shipment_id)
        }
        CheckOutcome::Failed { shipment_id, error } => {
            format!("• **#{}** - Error: {}", shipment_id, error)
        }
        CheckOutcome::Checked(summary) => {
            let icon = if summary.is_delivered {
                "✅"
            } else if summary.status_changed {
                "🔄"
            } else {
                "📦"
            };
            let label = match summary.tracking_number.as_deref() {
                Some(number) if !number.is_empty() => last_chars(number, 8),
                _ => format!("#{}", summary.shipment_id),
            };
            format!(
                "• {} **{}** - {}{}",
                icon,
                label,
                summary.status,
                if summary.status_changed {
                    " (changed)"
                } else {
                    ""
                }
            )
        }
    }
}

fn last_chars(s: &str, n: usize) -> String {
    let count = s.chars().count();
    s.chars().skip(count.saturating_sub(n)).collect()
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
