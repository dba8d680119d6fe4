//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use loadout_domain::{ConflictDetail, LineageHistoryRecord, MultiSourceField};
use loadout_query::{BatchReceipt, LineageStatistics};
use serde::Serialize;
use serde_json::Value;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// A reconciled field together with the entity it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciledField {
    /// Weapon id
    pub weapon_id: String,
    /// Field name
    pub field: String,
    /// Reconciliation result
    pub reconciled: MultiSourceField<Value>,
}

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format reconciled fields.
    pub fn format_fields(&self, fields: &[ReconciledField]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(fields)?),
            OutputFormat::Table => Ok(self.format_fields_table(fields)),
            OutputFormat::Quiet => Ok(fields
                .iter()
                .map(|f| display_value(&f.reconciled.current_value))
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn format_fields_table(&self, fields: &[ReconciledField]) -> String {
        if fields.is_empty() {
            return self.colorize("No fields to reconcile.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Weapon", "Field", "Value", "Primary", "Confidence", "Sources", "Conflict"]);

        for entry in fields {
            let field = &entry.reconciled;
            let confidence = format!(
                "{:.3} (r {:.2} / f {:.2} / q {:.2})",
                field.confidence.value,
                field.confidence.source_reliability,
                field.confidence.freshness,
                field.confidence.quality
            );
            let conflict = field
                .conflict_details
                .first()
                .map(describe_conflict)
                .unwrap_or_else(|| "none".to_string());
            builder.push_record([
                entry.weapon_id.clone(),
                entry.field.clone(),
                display_value(&field.current_value),
                field.primary_source.to_string(),
                confidence,
                field.sources.len().to_string(),
                conflict,
            ]);
        }

        render(builder)
    }

    /// Format history records.
    pub fn format_history(&self, records: &[LineageHistoryRecord<Value>]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
            OutputFormat::Table => Ok(self.format_history_table(records)),
            OutputFormat::Quiet => Ok(records
                .iter()
                .map(|r| format!("{} {}", r.key(), display_value(&r.new_value)))
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn format_history_table(&self, records: &[LineageHistoryRecord<Value>]) -> String {
        if records.is_empty() {
            return self.colorize("No history found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Timestamp", "Weapon", "Field", "Old", "New", "Source", "Confidence", "Reason"]);

        for record in records {
            builder.push_record([
                record.timestamp.to_string(),
                record.weapon_id.clone(),
                record.field.clone(),
                record
                    .old_value
                    .as_ref()
                    .map(display_value)
                    .unwrap_or_else(|| "(initial)".to_string()),
                display_value(&record.new_value),
                record.source.to_string(),
                format!("{:.3}", record.confidence),
                record.reason.clone().unwrap_or_default(),
            ]);
        }

        render(builder)
    }

    /// Format lineage statistics.
    pub fn format_statistics(&self, stats: &LineageStatistics) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(stats)?),
            OutputFormat::Quiet => Ok(stats.total_records.to_string()),
            OutputFormat::Table => {
                if stats.total_records == 0 {
                    return Ok(self.colorize(&stats.summary(), "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Metric", "Value"]);
                let optional = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
                let rows = [
                    ("Records", stats.total_records.to_string()),
                    ("Entities", stats.unique_entities.to_string()),
                    ("Fields", stats.unique_fields.to_string()),
                    ("Initial observations", stats.initial_observations.to_string()),
                    ("Average confidence", format!("{:.3}", stats.average_confidence)),
                    ("Min confidence", optional(stats.min_confidence.map(|c| format!("{:.3}", c)))),
                    ("Max confidence", optional(stats.max_confidence.map(|c| format!("{:.3}", c)))),
                    ("First change", optional(stats.first_change.map(|t| t.to_string()))),
                    ("Last change", optional(stats.last_change.map(|t| t.to_string()))),
                ];
                for (metric, value) in rows {
                    builder.push_record([metric.to_string(), value]);
                }
                for (source, count) in &stats.by_source {
                    builder.push_record([format!("Source: {}", source), count.to_string()]);
                }
                for (reason, count) in &stats.by_reason {
                    builder.push_record([format!("Reason: {}", reason), count.to_string()]);
                }

                Ok(render(builder))
            }
        }
    }

    /// Format a stored batch.
    pub fn format_receipt(&self, receipt: &BatchReceipt) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(receipt)?),
            OutputFormat::Quiet => Ok(receipt.stored.to_string()),
            OutputFormat::Table => Ok(self.success(&format!(
                "Stored {} history record(s), {} duplicate(s) skipped (batch {})",
                receipt.stored, receipt.duplicates, receipt.batch_id
            ))),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn render(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

/// Render a JSON value without quoting plain strings.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One-line description of a conflict: `source=value` pairs, most reliable first.
pub fn describe_conflict(detail: &ConflictDetail<Value>) -> String {
    detail
        .values
        .iter()
        .map(|entry| format!("{}={}", entry.source, display_value(&entry.value)))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadout_domain::{DataSource, FieldReconciler, SourceRecord};
    use serde_json::json;

    fn reconciled() -> ReconciledField {
        let records = vec![
            SourceRecord::new(DataSource::OfficialApi, json!(35), 1_000),
            SourceRecord::new(DataSource::CommunityWiki, json!(34), 900),
        ];
        ReconciledField {
            weapon_id: "ak-47".to_string(),
            field: "damage".to_string(),
            reconciled: FieldReconciler::default()
                .reconcile_at(&records, "damage", 1_000)
                .unwrap(),
        }
    }

    fn history_record() -> LineageHistoryRecord<Value> {
        LineageHistoryRecord::new(
            "ak-47".to_string(),
            "damage".to_string(),
            Some(json!(35)),
            json!(36),
            DataSource::OfficialApi,
            0.9,
            Some("patch".to_string()),
            None,
            2_000,
        )
    }

    #[test]
    fn test_fields_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_fields(&[reconciled()]).unwrap();
        assert!(output.contains("Primary"));
        assert!(output.contains("official_api=35, community_wiki=34"));
    }

    #[test]
    fn test_fields_json_and_quiet() {
        let json_output = Formatter::new(OutputFormat::Json, false)
            .format_fields(&[reconciled()])
            .unwrap();
        let parsed: Value = serde_json::from_str(&json_output).unwrap();
        assert_eq!(parsed[0]["reconciled"]["primary_source"], "official_api");
        assert_eq!(parsed[0]["reconciled"]["has_conflict"], true);

        let quiet = Formatter::new(OutputFormat::Quiet, false)
            .format_fields(&[reconciled()])
            .unwrap();
        assert_eq!(quiet, "35");
    }

    #[test]
    fn test_history_formats() {
        let table = Formatter::new(OutputFormat::Table, false)
            .format_history(&[history_record()])
            .unwrap();
        assert!(table.contains("patch"));

        let quiet = Formatter::new(OutputFormat::Quiet, false)
            .format_history(&[history_record()])
            .unwrap();
        assert_eq!(quiet, "ak-47/damage@2000#official_api 36");

        let empty = Formatter::new(OutputFormat::Table, false).format_history(&[]).unwrap();
        assert!(empty.contains("No history found"));
    }

    #[test]
    fn test_statistics_table() {
        let stats = LineageStatistics::from_records(&[history_record()]);
        let output = Formatter::new(OutputFormat::Table, false)
            .format_statistics(&stats)
            .unwrap();
        assert!(output.contains("Source: official_api"));
        assert!(output.contains("Reason: patch"));
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("full-auto")), "full-auto");
        assert_eq!(display_value(&json!({"start": 20})), r#"{"start":20}"#);
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
        assert_eq!(formatter.error("bad"), "✗ bad");
    }
}
