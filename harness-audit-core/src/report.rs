//! Console rendering of reports and progress lines.
//!
//! Each report has a [`fmt::Display`] view; the `render_*` helpers return `String` and the
//! binary decides where it goes.

use std::fmt;

use serde_json::Value;

use crate::audit::{AppIdReport, AuditProgress, PipelineCountReport};
use crate::diff::ConfigComparison;

pub const WIDE_RULE: usize = 70;
pub const RULE: usize = 50;
const BANNER_RULE: usize = 80;

fn rule(width: usize) -> String {
    "=".repeat(width)
}

fn thin_rule(width: usize) -> String {
    "-".repeat(width)
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Strings print bare, everything else as JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Opening lines of a walk: title, account and a rule of `width`.
pub fn render_banner(title: &str, account_id: &str, width: usize) -> String {
    format!("🚀 {title}\n📊 Account ID: {account_id}\n{}", rule(width))
}

/// One console line per event. Projects without pipelines print nothing.
pub fn render_progress(event: &AuditProgress<'_>) -> Option<String> {
    let line = match event {
        AuditProgress::OrganizationsFound(count) => format!("✅ Found {count} organizations"),
        AuditProgress::OrganizationStarted(org) => format!(
            "\n📁 Processing organization: {} ({})",
            org.name, org.identifier
        ),
        AuditProgress::ProjectsListed {
            count, unavailable, ..
        } => {
            if *unavailable {
                "   ❌ Could not list projects".to_string()
            } else {
                format!("   📋 Found {count} projects")
            }
        }
        AuditProgress::ProjectSkipped { .. } => {
            "      ⚠️  Skipping project with unknown identifier".to_string()
        }
        AuditProgress::ProjectStarted(project) => {
            format!("      🔧 Processing project: {}", project.name)
        }
        AuditProgress::PipelinesListed {
            project,
            unavailable: true,
            ..
        } => format!(
            "      ❌ All approaches failed for project {}",
            project.identifier
        ),
        AuditProgress::PipelinesListed { count: 0, .. } => return None,
        AuditProgress::PipelinesListed { project, count, .. } => {
            format!("      🔧 {}: {count} pipelines", project.name)
        }
        AuditProgress::OrganizationFinished { pipelines, .. } => {
            format!("   📊 Organization total: {pipelines} pipelines")
        }
        AuditProgress::PipelineAppIds { pipeline, app_ids } => {
            if app_ids.is_empty() {
                format!("         ⚪ {}: No appID found", pipeline.name)
            } else {
                let joined: Vec<&str> = app_ids.iter().map(String::as_str).collect();
                format!("         📌 {}: {}", pipeline.name, joined.join(", "))
            }
        }
        AuditProgress::PipelineYamlMissing(pipeline) => {
            format!("         ❌ {}: Failed to get YAML", pipeline.name)
        }
    };
    Some(line)
}

pub struct ConfigComparisonView<'a>(pub &'a ConfigComparison);

impl fmt::Display for ConfigComparisonView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", rule(BANNER_RULE))?;
        writeln!(f, "HARNESS CONFIGURATION COMPARISON")?;
        writeln!(f, "{}", rule(BANNER_RULE))?;

        let result = match self.0 {
            ConfigComparison::UsingDefaults { defaults } => {
                writeln!(
                    f,
                    "📋 RESULT: Customer config is using DEFAULT configuration (no overrides)"
                )?;
                writeln!(f, "\nDefault configuration:")?;
                return writeln!(f, "{}", pretty_json(defaults));
            }
            ConfigComparison::Overrides(result) => result,
        };

        writeln!(f, "🔍 COMPARISON RESULTS:")?;
        writeln!(f, "Customer config has overrides. Analyzing differences...\n")?;

        if !result.changed.is_empty() {
            writeln!(f, "🔄 OVERRIDDEN VALUES:")?;
            writeln!(f, "{}", thin_rule(RULE))?;
            for entry in &result.changed {
                writeln!(f, "Key: {}", entry.key)?;
                writeln!(f, "  Default:  {}", display_value(&entry.old))?;
                writeln!(f, "  Customer: {}\n", display_value(&entry.new))?;
            }
        }

        for (title, entries) in [
            ("➕ CUSTOMER-ONLY SETTINGS:", &result.only_b),
            ("➖ DEFAULT-ONLY SETTINGS (not overridden):", &result.only_a),
        ] {
            if entries.is_empty() {
                continue;
            }
            writeln!(f, "{title}")?;
            writeln!(f, "{}", thin_rule(RULE))?;
            for (key, value) in entries {
                writeln!(f, "Key: {key}")?;
                writeln!(f, "  Value: {}\n", display_value(value))?;
            }
        }

        if !result.unchanged.is_empty() {
            writeln!(
                f,
                "✅ UNCHANGED VALUES: {} settings match between default and customer config",
                result.unchanged_count()
            )?;
        }

        writeln!(f, "\n{}", rule(RULE))?;
        writeln!(f, "SUMMARY:")?;
        writeln!(f, "  🔄 Overridden values: {}", result.changed_count())?;
        writeln!(f, "  ➕ Customer-only settings: {}", result.only_b_count())?;
        writeln!(f, "  ➖ Default-only settings: {}", result.only_a_count())?;
        writeln!(f, "  ✅ Unchanged values: {}", result.unchanged_count())
    }
}

pub struct PipelineCountsView<'a>(pub &'a PipelineCountReport);

impl fmt::Display for PipelineCountsView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let total = report.total();

        writeln!(f, "\n{}", rule(RULE))?;
        writeln!(f, "📊 PIPELINE COUNT SUMMARY")?;
        writeln!(f, "{}", rule(RULE))?;
        for entry in report.ranked() {
            writeln!(
                f,
                "{:<30} | {:>5} pipelines ({:>5.1}%)",
                entry.org.name,
                entry.pipelines,
                percentage(entry.pipelines, total)
            )?;
        }
        writeln!(f, "{}", thin_rule(RULE))?;
        writeln!(f, "{:<30} | {:>5} pipelines", "TOTAL", total)?;
        writeln!(f, "{}", rule(RULE))?;

        writeln!(f, "\n📂 Projects scanned: {}", report.total_projects())?;
        if let Some(average) = report.average_per_org() {
            writeln!(f, "📈 Average pipelines per organization: {average:.1}")?;
        }
        if let Some(busiest) = report.busiest() {
            writeln!(
                f,
                "🏆 Organization with most pipelines: {} ({} pipelines)",
                busiest.org.name, busiest.pipelines
            )?;
        }

        if !report.unlisted_orgs.is_empty() {
            writeln!(
                f,
                "\n⚠️  Projects could not be listed for: {}",
                report.unlisted_orgs.join(", ")
            )?;
        }
        if !report.unavailable_projects.is_empty() {
            writeln!(
                f,
                "\n⚠️  Pipelines could not be listed for {} projects (not counted above):",
                report.unavailable_projects.len()
            )?;
            for project in &report.unavailable_projects {
                writeln!(f, "    📁 {} → 📋 {}", project.org_name, project.project_name)?;
            }
        }
        Ok(())
    }
}

pub struct AppIdReportView<'a>(pub &'a AppIdReport);

impl fmt::Display for AppIdReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;

        writeln!(f, "\n{}", rule(WIDE_RULE))?;
        writeln!(f, "📊 PIPELINE APPID ANALYSIS RESULTS")?;
        writeln!(f, "{}", rule(WIDE_RULE))?;

        if report.usages.is_empty() {
            writeln!(f, "❌ No appIDs found in any pipeline YAML")?;
        } else {
            writeln!(f, "🏷️  APPID USAGE SUMMARY:")?;
            writeln!(f, "{}", thin_rule(RULE))?;
            for (app_id, count) in report.ranked() {
                writeln!(
                    f,
                    "{:<30} | {:>3} pipelines ({:>5.1}%)",
                    app_id,
                    count,
                    percentage(count, report.total_pipelines)
                )?;
            }

            writeln!(f, "\n📋 DETAILED BREAKDOWN:")?;
            writeln!(f, "{}", thin_rule(RULE))?;
            for (app_id, refs) in &report.usages {
                writeln!(f, "\n🏷️  AppID: {} ({} pipelines)", app_id, refs.len())?;
                let mut sorted: Vec<_> = refs.iter().collect();
                sorted.sort();
                for r in sorted {
                    writeln!(
                        f,
                        "    📁 {} → 📋 {} → 🔧 {}",
                        r.org_name, r.project_name, r.pipeline_name
                    )?;
                }
            }
        }

        writeln!(f, "\n{}", rule(WIDE_RULE))?;
        writeln!(f, "📈 SUMMARY STATISTICS")?;
        writeln!(f, "{}", rule(WIDE_RULE))?;
        writeln!(f, "📊 Total pipelines found: {}", report.total_pipelines)?;
        writeln!(f, "🔍 Pipelines processed: {}", report.processed_pipelines)?;
        writeln!(f, "🏷️  Pipelines with appIDs: {}", report.pipelines_with_app_ids)?;
        writeln!(f, "🆔 Unique appIDs found: {}", report.unique_app_ids())?;
        if let Some(coverage) = report.coverage() {
            writeln!(f, "📊 AppID coverage: {coverage:.1}%")?;
        }
        if let Some((app_id, count)) = report.most_used() {
            writeln!(f, "🏆 Most used appID: {app_id} ({count} pipelines)")?;
        }
        if !report.unlisted_orgs.is_empty() {
            writeln!(
                f,
                "⚠️  Organizations whose projects could not be listed: {}",
                report.unlisted_orgs.join(", ")
            )?;
        }
        if !report.unavailable_projects.is_empty() {
            writeln!(
                f,
                "⚠️  Projects whose pipelines could not be listed: {}",
                report.unavailable_projects.len()
            )?;
        }
        Ok(())
    }
}

pub fn render_config_comparison(comparison: &ConfigComparison) -> String {
    ConfigComparisonView(comparison).to_string()
}

pub fn render_pipeline_counts(report: &PipelineCountReport) -> String {
    PipelineCountsView(report).to_string()
}

pub fn render_app_id_report(report: &AppIdReport) -> String {
    AppIdReportView(report).to_string()
}
