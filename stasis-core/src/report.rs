// Report generation from a finished mirror run

use crate::config::MirrorConfig;
use crate::mirror::MirrorOutcome;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub origin: String,
    pub target: String,
    pub upstream: String,
    pub output_dir: String,
    pub started_at: String,
    pub finished_at: String,
    pub duration_ms: i64,
    pub summary: Summary,
    pub entries: Vec<ReportEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub paths: usize,
    pub text_documents: usize,
    pub binary_assets: usize,
    pub fingerprinted_assets: usize,
    pub rewritten_documents: usize,
    pub bytes_stored: usize,
}

/// One line of the link table: where a path ended up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub path: String,
    pub kind: String,
    pub save_path: String,
    pub final_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

pub fn gather_report_data(config: &MirrorConfig, outcome: &MirrorOutcome) -> ReportData {
    let entries = outcome
        .pages
        .iter()
        .map(|page| {
            let asset = outcome.fingerprinted.iter().find(|a| a.path == page.path);
            ReportEntry {
                path: page.path.clone(),
                kind: format!("{:?}", page.kind).to_lowercase(),
                save_path: asset
                    .map(|a| a.save_path.clone())
                    .unwrap_or_else(|| page.save_path.clone()),
                final_name: outcome
                    .mapping
                    .final_name(&page.path)
                    .unwrap_or(&page.stored_name)
                    .to_string(),
                hash: asset.map(|a| a.hash.clone()),
            }
        })
        .collect();

    let text_documents = outcome.pages.iter().filter(|p| p.is_text()).count();

    ReportData {
        origin: config.origin_base.clone(),
        target: config.target_base.clone(),
        upstream: config.upstream.clone(),
        output_dir: config.output_dir.display().to_string(),
        started_at: outcome.started_at.to_rfc3339(),
        finished_at: outcome.finished_at.to_rfc3339(),
        duration_ms: (outcome.finished_at - outcome.started_at).num_milliseconds(),
        summary: Summary {
            paths: outcome.pages.len(),
            text_documents,
            binary_assets: outcome.pages.len() - text_documents,
            fingerprinted_assets: outcome.fingerprinted.len(),
            rewritten_documents: outcome.rewritten_documents,
            bytes_stored: outcome.pages.iter().map(|p| p.size).sum(),
        },
        entries,
    }
}

pub fn generate_text_report(data: &ReportData) -> String {
    let mut report = String::new();

    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Origin:              {}\n", data.origin));
    report.push_str(&format!("  Served from:         {}\n", data.target));
    report.push_str(&format!("  Output directory:    {}\n", data.output_dir));
    report.push_str(&format!("  Duration:            {} ms\n", data.duration_ms));
    report.push_str(&format!("  Paths stored:        {}\n", data.summary.paths));
    report.push_str(&format!("  Text documents:      {}\n", data.summary.text_documents));
    report.push_str(&format!("  Binary assets:       {}\n", data.summary.binary_assets));
    report.push_str(&format!("  Fingerprinted:       {}\n", data.summary.fingerprinted_assets));
    report.push_str(&format!("  Documents rewritten: {}\n", data.summary.rewritten_documents));
    report.push_str(&format!("  Bytes stored:        {}\n", data.summary.bytes_stored));

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Links:\n");

    for entry in &data.entries {
        if entry.final_name == entry.path {
            report.push_str(&format!("  {}\n", entry.path));
        } else {
            report.push_str(&format!("  {} -> {}\n", entry.path, entry.final_name));
        }
        // Only show the file when it differs from the served name
        if entry.save_path != entry.final_name {
            report.push_str(&format!("      {}\n", entry.save_path));
        }
    }
    report.push('\n');

    report
}

pub fn generate_json_report(data: &ReportData) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Stasis",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "run": {
                "origin": data.origin,
                "target": data.target,
                "upstream": data.upstream,
                "output_dir": data.output_dir,
                "started_at": data.started_at,
                "finished_at": data.finished_at,
                "duration_ms": data.duration_ms
            },
            "summary": data.summary,
            "links": data.entries
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
