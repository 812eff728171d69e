// Report generation for ranks and partner queries

use crate::data::RankParams;
use crate::error::{Result, TradeError};
use crate::graph::{Direction, TradeGraph};
use crate::query::{NetworkView, SankeyDiagram};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankEntry {
    pub position: usize,
    pub code: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<f64>,
    pub export_partners: usize,
    pub import_partners: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankReport {
    pub entries: Vec<RankEntry>,
    pub total_countries: usize,
    pub ranked_countries: usize,
    pub total_flows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<RankParams>,
}

impl RankReport {
    /// Ranked countries first (highest rank, then code); unranked ones follow
    /// ordered by code.
    pub fn from_graph(graph: &TradeGraph, params: Option<RankParams>) -> Result<Self> {
        let mut nodes: Vec<_> = graph.nodes().collect();
        nodes.sort_by(|a, b| match (a.rank, b.rank) {
            (Some(x), Some(y)) => y.total_cmp(&x).then_with(|| a.code.cmp(&b.code)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.code.cmp(&b.code),
        });

        let mut entries = Vec::with_capacity(nodes.len());
        for (idx, node) in nodes.iter().enumerate() {
            entries.push(RankEntry {
                position: idx + 1,
                code: node.code.clone(),
                label: node.label.clone(),
                rank: node.rank,
                export_partners: graph.partners(&node.code, Direction::Outbound)?.len(),
                import_partners: graph.partners(&node.code, Direction::Inbound)?.len(),
            });
        }

        Ok(RankReport {
            ranked_countries: entries.iter().filter(|e| e.rank.is_some()).count(),
            total_countries: entries.len(),
            total_flows: graph.edge_count(),
            entries,
            params,
        })
    }
}

pub fn render_rank_report(report: &RankReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(report)),
        ReportFormat::Markdown => Ok(generate_markdown_report(report)),
        ReportFormat::Csv => generate_csv_report(report),
        ReportFormat::Json => generate_json_report(report),
    }
}

fn format_rank(rank: Option<f64>) -> String {
    rank.map(|r| format!("{:.6}", r))
        .unwrap_or_else(|| "-".to_string())
}

pub fn generate_text_report(report: &RankReport) -> String {
    let mut out = String::new();

    out.push_str(RULE);
    out.push_str("                        TRADENET COUNTRY RANKING\n");
    out.push_str(RULE);
    out.push('\n');

    out.push_str(&format!("Countries:    {}\n", report.total_countries));
    out.push_str(&format!("Ranked:       {}\n", report.ranked_countries));
    out.push_str(&format!("Trade flows:  {}\n", report.total_flows));
    if let Some(params) = report.params {
        out.push_str(&format!("Damping:      {}\n", params.damping));
        out.push_str(&format!("Trials:       {}\n", params.trials));
        out.push_str(&format!("Seed:         {}\n", params.seed));
    }
    out.push('\n');

    out.push_str(RULE);
    out.push_str(&format!(
        "{:>4}  {:<6} {:<32} {:>10} {:>8} {:>8}\n",
        "#", "CODE", "COUNTRY", "RANK", "EXPORTS", "IMPORTS"
    ));
    out.push_str(RULE);

    for entry in &report.entries {
        out.push_str(&format!(
            "{:>4}  {:<6} {:<32} {:>10} {:>8} {:>8}\n",
            entry.position,
            entry.code,
            truncate(&entry.label, 32),
            format_rank(entry.rank),
            entry.export_partners,
            entry.import_partners
        ));
    }
    out.push('\n');

    out
}

pub fn generate_markdown_report(report: &RankReport) -> String {
    let mut out = String::new();

    out.push_str("# Tradenet Country Ranking\n\n");
    out.push_str(&format!(
        "- Countries: {}\n- Ranked: {}\n- Trade flows: {}\n",
        report.total_countries, report.ranked_countries, report.total_flows
    ));
    if let Some(params) = report.params {
        out.push_str(&format!(
            "- Damping: {}\n- Trials: {}\n- Seed: {}\n",
            params.damping, params.trials, params.seed
        ));
    }
    out.push('\n');

    out.push_str("| # | Code | Country | Rank | Exports | Imports |\n");
    out.push_str("|---|------|---------|------|---------|---------|\n");
    for entry in &report.entries {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            entry.position,
            entry.code,
            entry.label.replace('|', "\\|"),
            format_rank(entry.rank),
            entry.export_partners,
            entry.import_partners
        ));
    }

    out
}

/// Same column shape as the rank cache file: code, rank, with the label appended.
pub fn generate_csv_report(report: &RankReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["country_code", "pagerank", "label"])?;
    for entry in &report.entries {
        let rank = entry.rank.map(|r| r.to_string()).unwrap_or_default();
        writer.write_record([entry.code.as_str(), rank.as_str(), entry.label.as_str()])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| TradeError::Io(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| TradeError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

pub fn generate_json_report(report: &RankReport) -> Result<String> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Tradenet",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "summary": {
                "total_countries": report.total_countries,
                "ranked_countries": report.ranked_countries,
                "total_flows": report.total_flows,
                "params": report.params
            },
            "countries": report.entries
        }
    });

    Ok(serde_json::to_string_pretty(&json_report)?)
}

/// Node and edge elements for a graph widget. Edge weight is the growth
/// between the two periods.
pub fn network_elements_json(view: &NetworkView<'_>) -> Result<String> {
    let mut elements: Vec<serde_json::Value> = view
        .nodes
        .iter()
        .map(|node| {
            serde_json::json!({
                "data": { "id": node.code, "label": node.label, "pagerank": node.rank }
            })
        })
        .collect();

    elements.extend(view.edges.iter().map(|edge| {
        serde_json::json!({
            "data": { "source": edge.source, "target": edge.target, "weight": edge.growth }
        })
    }));

    Ok(serde_json::to_string_pretty(&elements)?)
}

pub fn sankey_json(diagram: &SankeyDiagram) -> Result<String> {
    let json = serde_json::json!({
        "node": { "label": diagram.labels },
        "link": {
            "source": diagram.links.iter().map(|l| l.source).collect::<Vec<_>>(),
            "target": diagram.links.iter().map(|l| l.target).collect::<Vec<_>>(),
            "value": diagram.links.iter().map(|l| l.value).collect::<Vec<_>>(),
            "color": diagram.links.iter().map(|l| l.color()).collect::<Vec<_>>()
        }
    });

    Ok(serde_json::to_string_pretty(&json)?)
}

pub fn generate_sankey_text(diagram: &SankeyDiagram) -> String {
    let mut out = String::new();
    let label = |idx: usize| diagram.labels[idx].replace('\n', " ");

    out.push_str(RULE);
    out.push_str(&format!(
        "Partner flows via {} / {}\n",
        label(diagram.exporter_index),
        label(diagram.importer_index)
    ));
    out.push_str(RULE);
    out.push('\n');

    for link in &diagram.links {
        out.push_str(&format!(
            "  [{}] {} -> {}  {:.2}\n",
            link.role.as_str(),
            label(link.source),
            label(link.target),
            link.value
        ));
    }
    if diagram.links.is_empty() {
        out.push_str("  (no qualifying partners)\n");
    }

    out
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}
