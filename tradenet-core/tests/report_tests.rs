// Tests for report generation functionality

use std::collections::HashMap;
use tempfile::TempDir;
use tradenet_core::data::RankParams;
use tradenet_core::graph::{Role, TradeGraph};
use tradenet_core::record::TradeRecord;
use tradenet_core::report::{
    RankReport, ReportFormat, generate_csv_report, generate_json_report, generate_markdown_report,
    generate_sankey_text, generate_text_report, network_elements_json, render_rank_report,
    sankey_json, save_report,
};
use tradenet_core::{best_partners, build_graph, sankey};

fn sample_graph() -> TradeGraph {
    let records = vec![
        TradeRecord::new("USA", "United States", "JPN", "Japan", 100.0, 150.0),
        TradeRecord::new("JPN", "Japan", "USA", "United States", 80.0, 60.0),
        TradeRecord::new("USA", "United States", "KOR", "Korea", 30.0, 35.0),
    ];
    let ranks = HashMap::from([("USA".to_string(), 0.4), ("JPN".to_string(), 0.6)]);
    build_graph(&records, &ranks).unwrap()
}

fn params() -> RankParams {
    RankParams {
        damping: 0.9,
        trials: 1000,
        seed: 1,
    }
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert!(matches!(ReportFormat::from_str("text"), Some(ReportFormat::Text)));
    assert!(matches!(ReportFormat::from_str("json"), Some(ReportFormat::Json)));
    assert!(matches!(ReportFormat::from_str("csv"), Some(ReportFormat::Csv)));
    assert!(matches!(ReportFormat::from_str("markdown"), Some(ReportFormat::Markdown)));
    assert!(matches!(ReportFormat::from_str("md"), Some(ReportFormat::Markdown)));
}

#[test]
fn test_report_format_from_str_case_insensitive() {
    assert!(matches!(ReportFormat::from_str("TEXT"), Some(ReportFormat::Text)));
    assert!(matches!(ReportFormat::from_str("Json"), Some(ReportFormat::Json)));
}

#[test]
fn test_report_format_from_str_invalid() {
    assert!(ReportFormat::from_str("html").is_none());
    assert!(ReportFormat::from_str("").is_none());
}

// ============================================================================
// Rank Report Tests
// ============================================================================

#[test]
fn test_rank_report_orders_ranked_first() {
    let report = RankReport::from_graph(&sample_graph(), Some(params())).unwrap();

    let order: Vec<&str> = report.entries.iter().map(|e| e.code.as_str()).collect();
    assert_eq!(order, vec!["JPN", "USA", "KOR"]);
    assert_eq!(report.entries[0].position, 1);
    assert_eq!(report.total_countries, 3);
    assert_eq!(report.ranked_countries, 2);
    assert_eq!(report.total_flows, 3);
}

#[test]
fn test_rank_report_partner_counts() {
    let report = RankReport::from_graph(&sample_graph(), None).unwrap();
    let usa = report.entries.iter().find(|e| e.code == "USA").unwrap();

    assert_eq!(usa.export_partners, 2);
    assert_eq!(usa.import_partners, 1);
}

#[test]
fn test_text_report_contents() {
    let report = RankReport::from_graph(&sample_graph(), Some(params())).unwrap();
    let text = generate_text_report(&report);

    assert!(text.contains("TRADENET COUNTRY RANKING"));
    assert!(text.contains("Japan"));
    assert!(text.contains("0.600000"));
    assert!(text.contains("Trials:       1000"));
}

#[test]
fn test_markdown_report_contents() {
    let report = RankReport::from_graph(&sample_graph(), None).unwrap();
    let markdown = generate_markdown_report(&report);

    assert!(markdown.starts_with("# Tradenet Country Ranking"));
    assert!(markdown.contains("| 3 | KOR | Korea | - | 0 | 1 |"));
}

#[test]
fn test_csv_report_rows() {
    let report = RankReport::from_graph(&sample_graph(), None).unwrap();
    let csv = generate_csv_report(&report).unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines[0], "country_code,pagerank,label");
    assert_eq!(lines[1], "JPN,0.6,Japan");
    assert_eq!(lines[3], "KOR,,Korea");
}

#[test]
fn test_json_report_is_valid() {
    let report = RankReport::from_graph(&sample_graph(), Some(params())).unwrap();
    let json = generate_json_report(&report).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["report"]["metadata"]["generator"], "Tradenet");
    assert_eq!(value["report"]["summary"]["ranked_countries"], 2);
    assert_eq!(value["report"]["countries"][0]["code"], "JPN");
    assert!(value["report"]["countries"][2].get("rank").is_none());
}

#[test]
fn test_render_dispatches_on_format() {
    let report = RankReport::from_graph(&sample_graph(), None).unwrap();
    let csv = render_rank_report(&report, ReportFormat::Csv).unwrap();
    assert!(csv.starts_with("country_code,"));

    let md = render_rank_report(&report, ReportFormat::Markdown).unwrap();
    assert!(md.starts_with("# "));
}

// ============================================================================
// Query Export Tests
// ============================================================================

#[test]
fn test_network_elements_json() {
    let graph = sample_graph();
    let view = best_partners(&graph, 1, Role::Exporter).unwrap();
    let json = network_elements_json(&view).unwrap();
    let elements: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();

    assert_eq!(elements.len(), 3 + 2);
    assert_eq!(elements[0]["data"]["id"], "USA");
    assert_eq!(elements[0]["data"]["pagerank"], 0.4);
    assert!(elements[2]["data"]["pagerank"].is_null());
    assert_eq!(elements[3]["data"]["source"], "USA");
    assert_eq!(elements[3]["data"]["target"], "JPN");
    assert_eq!(elements[3]["data"]["weight"], 0.5);
}

#[test]
fn test_sankey_json_arrays_line_up() {
    let graph = sample_graph();
    let diagram = sankey(&graph, "USA").unwrap();
    let value: serde_json::Value = serde_json::from_str(&sankey_json(&diagram).unwrap()).unwrap();

    let links = diagram.links.len();
    assert_eq!(value["link"]["source"].as_array().unwrap().len(), links);
    assert_eq!(value["link"]["color"].as_array().unwrap().len(), links);
    assert_eq!(
        value["node"]["label"].as_array().unwrap().len(),
        diagram.labels.len()
    );
}

#[test]
fn test_sankey_text_lists_links() {
    let graph = sample_graph();
    let diagram = sankey(&graph, "USA").unwrap();
    let text = generate_sankey_text(&diagram);

    assert!(text.contains("[exporter] Japan -> United States"));
    assert!(text.contains("[importer]"));
}

#[test]
fn test_save_report() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ranks.txt");

    save_report("hello", &path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
}
