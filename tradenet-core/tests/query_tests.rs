// Tests for best-partner and sankey queries

use tradenet_core::graph::{Role, TradeGraph};
use tradenet_core::query::{
    EXPORT_COLOR, IMPORT_COLOR, SANKEY_PARTNER_LIMIT, best_partners, country_network, sankey,
};
use tradenet_core::record::TradeRecord;
use tradenet_core::TradeError;

fn rec(from: &str, to: &str, volume_a: f64, volume_b: f64) -> TradeRecord {
    TradeRecord::new(
        from,
        &format!("{} label", from),
        to,
        &format!("{} label", to),
        volume_a,
        volume_b,
    )
}

fn assert_indices_valid(labels: &[String], links: &[tradenet_core::SankeyLink]) {
    for link in links {
        assert!(link.source < labels.len(), "source {} out of range", link.source);
        assert!(link.target < labels.len(), "target {} out of range", link.target);
    }
}

// ============================================================================
// Best Partner Tests
// ============================================================================

#[test]
fn test_single_export_edge_with_growth() {
    let graph = TradeGraph::build(&[rec("AAA", "BBB", 100.0, 150.0)]);
    let view = best_partners(&graph, 1, Role::Exporter).unwrap();

    assert_eq!(view.nodes.len(), 2);
    assert_eq!(view.edges.len(), 1);
    let edge = &view.edges[0];
    assert_eq!(edge.source, "AAA");
    assert_eq!(edge.target, "BBB");
    assert!((edge.growth - 0.5).abs() < 1e-12);
}

#[test]
fn test_importer_role_uses_inbound_flows() {
    let graph = TradeGraph::build(&[rec("AAA", "BBB", 100.0, 150.0)]);
    let view = best_partners(&graph, 1, Role::Importer).unwrap();

    assert_eq!(view.edges.len(), 1);
    assert_eq!(view.edges[0].source, "BBB");
    assert_eq!(view.edges[0].target, "AAA");
}

#[test]
fn test_k_one_gives_one_edge_per_trading_country() {
    let graph = TradeGraph::build(&[
        rec("AAA", "BBB", 10.0, 11.0),
        rec("AAA", "CCC", 30.0, 20.0),
        rec("BBB", "CCC", 5.0, 6.0),
        rec("CCC", "DDD", 0.0, 6.0),
    ]);
    let view = best_partners(&graph, 1, Role::Exporter).unwrap();

    let pairs: Vec<(&str, &str)> = view
        .edges
        .iter()
        .map(|e| (e.source.as_str(), e.target.as_str()))
        .collect();
    assert_eq!(pairs, vec![("AAA", "CCC"), ("BBB", "CCC")]);
}

#[test]
fn test_k_larger_than_partner_count_truncates() {
    let graph = TradeGraph::build(&[
        rec("AAA", "BBB", 10.0, 11.0),
        rec("AAA", "CCC", 30.0, 20.0),
        rec("AAA", "DDD", 20.0, 25.0),
    ]);

    let top_two = best_partners(&graph, 2, Role::Exporter).unwrap();
    let targets: Vec<&str> = top_two.edges.iter().map(|e| e.target.as_str()).collect();
    assert_eq!(targets, vec!["CCC", "DDD"]);

    let top_ten = best_partners(&graph, 10, Role::Exporter).unwrap();
    assert_eq!(top_ten.edges.len(), 3);
}

#[test]
fn test_k_zero_rejected() {
    let graph = TradeGraph::build(&[rec("AAA", "BBB", 1.0, 1.0)]);
    assert!(matches!(
        best_partners(&graph, 0, Role::Exporter),
        Err(TradeError::InvalidParameter(_))
    ));
}

#[test]
fn test_isolated_country_contributes_no_edges() {
    let graph = TradeGraph::build(&[rec("AAA", "BBB", 1.0, 2.0), rec("ZZZ", "BBB", 0.0, 3.0)]);

    for role in [Role::Exporter, Role::Importer] {
        let view = best_partners(&graph, 1, role).unwrap();
        assert!(view.edges.iter().all(|e| e.source != "ZZZ" && e.target != "ZZZ"));
        assert!(view.nodes.iter().any(|n| n.code == "ZZZ"));
    }
}

#[test]
fn test_country_network_lists_all_partners() {
    let graph = TradeGraph::build(&[
        rec("AAA", "BBB", 1.0, 2.0),
        rec("AAA", "CCC", 5.0, 2.0),
        rec("DDD", "AAA", 3.0, 3.0),
    ]);

    let exports = country_network(&graph, "AAA", Role::Exporter).unwrap();
    assert_eq!(exports.country.code, "AAA");
    let targets: Vec<&str> = exports.partners.iter().map(|e| e.target.as_str()).collect();
    assert_eq!(targets, vec!["BBB", "CCC"]);

    let imports = country_network(&graph, "AAA", Role::Importer).unwrap();
    assert_eq!(imports.partners.len(), 1);
    assert_eq!(imports.partners[0].target, "DDD");

    assert!(matches!(
        country_network(&graph, "QQQ", Role::Exporter),
        Err(TradeError::UnknownCountry(_))
    ));
}

// ============================================================================
// Sankey Tests
// ============================================================================

#[test]
fn test_sankey_single_export_partner() {
    let graph = TradeGraph::build(&[rec("AAA", "BBB", 10.0, 20.0)]);
    let diagram = sankey(&graph, "AAA").unwrap();

    assert_eq!(
        diagram.labels,
        vec![
            "BBB label".to_string(),
            "AAA label\n\u{2190} Export \u{2192}".to_string(),
            "AAA label\n\u{2192} Import \u{2190}".to_string(),
            "BBB label".to_string(),
        ]
    );
    assert_eq!(diagram.exporter_index, 1);
    assert_eq!(diagram.importer_index, 2);
    assert_eq!(diagram.links.len(), 2);

    let first = &diagram.links[0];
    assert_eq!((first.source, first.target, first.value), (0, 1, 10.0));
    assert_eq!(first.role, Role::Exporter);

    let second = &diagram.links[1];
    assert_eq!((second.source, second.target, second.value), (1, 3, 20.0));
    assert_eq!(second.color(), EXPORT_COLOR);
}

#[test]
fn test_sankey_phases_share_slots_within_a_period() {
    let graph = TradeGraph::build(&[
        rec("AAA", "BBB", 10.0, 20.0),
        rec("CCC", "AAA", 5.0, 7.0),
        rec("BBB", "AAA", 3.0, 4.0),
    ]);
    let diagram = sankey(&graph, "AAA").unwrap();

    assert_eq!(
        diagram.labels,
        vec![
            "BBB label".to_string(),
            "AAA label\n\u{2190} Export \u{2192}".to_string(),
            "CCC label".to_string(),
            "AAA label\n\u{2192} Import \u{2190}".to_string(),
            "BBB label".to_string(),
            "CCC label".to_string(),
        ]
    );

    let links: Vec<(usize, usize, f64)> = diagram
        .links
        .iter()
        .map(|l| (l.source, l.target, l.value))
        .collect();
    assert_eq!(
        links,
        vec![
            (0, 1, 10.0),
            (2, 3, 5.0),
            (0, 3, 3.0),
            (1, 4, 20.0),
            (3, 5, 7.0),
            (3, 4, 4.0),
        ]
    );

    let colors: Vec<&str> = diagram.links.iter().map(|l| l.color()).collect();
    assert_eq!(
        colors,
        vec![EXPORT_COLOR, IMPORT_COLOR, IMPORT_COLOR, EXPORT_COLOR, IMPORT_COLOR, IMPORT_COLOR]
    );
}

#[test]
fn test_sankey_period_b_uses_its_own_ordering() {
    let graph = TradeGraph::build(&[
        rec("AAA", "BBB", 10.0, 1.0),
        rec("AAA", "CCC", 5.0, 50.0),
    ]);
    let diagram = sankey(&graph, "AAA").unwrap();

    // Period A: BBB, CCC; period B: CCC, BBB
    assert_eq!(diagram.labels[0], "BBB label");
    assert_eq!(diagram.labels[1], "CCC label");
    assert_eq!(diagram.labels[4], "CCC label");
    assert_eq!(diagram.labels[5], "BBB label");
    assert_eq!(diagram.links[2].target, 4);
    assert_eq!(diagram.links[2].value, 50.0);
}

#[test]
fn test_sankey_limits_each_phase() {
    let mut records = Vec::new();
    for i in 0..(SANKEY_PARTNER_LIMIT + 3) {
        let code = format!("P{:02}", i);
        records.push(rec("AAA", &code, (i + 1) as f64, (i + 1) as f64));
        records.push(rec(&code, "AAA", (i + 1) as f64, (i + 1) as f64));
    }
    let graph = TradeGraph::build(&records);
    let diagram = sankey(&graph, "AAA").unwrap();

    assert_eq!(diagram.links.len(), 4 * SANKEY_PARTNER_LIMIT);
    // Import partners coincide with export partners, so only markers are new in phase 2
    assert_eq!(diagram.labels.len(), 2 + 2 * SANKEY_PARTNER_LIMIT);
    assert_eq!(diagram.exporter_index, SANKEY_PARTNER_LIMIT);
    assert_eq!(diagram.importer_index, SANKEY_PARTNER_LIMIT + 1);
    assert_eq!(diagram.labels[0], "P12 label");
    assert_indices_valid(&diagram.labels, &diagram.links);
}

#[test]
fn test_sankey_indices_are_valid() {
    let graph = TradeGraph::build(&[
        rec("AAA", "BBB", 1.0, 2.0),
        rec("AAA", "CCC", 3.0, 1.0),
        rec("DDD", "AAA", 4.0, 4.0),
        rec("EEE", "AAA", 2.0, 8.0),
        rec("CCC", "AAA", 9.0, 1.0),
    ]);
    let diagram = sankey(&graph, "AAA").unwrap();

    assert_indices_valid(&diagram.labels, &diagram.links);
    assert_eq!(diagram.links.len(), 2 + 3 + 2 + 3);
}

#[test]
fn test_sankey_isolated_country_has_only_markers() {
    let graph = TradeGraph::build(&[rec("AAA", "BBB", 0.0, 1.0)]);
    let diagram = sankey(&graph, "AAA").unwrap();

    assert_eq!(diagram.labels.len(), 2);
    assert_eq!(diagram.exporter_index, 0);
    assert_eq!(diagram.importer_index, 1);
    assert!(diagram.links.is_empty());
}

#[test]
fn test_sankey_unknown_country() {
    let graph = TradeGraph::build(&[rec("AAA", "BBB", 1.0, 1.0)]);
    assert!(matches!(
        sankey(&graph, "XYZ"),
        Err(TradeError::UnknownCountry(code)) if code == "XYZ"
    ));
}
