// Partner queries consumed by the presentation layer

use crate::error::{Result, TradeError};
use crate::graph::{CountryNode, Direction, Partner, Period, Role, TradeGraph};
use serde::Serialize;
use std::collections::HashMap;

/// Partners shown per sankey phase.
pub const SANKEY_PARTNER_LIMIT: usize = 10;

pub const EXPORT_COLOR: &str = "#36559c";
pub const IMPORT_COLOR: &str = "#b5442d";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerEdge {
    pub source: String,
    pub target: String,
    pub volume_a: f64,
    pub volume_b: f64,
    pub growth: f64,
}

/// Whole-world view: every node plus one edge per (node, i-th best partner).
#[derive(Debug, Clone, Serialize)]
pub struct NetworkView<'g> {
    pub nodes: Vec<&'g CountryNode>,
    pub edges: Vec<PartnerEdge>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CountryNetwork<'g> {
    pub country: &'g CountryNode,
    pub role: Role,
    pub partners: Vec<PartnerEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SankeyLink {
    pub source: usize,
    pub target: usize,
    pub value: f64,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SankeyDiagram {
    pub labels: Vec<String>,
    pub links: Vec<SankeyLink>,
    pub exporter_index: usize,
    pub importer_index: usize,
}

impl Role {
    pub fn color(&self) -> &'static str {
        match self {
            Role::Exporter => EXPORT_COLOR,
            Role::Importer => IMPORT_COLOR,
        }
    }
}

impl SankeyLink {
    pub fn color(&self) -> &'static str {
        self.role.color()
    }
}

fn partner_edge(source: &str, target: &str, partner: &Partner<'_>) -> PartnerEdge {
    PartnerEdge {
        source: source.to_string(),
        target: target.to_string(),
        volume_a: partner.flow.volume_a,
        volume_b: partner.flow.volume_b,
        growth: partner.flow.growth(),
    }
}

/// For each node, its `k` largest partners by period-A volume in `role`.
/// Edges always run from the queried node to its partner.
pub fn best_partners(graph: &TradeGraph, k: usize, role: Role) -> Result<NetworkView<'_>> {
    if k == 0 {
        return Err(TradeError::InvalidParameter(
            "k must be at least 1".to_string(),
        ));
    }

    let mut edges = Vec::new();
    for node in graph.nodes() {
        let sorted = graph.sort_partners(&node.code, role.direction(), Period::A)?;
        edges.extend(
            sorted
                .iter()
                .take(k)
                .map(|partner| partner_edge(&node.code, partner.code(), partner)),
        );
    }

    Ok(NetworkView {
        nodes: graph.nodes().collect(),
        edges,
    })
}

/// One country and all of its partners in `role`, in recorded order.
pub fn country_network<'g>(
    graph: &'g TradeGraph,
    code: &str,
    role: Role,
) -> Result<CountryNetwork<'g>> {
    let country = graph.node(code)?;
    let partners = graph
        .partners(code, role.direction())?
        .iter()
        .map(|partner| partner_edge(code, partner.code(), partner))
        .collect();

    Ok(CountryNetwork {
        country,
        role,
        partners,
    })
}

/// Sankey layout for one country: period-A partners flow into the country's
/// exporter/importer markers, which flow out to period-B partners.
pub fn sankey(graph: &TradeGraph, code: &str) -> Result<SankeyDiagram> {
    let country = graph.node(code)?;
    let mut builder = SankeyBuilder::default();

    for partner in top_partners(graph, code, Direction::Outbound, Period::A)? {
        builder.period_a(&partner, Role::Exporter);
    }
    let exporter_index = builder.place_marker(
        format!("{}\n\u{2190} Export \u{2192}", country.label),
        Role::Exporter,
    );

    for partner in top_partners(graph, code, Direction::Inbound, Period::A)? {
        builder.period_a(&partner, Role::Importer);
    }
    let importer_index = builder.place_marker(
        format!("{}\n\u{2192} Import \u{2190}", country.label),
        Role::Importer,
    );

    // Period B slots are disjoint from period A even for the same partner
    for partner in top_partners(graph, code, Direction::Outbound, Period::B)? {
        builder.period_b(&partner, Role::Exporter, exporter_index);
    }
    for partner in top_partners(graph, code, Direction::Inbound, Period::B)? {
        builder.period_b(&partner, Role::Importer, importer_index);
    }

    Ok(builder.finish(exporter_index, importer_index))
}

fn top_partners<'g>(
    graph: &'g TradeGraph,
    code: &str,
    direction: Direction,
    period: Period,
) -> Result<Vec<Partner<'g>>> {
    let mut partners = graph.sort_partners(code, direction, period)?;
    partners.truncate(SANKEY_PARTNER_LIMIT);
    Ok(partners)
}

/// Period-A link whose target marker has not been placed yet.
struct PendingLink {
    source: usize,
    value: f64,
    role: Role,
}

#[derive(Default)]
struct SankeyBuilder {
    labels: Vec<String>,
    period_a_slots: HashMap<String, usize>,
    period_b_slots: HashMap<String, usize>,
    pending: Vec<PendingLink>,
    links: Vec<SankeyLink>,
}

impl SankeyBuilder {
    fn push_label(&mut self, label: String) -> usize {
        self.labels.push(label);
        self.labels.len() - 1
    }

    fn slot(&mut self, period: Period, partner: &Partner<'_>) -> usize {
        let existing = match period {
            Period::A => self.period_a_slots.get(partner.code()),
            Period::B => self.period_b_slots.get(partner.code()),
        };
        if let Some(&idx) = existing {
            return idx;
        }

        let idx = self.push_label(partner.node.label.clone());
        let slots = match period {
            Period::A => &mut self.period_a_slots,
            Period::B => &mut self.period_b_slots,
        };
        slots.insert(partner.code().to_string(), idx);
        idx
    }

    fn period_a(&mut self, partner: &Partner<'_>, role: Role) {
        let source = self.slot(Period::A, partner);
        self.pending.push(PendingLink {
            source,
            value: partner.flow.volume_a,
            role,
        });
    }

    /// Append a marker label and point every buffered link of `role` at it.
    fn place_marker(&mut self, label: String, role: Role) -> usize {
        let marker = self.push_label(label);
        let (resolved, still_pending): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|link| link.role == role);

        self.links
            .extend(resolved.into_iter().map(|link| SankeyLink {
                source: link.source,
                target: marker,
                value: link.value,
                role: link.role,
            }));
        self.pending = still_pending;
        marker
    }

    fn period_b(&mut self, partner: &Partner<'_>, role: Role, marker: usize) {
        let target = self.slot(Period::B, partner);
        self.links.push(SankeyLink {
            source: marker,
            target,
            value: partner.flow.volume_b,
            role,
        });
    }

    fn finish(self, exporter_index: usize, importer_index: usize) -> SankeyDiagram {
        SankeyDiagram {
            labels: self.labels,
            links: self.links,
            exporter_index,
            importer_index,
        }
    }
}
