// Directed trade graph: one node per country, one edge per qualifying flow

use crate::error::{Result, TradeError};
use crate::record::TradeRecord;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryNode {
    pub code: String,
    pub label: String,
    /// Set once by rank assignment; `None` for countries the estimator never scored.
    pub rank: Option<f64>,
}

/// Volumes of one exporter -> importer flow. Both are strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeFlow {
    pub volume_a: f64,
    pub volume_b: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Flows where the node is the exporter
    Outbound,
    /// Flows where the node is the importer
    Inbound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Exporter,
    Importer,
}

impl Direction {
    fn as_petgraph(self) -> petgraph::Direction {
        match self {
            Direction::Outbound => petgraph::Direction::Outgoing,
            Direction::Inbound => petgraph::Direction::Incoming,
        }
    }
}

impl Role {
    pub fn direction(self) -> Direction {
        match self {
            Role::Exporter => Direction::Outbound,
            Role::Importer => Direction::Inbound,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Exporter => "exporter",
            Role::Importer => "importer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "exporter" | "export" => Some(Role::Exporter),
            "importer" | "import" => Some(Role::Importer),
            _ => None,
        }
    }
}

impl TradeFlow {
    pub fn volume(&self, period: Period) -> f64 {
        match period {
            Period::A => self.volume_a,
            Period::B => self.volume_b,
        }
    }

    /// Relative change from period A to period B. `volume_a` is never zero
    /// for a flow stored in the graph.
    pub fn growth(&self) -> f64 {
        (self.volume_b - self.volume_a) / self.volume_a
    }
}

/// A partner seen from one country, with the volumes of the flow between them.
#[derive(Debug, Clone, Copy)]
pub struct Partner<'g> {
    pub node: &'g CountryNode,
    pub flow: TradeFlow,
}

impl Partner<'_> {
    pub fn code(&self) -> &str {
        &self.node.code
    }

    pub fn volume(&self, period: Period) -> f64 {
        self.flow.volume(period)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TradeGraph {
    graph: DiGraph<CountryNode, TradeFlow>,
    index: HashMap<String, NodeIndex>,
    ranked: bool,
}

impl TradeGraph {
    /// Build a graph from a full record scan. Both endpoints of every record
    /// get a node; only qualifying records become edges.
    pub fn build(records: &[TradeRecord]) -> Self {
        let mut graph = Self::default();
        for record in records {
            let from = graph.ensure_node(&record.from_code, &record.from_name);
            let to = graph.ensure_node(&record.to_code, &record.to_name);
            if record.qualifies() {
                graph.graph.add_edge(
                    from,
                    to,
                    TradeFlow {
                        volume_a: record.volume_a,
                        volume_b: record.volume_b,
                    },
                );
            }
        }
        graph
    }

    fn ensure_node(&mut self, code: &str, label: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(code) {
            return idx;
        }
        let idx = self.graph.add_node(CountryNode {
            code: code.to_string(),
            label: label.to_string(),
            rank: None,
        });
        self.index.insert(code.to_string(), idx);
        idx
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    pub fn node(&self, code: &str) -> Result<&CountryNode> {
        self.node_index(code).map(|idx| &self.graph[idx])
    }

    /// Nodes in first-seen order.
    pub fn nodes(&self) -> impl Iterator<Item = &CountryNode> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// Every qualifying flow as (exporter, importer, flow), in insertion order.
    pub fn flows(&self) -> impl Iterator<Item = (&CountryNode, &CountryNode, TradeFlow)> {
        self.graph.edge_indices().filter_map(move |edge| {
            let (from, to) = self.graph.edge_endpoints(edge)?;
            Some((&self.graph[from], &self.graph[to], self.graph[edge]))
        })
    }

    /// Partners in the order their flows were recorded.
    pub fn partners(&self, code: &str, direction: Direction) -> Result<Vec<Partner<'_>>> {
        let idx = self.node_index(code)?;
        Ok(self.partners_of(idx, direction))
    }

    /// Partners sorted by the requested period's volume, largest first.
    /// Equal volumes keep insertion order.
    pub fn sort_partners(
        &self,
        code: &str,
        direction: Direction,
        period: Period,
    ) -> Result<Vec<Partner<'_>>> {
        let mut partners = self.partners(code, direction)?;
        partners.sort_by(|a, b| b.volume(period).total_cmp(&a.volume(period)));
        Ok(partners)
    }

    pub fn is_ranked(&self) -> bool {
        self.ranked
    }

    pub fn out_degree(&self, code: &str) -> Result<usize> {
        let idx = self.node_index(code)?;
        Ok(self
            .graph
            .edges_directed(idx, petgraph::Direction::Outgoing)
            .count())
    }

    /// Write estimator output onto the nodes. Allowed once per graph; codes
    /// missing from `ranks` keep a `None` rank.
    pub fn assign_ranks(&mut self, ranks: &HashMap<String, f64>) -> Result<()> {
        if self.ranked {
            return Err(TradeError::RanksAlreadyAssigned);
        }
        if let Some(unknown) = ranks.keys().find(|code| !self.index.contains_key(*code)) {
            return Err(TradeError::UnknownCountry(unknown.clone()));
        }

        for (code, &rank) in ranks {
            let idx = self.index[code];
            self.graph[idx].rank = Some(rank);
        }
        self.ranked = true;
        Ok(())
    }

    fn node_index(&self, code: &str) -> Result<NodeIndex> {
        self.index
            .get(code)
            .copied()
            .ok_or_else(|| TradeError::UnknownCountry(code.to_string()))
    }

    fn partners_of(&self, idx: NodeIndex, direction: Direction) -> Vec<Partner<'_>> {
        // petgraph walks adjacency lists newest-first; edge ids restore insertion order
        let mut edges: Vec<(EdgeIndex, NodeIndex, TradeFlow)> = self
            .graph
            .edges_directed(idx, direction.as_petgraph())
            .map(|edge| {
                let other = match direction {
                    Direction::Outbound => edge.target(),
                    Direction::Inbound => edge.source(),
                };
                (edge.id(), other, *edge.weight())
            })
            .collect();
        edges.sort_by_key(|(id, _, _)| *id);

        edges
            .into_iter()
            .map(|(_, other, flow)| Partner {
                node: &self.graph[other],
                flow,
            })
            .collect()
    }
}
