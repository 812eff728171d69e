pub mod config;
pub mod data;
pub mod error;
pub mod graph;
pub mod pagerank;
pub mod query;
pub mod record;
pub mod report;
pub mod source;

pub use error::{Result, TradeError};
pub use graph::{CountryNode, Direction, Partner, Period, Role, TradeFlow, TradeGraph};
pub use pagerank::{PageRankEstimator, PageRanks, rank_all};
pub use query::{
    NetworkView, PartnerEdge, SankeyDiagram, SankeyLink, best_partners, country_network, sankey,
};
pub use record::TradeRecord;

use std::collections::HashMap;

/// Build the graph and attach precomputed ranks to it.
pub fn build_graph(records: &[TradeRecord], ranks: &HashMap<String, f64>) -> Result<TradeGraph> {
    let mut graph = TradeGraph::build(records);
    graph.assign_ranks(ranks)?;
    Ok(graph)
}
