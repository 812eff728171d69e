// Monte Carlo PageRank over the trade graph

use crate::error::{Result, TradeError};
use crate::graph::TradeGraph;
use crate::record::TradeRecord;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_DAMPING: f64 = 0.9;
pub const DEFAULT_TRIALS: u64 = 10_000_000;
pub const DEFAULT_SEED: u64 = 1;

/// Random-surfer estimator. Holds the transition matrix for the countries that
/// export at least once; countries that only ever import are not scored.
#[derive(Debug, Clone)]
pub struct PageRankEstimator {
    country_list: Vec<String>,
    counts: Vec<Vec<u32>>,
    out_degree: Vec<u32>,
    transition: Vec<Vec<f64>>,
    cumulative: Vec<Vec<f64>>,
    damping: f64,
}

/// Visitation frequency per scored country, in `country_list` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRanks {
    pub scores: Vec<(String, f64)>,
}

impl PageRankEstimator {
    pub fn new(graph: &TradeGraph, damping: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&damping) {
            return Err(TradeError::InvalidParameter(format!(
                "damping must be within [0, 1], got {}",
                damping
            )));
        }

        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut country_list = Vec::new();
        for (from, _, _) in graph.flows() {
            if !positions.contains_key(from.code.as_str()) {
                positions.insert(from.code.as_str(), country_list.len());
                country_list.push(from.code.clone());
            }
        }

        let n = country_list.len();
        if n == 0 {
            return Err(TradeError::InvalidParameter(
                "graph has no qualifying trade flows to rank".to_string(),
            ));
        }

        let mut counts = vec![vec![0u32; n]; n];
        let mut out_degree = vec![0u32; n];
        for (from, to, _) in graph.flows() {
            // Destination-only countries are left out of the matrix
            if let Some(&j) = positions.get(to.code.as_str()) {
                let i = positions[from.code.as_str()];
                counts[i][j] += 1;
                out_degree[i] += 1;
            }
        }

        if let Some(i) = out_degree.iter().position(|&d| d == 0) {
            return Err(TradeError::ZeroOutDegree {
                code: country_list[i].clone(),
            });
        }

        let jump = (1.0 - damping) / n as f64;
        let transition: Vec<Vec<f64>> = counts
            .iter()
            .zip(&out_degree)
            .map(|(row, &degree)| {
                row.iter()
                    .map(|&c| damping * f64::from(c) / f64::from(degree) + jump)
                    .collect()
            })
            .collect();

        let cumulative: Vec<Vec<f64>> = transition
            .iter()
            .map(|row| {
                let mut sum = 0.0;
                row.iter()
                    .map(|p| {
                        sum += p;
                        sum
                    })
                    .collect()
            })
            .collect();

        Ok(Self {
            country_list,
            counts,
            out_degree,
            transition,
            cumulative,
            damping,
        })
    }

    pub fn from_records(records: &[TradeRecord], damping: f64) -> Result<Self> {
        Self::new(&TradeGraph::build(records), damping)
    }

    pub fn len(&self) -> usize {
        self.country_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.country_list.is_empty()
    }

    pub fn damping(&self) -> f64 {
        self.damping
    }

    pub fn country_list(&self) -> &[String] {
        &self.country_list
    }

    pub fn count(&self, i: usize, j: usize) -> u32 {
        self.counts[i][j]
    }

    pub fn out_degree(&self, i: usize) -> u32 {
        self.out_degree[i]
    }

    pub fn transition(&self, i: usize, j: usize) -> f64 {
        self.transition[i][j]
    }

    pub fn transition_row(&self, i: usize) -> &[f64] {
        &self.transition[i]
    }

    /// Walk `trials` steps from a random start. The same seed always gives the
    /// same scores.
    pub fn estimate(&self, trials: u64, seed: u64) -> Result<PageRanks> {
        if trials == 0 {
            return Err(TradeError::InvalidParameter(
                "trials must be greater than zero".to_string(),
            ));
        }

        let n = self.country_list.len();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut visits = vec![0u64; n];
        let mut page = rng.random_range(0..n);

        for _ in 0..trials {
            visits[page] += 1;
            let r: f64 = rng.random();
            page = self.next_page(page, r);
        }

        let scores = self
            .country_list
            .iter()
            .zip(visits)
            .map(|(code, count)| (code.clone(), count as f64 / trials as f64))
            .collect();

        Ok(PageRanks { scores })
    }

    /// Inverse-CDF step: the first column whose running sum exceeds `r`.
    fn next_page(&self, page: usize, r: f64) -> usize {
        let row = &self.cumulative[page];
        // Rounding can leave the last cumulative value a hair under r
        row.partition_point(|&c| c <= r).min(row.len() - 1)
    }
}

impl PageRanks {
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        self.scores
            .iter()
            .find(|(c, _)| c == code)
            .map(|(_, score)| *score)
    }

    pub fn total(&self) -> f64 {
        self.scores.iter().map(|(_, score)| score).sum()
    }

    /// Highest score first; equal scores ordered by country code.
    pub fn ranked(&self) -> Vec<(String, f64)> {
        let mut ranked = self.scores.clone();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    pub fn to_map(&self) -> HashMap<String, f64> {
        self.scores.iter().cloned().collect()
    }
}

/// Score every exporting country in `records`.
pub fn rank_all(
    records: &[TradeRecord],
    damping: f64,
    trials: u64,
    seed: u64,
) -> Result<HashMap<String, f64>> {
    let estimator = PageRankEstimator::from_records(records, damping)?;
    Ok(estimator.estimate(trials, seed)?.to_map())
}
