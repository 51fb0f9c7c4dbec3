//! Analysis results keyed by query.
//!
//! A result is only ever served for exactly the query it was computed for.
//! Entries leave the cache through explicit invalidation or, once the cache
//! is full, oldest first.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use equifi_core::analysis::{MAX_ASSETS, MIN_ASSETS};
use equifi_core::{DateRange, Interval, PortfolioAnalysis};

/// Default number of analyses kept.
pub const DEFAULT_CAPACITY: usize = 32;

/// Asset selection, date range and interval of one analysis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalysisQuery {
    symbols: Vec<String>,
    range: DateRange,
    interval: Interval,
}

impl AnalysisQuery {
    /// Validated query. Symbols are trimmed and upper-cased; blanks are
    /// dropped and the rest must be distinct.
    pub fn new<S: AsRef<str>>(symbols: &[S], range: DateRange, interval: Interval) -> Result<Self> {
        let mut normalized: Vec<String> = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let symbol = symbol.as_ref().trim().to_uppercase();
            if symbol.is_empty() {
                continue;
            }
            if normalized.contains(&symbol) {
                bail!("Asset {} selected twice", symbol);
            }
            normalized.push(symbol);
        }

        if !(MIN_ASSETS..=MAX_ASSETS).contains(&normalized.len()) {
            bail!(
                "Select between {} and {} assets, got {}",
                MIN_ASSETS,
                MAX_ASSETS,
                normalized.len()
            );
        }

        Ok(Self {
            symbols: normalized,
            range,
            interval,
        })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn contains(&self, symbol: &str) -> bool {
        let symbol = symbol.trim().to_uppercase();
        self.symbols.iter().any(|s| *s == symbol)
    }
}

/// Bounded map from query to finished analysis.
#[derive(Debug)]
pub struct AnalysisCache {
    entries: HashMap<AnalysisQuery, Arc<PortfolioAnalysis>>,
    order: VecDeque<AnalysisQuery>,
    capacity: usize,
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl AnalysisCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, query: &AnalysisQuery) -> Option<Arc<PortfolioAnalysis>> {
        self.entries.get(query).cloned()
    }

    /// Store `analysis` for `query`, replacing any previous result.
    pub fn insert(&mut self, query: AnalysisQuery, analysis: Arc<PortfolioAnalysis>) {
        if self.entries.insert(query.clone(), analysis).is_none() {
            self.order.push_back(query);
        }

        while self.entries.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
            tracing::debug!(symbols = ?oldest.symbols, "evicted cached analysis");
        }
    }

    /// Drop the result for `query`.
    pub fn invalidate(&mut self, query: &AnalysisQuery) -> bool {
        self.order.retain(|q| q != query);
        self.entries.remove(query).is_some()
    }

    /// Drop every result involving `symbol`, returning how many were removed.
    pub fn invalidate_symbol(&mut self, symbol: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|query, _| !query.contains(symbol));
        self.order.retain(|query| !query.contains(symbol));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}
