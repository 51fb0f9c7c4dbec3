//! JSON-backed portfolio book.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::reevaluate::Reevaluation;
use crate::types::{SavedAsset, SavedPortfolio};
use crate::{Error, Result};

/// Everything stored in the book file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BookData {
    #[serde(default)]
    pub portfolios: Vec<SavedPortfolio>,
    #[serde(default)]
    pub saved_assets: Vec<SavedAsset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Saved portfolios and watchlist persisted to JSON.
#[derive(Debug)]
pub struct PortfolioBook {
    /// Path to the book JSON file
    path: PathBuf,
    /// In-memory book state
    data: BookData,
}

impl PortfolioBook {
    /// Open the book at the default path.
    ///
    /// Default path: `~/.equifi/portfolios.json`
    /// Can be overridden with `EQUIFI_DATA_FILE` environment variable.
    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path())
    }

    /// Open the book at `path`; a missing file yields an empty book.
    pub fn open(path: PathBuf) -> Result<Self> {
        let data = Self::load_from_path(&path)?;
        Ok(Self { path, data })
    }

    /// Create an in-memory book (no persistence).
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            data: BookData::default(),
        }
    }

    /// Get the default book file path.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("EQUIFI_DATA_FILE") {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".equifi/portfolios.json"))
            .unwrap_or_else(|| PathBuf::from("portfolios.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_path(path: &Path) -> Result<BookData> {
        if !path.exists() {
            return Ok(BookData::default());
        }

        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the book to disk.
    pub fn save(&mut self) -> Result<()> {
        // Skip if in-memory only
        if self.path.as_os_str().is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let now = Utc::now();
        self.data.created_at.get_or_insert(now);
        self.data.updated_at = Some(now);

        let content = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.path, content)?;
        tracing::debug!(path = %self.path.display(), "portfolio book saved");
        Ok(())
    }

    /// Discard in-memory changes and re-read the file.
    pub fn reload(&mut self) -> Result<()> {
        self.data = Self::load_from_path(&self.path)?;
        Ok(())
    }

    pub fn data(&self) -> &BookData {
        &self.data
    }

    pub fn portfolios(&self) -> &[SavedPortfolio] {
        &self.data.portfolios
    }

    /// Append a saved portfolio, returning its index.
    pub fn add_portfolio(&mut self, portfolio: SavedPortfolio) -> usize {
        self.data.portfolios.push(portfolio);
        self.data.portfolios.len() - 1
    }

    /// Remove the portfolio at `index`.
    pub fn remove_portfolio(&mut self, index: usize) -> Result<SavedPortfolio> {
        if index >= self.data.portfolios.len() {
            return Err(Error::PortfolioNotFound(index));
        }
        Ok(self.data.portfolios.remove(index))
    }

    /// Replace the stored expected return and best outcome of the portfolio
    /// at `index` with re-evaluated ones. Weights, risk and range are kept.
    pub fn update_portfolio(
        &mut self,
        index: usize,
        reevaluation: &Reevaluation,
        now: DateTime<Utc>,
    ) -> Result<&SavedPortfolio> {
        let portfolio = self
            .data
            .portfolios
            .get_mut(index)
            .ok_or(Error::PortfolioNotFound(index))?;

        let expected_return = reevaluation.metrics.expected_return;
        let best_outcome = reevaluation
            .best_outcome
            .filter(|_| expected_return.is_finite())
            .ok_or_else(|| {
                Error::InsufficientData(format!(
                    "No usable data for {:?} between {} and {}",
                    reevaluation.missing_assets, reevaluation.range.start, reevaluation.range.end
                ))
            })?;

        portfolio.expected_return = expected_return;
        portfolio.best_outcome = best_outcome;
        portfolio.date_updated = now;
        Ok(portfolio)
    }

    pub fn saved_assets(&self) -> &[SavedAsset] {
        &self.data.saved_assets
    }

    /// Find a watched asset by symbol (case-insensitive).
    pub fn find_asset(&self, symbol: &str) -> Option<&SavedAsset> {
        let symbol_upper = symbol.trim().to_uppercase();
        self.data
            .saved_assets
            .iter()
            .find(|a| a.asset_symbol == symbol_upper)
    }

    /// Add an asset to the watchlist. Each symbol can be saved once.
    pub fn add_asset(&mut self, asset: SavedAsset) -> Result<&SavedAsset> {
        if self.find_asset(&asset.asset_symbol).is_some() {
            return Err(Error::AssetAlreadySaved(asset.asset_symbol));
        }
        self.data.saved_assets.push(asset);
        Ok(&self.data.saved_assets[self.data.saved_assets.len() - 1])
    }

    /// Remove an asset from the watchlist.
    pub fn remove_asset(&mut self, symbol: &str) -> Result<SavedAsset> {
        let symbol_upper = symbol.trim().to_uppercase();

        if let Some(idx) = self
            .data
            .saved_assets
            .iter()
            .position(|a| a.asset_symbol == symbol_upper)
        {
            Ok(self.data.saved_assets.remove(idx))
        } else {
            Err(Error::AssetNotFound(symbol_upper))
        }
    }
}
