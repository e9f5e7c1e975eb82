//! Serialisable record of a finished training run.

use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, tree::TreeStats};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub version: u32,
    pub learner: String,
    pub opponent: String,
    pub games: usize,
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
    pub truncated: usize,
    pub win_rate: f64,
    pub final_exploration_rate: f64,
    pub win_rate_history: Vec<f64>,
    pub tree: TreeStats,
}

impl TrainingSummary {
    pub const VERSION: u32 = 1;

    /// Write the summary as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create training summary {}", path.display()),
            source,
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open training summary {}", path.display()),
            source,
        })?;
        let summary: Self = serde_json::from_reader(BufReader::new(file))?;
        if summary.version != Self::VERSION {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "unsupported summary version {}, expected {}",
                    summary.version,
                    Self::VERSION
                ),
            });
        }
        Ok(summary)
    }
}
