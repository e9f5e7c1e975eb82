//! Simulation configuration.
//!
//! Settings come from a TOML file with one table per concern:
//!
//! ```toml
//! [game]
//! stones = 21
//! max_take = 3
//!
//! [exploration]
//! initial_rate = 1.0
//! decay_factor = 0.995
//! min_rate = 0.05
//!
//! [greedy]
//! depth = 3
//!
//! [session]
//! games = 2000
//! seat = "alternate"
//! ```
//!
//! Missing tables and keys keep their defaults. `MINITREE_<SECTION>_<KEY>`
//! environment variables override individual values after the file is read.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    Error, Result,
    games::TakeAway,
    players::{ExplorationConfig, GreedyConfig},
    session::{RateSchedule, SeatPolicy, SessionConfig},
};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "MINITREE_CONFIG";

/// Locations searched, in order, when no explicit path is given.
pub const CONFIG_SEARCH_PATHS: &[&str] = &["minitree.toml", "config/minitree.toml"];

/// Built-in take-away game played by the command-line driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub stones: u32,
    pub max_take: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            stones: 21,
            max_take: 3,
        }
    }
}

impl GameConfig {
    pub fn rules(&self) -> TakeAway {
        TakeAway::new(self.max_take)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub game: GameConfig,
    pub exploration: ExplorationConfig,
    pub greedy: GreedyConfig,
    pub session: SessionConfig,
}

impl SimulationConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a specific file. Unlike [`load_config`], failures are errors.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            operation: format!("read config {}", path.display()),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), "loaded simulation config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.game.max_take == 0 {
            return Err(Error::InvalidConfiguration {
                message: "game.max_take must be at least 1".to_string(),
            });
        }
        self.exploration.validate()?;
        self.greedy.validate()?;
        self.session.validate()
    }

    pub fn with_games(mut self, games: usize) -> Self {
        self.session.games = games;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.session.seed = Some(seed);
        self
    }

    pub fn with_seat(mut self, seat: SeatPolicy) -> Self {
        self.session.seat = seat;
        self
    }

    pub fn with_exploration(mut self, exploration: ExplorationConfig) -> Self {
        self.exploration = exploration;
        self
    }

    pub fn with_greedy_depth(mut self, depth: usize) -> Self {
        self.greedy.depth = depth;
        self
    }

    pub fn with_rate_schedule(mut self, schedule: RateSchedule) -> Self {
        self.session.rate_schedule = Some(schedule);
        self
    }

    pub fn with_stones(mut self, stones: u32) -> Self {
        self.game.stones = stones;
        self
    }
}

/// Find and load the simulation config.
///
/// Tries the file named by `MINITREE_CONFIG`, then [`CONFIG_SEARCH_PATHS`].
/// Unreadable or invalid files are logged and skipped in favour of the
/// built-in defaults. Environment overrides are applied last.
pub fn load_config() -> SimulationConfig {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(path);
        if path.exists() {
            info!("Loading config from {CONFIG_ENV_VAR}: {}", path.display());
            return load_or_default(&path);
        }
        warn!(
            "{CONFIG_ENV_VAR}={} not found, searching defaults",
            path.display()
        );
    }

    for candidate in CONFIG_SEARCH_PATHS {
        let path = PathBuf::from(candidate);
        if path.exists() {
            info!("Loading config from {}", path.display());
            return load_or_default(&path);
        }
    }

    debug!("No minitree.toml found, using built-in defaults");
    apply_env_overrides(SimulationConfig::default())
}

fn load_or_default(path: &Path) -> SimulationConfig {
    match SimulationConfig::load_from_path(path) {
        Ok(config) => apply_env_overrides(config),
        Err(e) => {
            warn!("Failed to load {}: {e}, using defaults", path.display());
            apply_env_overrides(SimulationConfig::default())
        }
    }
}

macro_rules! env_override {
    ($config:expr, $section:ident . $field:ident, $key:expr) => {
        if let Some(value) = std::env::var($key).ok().and_then(|v| v.parse().ok()) {
            $config.$section.$field = value;
        }
    };
    ($config:expr, $section:ident . $field:ident, $key:expr, optional) => {
        if let Some(value) = std::env::var($key).ok().and_then(|v| v.parse().ok()) {
            $config.$section.$field = Some(value);
        }
    };
}

/// Apply `MINITREE_<SECTION>_<KEY>` overrides. Values that fail to parse are
/// ignored; an override that breaks validation reverts to the input config.
pub fn apply_env_overrides(config: SimulationConfig) -> SimulationConfig {
    let mut overridden = config.clone();
    env_override!(overridden, game.stones, "MINITREE_GAME_STONES");
    env_override!(overridden, game.max_take, "MINITREE_GAME_MAX_TAKE");
    env_override!(overridden, exploration.initial_rate, "MINITREE_EXPLORATION_INITIAL_RATE");
    env_override!(overridden, exploration.decay_factor, "MINITREE_EXPLORATION_DECAY_FACTOR");
    env_override!(overridden, exploration.min_rate, "MINITREE_EXPLORATION_MIN_RATE");
    env_override!(overridden, greedy.depth, "MINITREE_GREEDY_DEPTH");
    env_override!(overridden, session.games, "MINITREE_SESSION_GAMES");
    env_override!(overridden, session.max_plies, "MINITREE_SESSION_MAX_PLIES");
    env_override!(overridden, session.seed, "MINITREE_SESSION_SEED", optional);

    match overridden.validate() {
        Ok(()) => overridden,
        Err(e) => {
            warn!("Ignoring environment overrides: {e}");
            config
        }
    }
}
