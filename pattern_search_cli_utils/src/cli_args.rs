use std::{path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};
use structopt::StructOpt;

use pattern_search::{
    engine::EngineConfig,
    error::EngineResult,
    store::SqlitePatternStore,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameKind {
    TicTacToe,
    Connect4,
}

impl FromStr for GameKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tictactoe" | "tic-tac-toe" => Ok(Self::TicTacToe),
            "connect4" | "connect-four" => Ok(Self::Connect4),
            _ => Err("expected tictactoe|connect4"),
        }
    }
}

#[derive(Debug, StructOpt, Clone, Default)]
pub struct EngineOpts {
    #[structopt(
        parse(from_os_str),
        short = "c",
        long = "--config",
        help = "Path to a JSON engine config. Flags below override its values."
    )]
    pub config: Option<PathBuf>,

    #[structopt(short = "d", long = "--depth", help = "Search depth in plies")]
    pub search_depth: Option<u8>,

    #[structopt(long = "--alpha", help = "Prioritizer: weight of the learned pattern priority")]
    pub alpha: Option<f64>,

    #[structopt(long = "--beta", help = "Prioritizer: weight of the heuristic score")]
    pub beta: Option<f64>,

    #[structopt(long = "--gamma", help = "Prioritizer: weight of the exploration noise (at most 0.1)")]
    pub gamma: Option<f64>,

    #[structopt(
        short = "t",
        long = "--filter-threshold",
        help = "Prioritizer: blended score below which moves are pruned"
    )]
    pub filter_threshold: Option<f64>,

    #[structopt(long = "--min-candidates", help = "Prioritizer: moves always kept per node")]
    pub min_candidates: Option<usize>,

    #[structopt(short = "S", long = "--seed", help = "Random seed for the exploration noise")]
    pub seed: Option<u64>,

    #[structopt(
        long = "--saturation",
        help = "Observation count at which a pattern's confidence reaches 1"
    )]
    pub saturation: Option<f64>,

    #[structopt(short = "m", long = "--max-game-moves", help = "Self-play games are aborted after this many moves")]
    pub max_game_moves: Option<u32>,

    #[structopt(short = "D", long = "--debug", help = "Print search debug info")]
    pub debug: bool,
}

impl EngineOpts {
    /// Apply the flags that were given on top of `config`.
    pub fn apply(&self, config: &mut EngineConfig) {
        config.search.depth = self.search_depth.unwrap_or(config.search.depth);
        config.search.debug |= self.debug;
        let prioritizer = &mut config.prioritizer;
        prioritizer.alpha = self.alpha.unwrap_or(prioritizer.alpha);
        prioritizer.beta = self.beta.unwrap_or(prioritizer.beta);
        prioritizer.gamma = self.gamma.unwrap_or(prioritizer.gamma);
        prioritizer.filter_threshold = self.filter_threshold.unwrap_or(prioritizer.filter_threshold);
        prioritizer.min_candidates = self.min_candidates.unwrap_or(prioritizer.min_candidates);
        if self.seed.is_some() {
            prioritizer.seed = self.seed;
        }
        config.priority.saturation = self.saturation.unwrap_or(config.priority.saturation);
        config.max_game_moves = self.max_game_moves.unwrap_or(config.max_game_moves);
    }
}

#[derive(Debug, StructOpt, Clone, Default)]
pub struct StoreOpts {
    #[structopt(
        parse(from_os_str),
        long = "--db",
        help = "Path to the SQLite pattern database. Without it patterns are kept in memory."
    )]
    pub db: Option<PathBuf>,

    #[structopt(long = "--history-capacity", help = "History entries kept per pattern")]
    pub history_capacity: Option<usize>,
}

impl StoreOpts {
    pub fn apply(&self, config: &mut EngineConfig) {
        config.history_capacity = self.history_capacity.unwrap_or(config.history_capacity);
    }

    /// The SQLite store named by `--db`, if any.
    pub fn open_db(&self, config: &EngineConfig) -> EngineResult<Option<SqlitePatternStore>> {
        self.db.as_deref().map(|path| config.sqlite_store(path)).transpose()
    }
}

#[derive(Debug, StructOpt, Clone)]
pub struct PatternOpts {
    #[structopt(
        short = "g",
        long = "--game",
        help = "tictactoe|connect4: the game to play",
        default_value = "tictactoe"
    )]
    pub game: GameKind,

    #[structopt(flatten)]
    pub engine: EngineOpts,

    #[structopt(flatten)]
    pub store: StoreOpts,
}

impl PatternOpts {
    /// Engine config from `--config` (or the defaults) with every flag applied, validated.
    pub fn engine_config(&self) -> EngineResult<EngineConfig> {
        let mut config = match &self.engine.config {
            Some(path) => EngineConfig::from_json_file(path)?,
            None => EngineConfig::default(),
        };
        self.engine.apply(&mut config);
        self.store.apply(&mut config);
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use pattern_search::error::EngineError;

    use super::*;

    #[test]
    fn parses_game_kind() {
        assert_eq!(Ok(GameKind::TicTacToe), "TicTacToe".parse());
        assert_eq!(Ok(GameKind::Connect4), "connect-four".parse());
        assert!("chess".parse::<GameKind>().is_err());
    }

    #[test]
    fn flags_override_defaults() {
        let opts = PatternOpts::from_iter_safe([
            "self_play",
            "--game",
            "connect4",
            "--depth",
            "3",
            "--alpha",
            "0.5",
            "--beta",
            "0.5",
            "--gamma",
            "0",
            "--history-capacity",
            "16",
        ])
        .unwrap();
        assert_eq!(GameKind::Connect4, opts.game);
        let config = opts.engine_config().unwrap();
        assert_eq!(3, config.search.depth);
        assert_eq!(0.5, config.prioritizer.alpha);
        assert_eq!(0.0, config.prioritizer.gamma);
        assert_eq!(16, config.history_capacity);
        assert_eq!(EngineConfig::default().max_game_moves, config.max_game_moves);
    }

    #[test]
    fn rejects_invalid_weights() {
        let opts = PatternOpts::from_iter_safe(["self_play", "--alpha", "0.9"]).unwrap();
        assert!(matches!(opts.engine_config(), Err(EngineError::Config(_))));
    }
}
