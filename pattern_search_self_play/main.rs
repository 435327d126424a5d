use std::ops::Range;

use rayon::prelude::*;
use serde::Serialize;
use serde_json::json;
use structopt::StructOpt;
use tracing::info;

use pattern_search::{error::EngineResult, prelude::*};
use pattern_search_cli_utils::cli_args::{GameKind, PatternOpts};
use pattern_search_games::{Connect4, TicTacToe};

#[derive(Debug, StructOpt, Clone)]
#[structopt(about = "Pattern-learning game tree search - self-play")]
pub struct SelfPlayOpts {
    #[structopt(flatten)]
    pub pattern: PatternOpts,

    #[structopt(short = "N", long = "--games", help = "Number of games to play", default_value = "100")]
    pub games: u32,

    #[structopt(
        short = "K",
        long = "--recompute-every",
        help = "Games between recency-weighted priority recomputes (0 to never recompute)",
        default_value = "25"
    )]
    pub recompute_every: u32,

    #[structopt(
        long = "--decay-rate",
        help = "Weight multiplier per step back in a pattern's history",
        default_value = "0.9"
    )]
    pub decay_rate: f64,

    #[structopt(long = "--top", help = "Number of top patterns printed at the end", default_value = "10")]
    pub top: usize,

    #[structopt(
        long = "--log-level",
        help = "Log filter used when RUST_LOG is not set",
        default_value = "info"
    )]
    pub log_level: String,
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[derive(Debug, Default, Clone, Copy, Serialize)]
struct BatchStats {
    games: u32,
    first_wins: u32,
    second_wins: u32,
    draws: u32,
    aborted: u32,
}

impl BatchStats {
    fn add(&mut self, result: GameResult) {
        self.games += 1;
        match result {
            GameResult::Winner(PlayerId::PlayerFirst) => self.first_wins += 1,
            GameResult::Winner(PlayerId::PlayerSecond) => self.second_wins += 1,
            GameResult::Draw => self.draws += 1,
            GameResult::Aborted => self.aborted += 1,
        }
    }
}

fn play_and_learn<G: Game + Default, S: PatternStore>(engine: &mut PatternEngine<G, S>) -> EngineResult<GameResult> {
    let depth = engine.config().search.depth;
    let record = engine.play_self_play_game(&G::default(), depth)?;
    engine.record_game(&record)?;
    Ok(record.result)
}

/// Play `opts.games` games in batches of `opts.recompute_every`, recomputing
/// priorities after each batch, then print the top patterns.
fn train<G, S, P>(opts: &SelfPlayOpts, engine: &mut PatternEngine<G, S>, mut play: P) -> EngineResult<()>
where
    G: Game + Default,
    S: PatternStore,
    P: FnMut(&mut PatternEngine<G, S>, Range<u32>) -> EngineResult<Vec<GameResult>>,
{
    let batch_size = if opts.recompute_every == 0 {
        opts.games.max(1)
    } else {
        opts.recompute_every
    };
    let mut total = BatchStats::default();
    let mut start = 0;
    while start < opts.games {
        let end = (start + batch_size).min(opts.games);
        let mut batch = BatchStats::default();
        for result in play(engine, start..end)? {
            batch.add(result);
            total.add(result);
        }
        let recomputed = if opts.recompute_every > 0 {
            engine.recompute_priorities(opts.decay_rate)?
        } else {
            0
        };
        let patterns = engine.store().len()?;
        info!(games = end, patterns, recomputed, "batch finished");
        println!(
            "{}",
            json!({
                "games_played": end,
                "batch": batch,
                "recomputed": recomputed,
                "patterns": patterns,
            })
        );
        start = end;
    }

    println!("{}", json!({ "total": total }));
    for record in engine.inspect_top_patterns(opts.top)? {
        println!("{}", serde_json::to_string(&record).unwrap_or_default());
    }
    Ok(())
}

fn run<G: Game + Default>(opts: &SelfPlayOpts) -> EngineResult<()> {
    let config = opts.pattern.engine_config()?;
    info!(game = ?opts.pattern.game, games = opts.games, depth = config.search.depth, "starting self-play");
    if let Some(store) = opts.pattern.store.open_db(&config)? {
        // A SQLite connection has a single writer, so games run one after another.
        let mut engine = PatternEngine::<G, _>::new(config, store)?;
        return train(opts, &mut engine, |engine, games| {
            games.map(|_| play_and_learn(engine)).collect()
        });
    }

    let store = SharedPatternStore::new(config.memory_store());
    let mut engine = PatternEngine::<G, _>::new(config, store)?;
    train(opts, &mut engine, |engine, games| {
        let config = engine.config().clone();
        let store = engine.store().clone();
        games
            .into_par_iter()
            .map(|i| {
                let mut config = config.clone();
                config.prioritizer.seed = config.prioritizer.seed.map(|s| s.wrapping_add(i as u64));
                let mut worker = PatternEngine::<G, _>::new(config, store.clone())?;
                play_and_learn(&mut worker)
            })
            .collect()
    })
}

fn main() -> EngineResult<()> {
    let opts = SelfPlayOpts::from_args();
    init_tracing(&opts.log_level);
    match opts.pattern.game {
        GameKind::TicTacToe => run::<TicTacToe>(&opts),
        GameKind::Connect4 => run::<Connect4>(&opts),
    }
}
