//! SQLite backend for pattern statistics.
//!
//! One database file per game instance. Tables:
//! - `patterns`: one row per pattern key with counters and derived fields
//! - `pattern_history`: append-only observation log, pruned to the ring capacity per key
//! - `meta`: the game counter

use std::path::Path;
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::patterns::{Outcome, PatternKey, PatternRecord, PriorityConfig};

use super::*;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS patterns (
    unit_type INTEGER NOT NULL,
    category INTEGER NOT NULL,
    distance_bucket INTEGER NOT NULL,
    phase INTEGER NOT NULL,
    extra0 INTEGER NOT NULL,
    extra1 INTEGER NOT NULL,
    extra2 INTEGER NOT NULL,
    times_seen INTEGER NOT NULL,
    wins INTEGER NOT NULL,
    losses INTEGER NOT NULL,
    draws INTEGER NOT NULL,
    cumulative_score REAL NOT NULL,
    average_score REAL NOT NULL,
    confidence REAL NOT NULL,
    win_rate REAL NOT NULL,
    priority REAL NOT NULL,
    PRIMARY KEY (unit_type, category, distance_bucket, phase, extra0, extra1, extra2)
);
CREATE INDEX IF NOT EXISTS idx_patterns_priority ON patterns(priority DESC);
CREATE TABLE IF NOT EXISTS pattern_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    unit_type INTEGER NOT NULL,
    category INTEGER NOT NULL,
    distance_bucket INTEGER NOT NULL,
    phase INTEGER NOT NULL,
    extra0 INTEGER NOT NULL,
    extra1 INTEGER NOT NULL,
    extra2 INTEGER NOT NULL,
    game_index INTEGER NOT NULL,
    outcome INTEGER NOT NULL,
    score REAL NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_history_key
    ON pattern_history(unit_type, category, distance_bucket, phase, extra0, extra1, extra2, id);
CREATE TABLE IF NOT EXISTS meta (
    name TEXT PRIMARY KEY,
    value INTEGER NOT NULL
);
";

const KEY_COLUMNS: &str = "unit_type, category, distance_bucket, phase, extra0, extra1, extra2";

const KEY_MATCH: &str = "unit_type = ?1 AND category = ?2 AND distance_bucket = ?3 AND phase = ?4 \
     AND extra0 = ?5 AND extra1 = ?6 AND extra2 = ?7";

const RECORD_COLUMNS: &str = "unit_type, category, distance_bucket, phase, extra0, extra1, extra2, \
     times_seen, wins, losses, draws, cumulative_score, average_score, confidence, win_rate, priority";

fn outcome_to_sql(outcome: Outcome) -> i64 {
    match outcome {
        Outcome::Win => 0,
        Outcome::Loss => 1,
        Outcome::Draw => 2,
    }
}

fn outcome_from_sql(value: i64) -> StoreResult<Outcome> {
    match value {
        0 => Ok(Outcome::Win),
        1 => Ok(Outcome::Loss),
        2 => Ok(Outcome::Draw),
        _ => Err(StoreError::Corrupt {
            what: "outcome",
            detail: value.to_string(),
        }),
    }
}

fn key_from_row(row: &Row, offset: usize) -> StoreResult<PatternKey> {
    let mut cols = [0i64; 7];
    for (i, c) in cols.iter_mut().enumerate() {
        *c = row.get(offset + i)?;
    }
    PatternKey::from_columns(cols).ok_or_else(|| StoreError::Corrupt {
        what: "pattern key",
        detail: format!("{cols:?}"),
    })
}

fn count_from_row(row: &Row, index: usize) -> StoreResult<u64> {
    let v: i64 = row.get(index)?;
    u64::try_from(v).map_err(|_| StoreError::Corrupt {
        what: "counter",
        detail: v.to_string(),
    })
}

fn record_from_row(row: &Row) -> StoreResult<PatternRecord> {
    Ok(PatternRecord {
        key: key_from_row(row, 0)?,
        times_seen: count_from_row(row, 7)?,
        wins: count_from_row(row, 8)?,
        losses: count_from_row(row, 9)?,
        draws: count_from_row(row, 10)?,
        cumulative_score: row.get(11)?,
        average_score: row.get(12)?,
        confidence: row.get(13)?,
        win_rate: row.get(14)?,
        priority: row.get(15)?,
    })
}

fn select_record(conn: &Connection, key: &PatternKey) -> StoreResult<Option<PatternRecord>> {
    let c = key.to_columns();
    let mut stmt = conn.prepare_cached(&format!("SELECT {RECORD_COLUMNS} FROM patterns WHERE {KEY_MATCH}"))?;
    let mut rows = stmt.query(params![c[0], c[1], c[2], c[3], c[4], c[5], c[6]])?;
    match rows.next()? {
        Some(row) => Ok(Some(record_from_row(row)?)),
        None => Ok(None),
    }
}

fn write_record(tx: &Transaction, record: &PatternRecord) -> StoreResult<()> {
    let c = record.key.to_columns();
    tx.execute(
        &format!(
            "INSERT OR REPLACE INTO patterns ({RECORD_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
        ),
        params![
            c[0],
            c[1],
            c[2],
            c[3],
            c[4],
            c[5],
            c[6],
            record.times_seen as i64,
            record.wins as i64,
            record.losses as i64,
            record.draws as i64,
            record.cumulative_score,
            record.average_score,
            record.confidence,
            record.win_rate,
            record.priority,
        ],
    )?;
    Ok(())
}

fn next_game_index(tx: &Transaction) -> StoreResult<u64> {
    tx.execute(
        "INSERT INTO meta (name, value) VALUES ('games', 1) \
         ON CONFLICT(name) DO UPDATE SET value = value + 1",
        [],
    )?;
    let games: i64 = tx.query_row("SELECT value FROM meta WHERE name = 'games'", [], |row| row.get(0))?;
    Ok(games.max(0) as u64)
}

/// Count `o` against its key and append it to the key's history, pruned to `history_capacity`.
fn observe_in(
    tx: &Transaction,
    config: &PriorityConfig,
    history_capacity: usize,
    game_index: u64,
    o: &Observation,
) -> StoreResult<PatternRecord> {
    let c = o.key.to_columns();
    let mut record = select_record(tx, &o.key)?.unwrap_or_else(|| PatternRecord::never_observed(o.key));
    record.observe(o.outcome, o.score, config);
    write_record(tx, &record)?;
    tx.execute(
        &format!(
            "INSERT INTO pattern_history ({KEY_COLUMNS}, game_index, outcome, score) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
        ),
        params![
            c[0],
            c[1],
            c[2],
            c[3],
            c[4],
            c[5],
            c[6],
            game_index as i64,
            outcome_to_sql(o.outcome),
            o.score
        ],
    )?;
    tx.execute(
        &format!(
            "DELETE FROM pattern_history WHERE {KEY_MATCH} AND id NOT IN \
             (SELECT id FROM pattern_history WHERE {KEY_MATCH} ORDER BY id DESC LIMIT ?8)"
        ),
        params![c[0], c[1], c[2], c[3], c[4], c[5], c[6], history_capacity as i64],
    )?;
    Ok(record)
}

/// Pattern store persisted in a SQLite database.
///
/// `rusqlite::Connection` is not `Sync`; share a database between threads by
/// opening one store per thread rather than through `SharedPatternStore`.
pub struct SqlitePatternStore {
    conn: Connection,
    config: PriorityConfig,
    history_capacity: usize,
    current_game: u64,
}

impl SqlitePatternStore {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path, config: PriorityConfig, history_capacity: usize) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::initialize(conn, config, history_capacity)
    }

    /// Open a private in-memory database (for testing).
    pub fn open_in_memory(config: PriorityConfig, history_capacity: usize) -> StoreResult<Self> {
        Self::initialize(Connection::open_in_memory()?, config, history_capacity)
    }

    fn initialize(conn: Connection, config: PriorityConfig, history_capacity: usize) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        let current_game = conn
            .query_row("SELECT value FROM meta WHERE name = 'games'", [], |row| row.get::<_, i64>(0))
            .optional()?
            .unwrap_or(0);
        debug!(current_game, "opened sqlite pattern store");
        Ok(Self {
            conn,
            config,
            history_capacity: history_capacity.max(1),
            current_game: current_game.max(0) as u64,
        })
    }

    #[inline]
    pub fn games_recorded(&self) -> u64 {
        self.current_game
    }
}

impl PatternStore for SqlitePatternStore {
    #[inline]
    fn priority_config(&self) -> &PriorityConfig {
        &self.config
    }

    fn begin_game(&mut self) -> StoreResult<u64> {
        let tx = self.conn.transaction()?;
        let game_index = next_game_index(&tx)?;
        tx.commit()?;
        self.current_game = game_index;
        Ok(game_index)
    }

    fn upsert(&mut self, key: PatternKey, outcome: Outcome, score: f64) -> StoreResult<PatternRecord> {
        let tx = self.conn.transaction()?;
        let record = observe_in(
            &tx,
            &self.config,
            self.history_capacity,
            self.current_game,
            &Observation::new(key, outcome, score),
        )?;
        tx.commit()?;
        Ok(record)
    }

    /// The game counter and every observation commit together or not at all.
    fn record_moves(&mut self, observations: &[Observation]) -> StoreResult<u64> {
        let tx = self.conn.transaction()?;
        let game_index = next_game_index(&tx)?;
        for o in observations {
            observe_in(&tx, &self.config, self.history_capacity, game_index, o)?;
        }
        tx.commit()?;
        self.current_game = game_index;
        Ok(game_index)
    }

    fn get(&self, key: &PatternKey) -> StoreResult<Option<PatternRecord>> {
        select_record(&self.conn, key)
    }

    fn top(&self, n: usize, filter: &PatternFilter) -> StoreResult<Vec<PatternRecord>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT {RECORD_COLUMNS} FROM patterns WHERE times_seen >= ?1 ORDER BY priority DESC"
        ))?;
        let mut rows = stmt.query(params![filter.min_times_seen as i64])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let record = record_from_row(row)?;
            if filter.matches(&record) {
                records.push(record);
            }
        }
        rank_records(&mut records);
        records.truncate(n);
        Ok(records)
    }

    fn keys_with_history(&self) -> StoreResult<Vec<PatternKey>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT DISTINCT {KEY_COLUMNS} FROM pattern_history ORDER BY {KEY_COLUMNS}"
        ))?;
        let mut rows = stmt.query([])?;
        let mut keys = Vec::new();
        while let Some(row) = rows.next()? {
            keys.push(key_from_row(row, 0)?);
        }
        keys.sort();
        Ok(keys)
    }

    fn history(&self, key: &PatternKey) -> StoreResult<Vec<HistoryEntry>> {
        let c = key.to_columns();
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT game_index, outcome, score FROM pattern_history WHERE {KEY_MATCH} ORDER BY id DESC"
        ))?;
        let mut rows = stmt.query(params![c[0], c[1], c[2], c[3], c[4], c[5], c[6]])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(HistoryEntry {
                game_index: count_from_row(row, 0)?,
                outcome: outcome_from_sql(row.get(1)?)?,
                score: row.get(2)?,
            });
        }
        Ok(entries)
    }

    fn apply_weighted(&mut self, updates: &[WeightedAggregate]) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        for update in updates {
            let Some(mut record) = select_record(&tx, &update.key)? else {
                continue;
            };
            record.apply_weighted(update.win_rate, update.average_score, &self.config);
            write_record(&tx, &record)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn len(&self) -> StoreResult<usize> {
        let n: i64 = self.conn.query_row("SELECT COUNT(*) FROM patterns", [], |row| row.get(0))?;
        Ok(n.max(0) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::{GamePhase, MoveCategory};

    const KEY: PatternKey = PatternKey::new(2, MoveCategory::Capture, 1, GamePhase::Endgame);

    fn store() -> SqlitePatternStore {
        SqlitePatternStore::open_in_memory(PriorityConfig::DEFAULT, 8).unwrap()
    }

    #[test]
    fn upsert_then_get_matches_in_memory_record() {
        let mut sql = store();
        let mut mem = MemoryPatternStore::new(PriorityConfig::DEFAULT, 8);
        for (outcome, score) in [(Outcome::Win, 12.5), (Outcome::Loss, -40.0), (Outcome::Draw, 3.0)] {
            sql.upsert(KEY, outcome, score).unwrap();
            mem.upsert(KEY, outcome, score).unwrap();
        }
        assert_eq!(mem.get(&KEY).unwrap(), sql.get(&KEY).unwrap());
        assert_eq!(1, sql.len().unwrap());
    }

    #[test]
    fn history_is_pruned_to_capacity() {
        let mut sql = SqlitePatternStore::open_in_memory(PriorityConfig::DEFAULT, 3).unwrap();
        for i in 0..6 {
            sql.begin_game().unwrap();
            sql.upsert(KEY, Outcome::Win, i as f64).unwrap();
        }
        let history = sql.history(&KEY).unwrap();
        let games: Vec<_> = history.iter().map(|e| e.game_index).collect();
        assert_eq!(vec![6, 5, 4], games);
        assert_eq!(6, sql.get(&KEY).unwrap().unwrap().times_seen);
    }

    #[test]
    fn game_counter_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("patterns.db");
        {
            let mut sql = SqlitePatternStore::open(&path, PriorityConfig::DEFAULT, 8).unwrap();
            sql.begin_game().unwrap();
            sql.begin_game().unwrap();
            sql.upsert(KEY, Outcome::Draw, 0.0).unwrap();
        }
        let sql = SqlitePatternStore::open(&path, PriorityConfig::DEFAULT, 8).unwrap();
        assert_eq!(2, sql.games_recorded());
        assert_eq!(1, sql.get(&KEY).unwrap().unwrap().draws);
        assert_eq!(vec![KEY], sql.keys_with_history().unwrap());
    }

    #[test]
    fn top_filters_and_orders() {
        let mut sql = store();
        let other = PatternKey::new(0, MoveCategory::Quiet, 0, GamePhase::Opening);
        for _ in 0..3 {
            sql.upsert(KEY, Outcome::Win, 100.0).unwrap();
            sql.upsert(other, Outcome::Loss, -100.0).unwrap();
        }
        let all = sql.top(10, &PatternFilter::default()).unwrap();
        assert_eq!(vec![KEY, other], all.iter().map(|r| r.key).collect::<Vec<_>>());
        let quiet = sql
            .top(10, &PatternFilter::default().categories(MoveCategory::Quiet.into()))
            .unwrap();
        assert_eq!(vec![other], quiet.iter().map(|r| r.key).collect::<Vec<_>>());
        assert!(sql.top(10, &PatternFilter::default().min_times_seen(4)).unwrap().is_empty());
    }

    #[test]
    fn failed_game_is_rolled_back() {
        let mut sql = store();
        let other = PatternKey::new(1, MoveCategory::Quiet, 0, GamePhase::Opening);
        assert_eq!(1, sql.record_moves(&[Observation::new(KEY, Outcome::Win, 5.0)]).unwrap());
        sql.conn
            .execute_batch(
                "CREATE TRIGGER reject_unit_one BEFORE INSERT ON pattern_history \
                 WHEN NEW.unit_type = 1 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let game = [
            Observation::new(KEY, Outcome::Loss, -5.0),
            Observation::new(other, Outcome::Win, 5.0),
        ];
        assert!(matches!(sql.record_moves(&game), Err(StoreError::Sqlite(_))));

        assert_eq!(1, sql.games_recorded());
        let games: i64 = sql
            .conn
            .query_row("SELECT value FROM meta WHERE name = 'games'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(1, games);
        let record = sql.get(&KEY).unwrap().unwrap();
        assert_eq!((1, 1, 0), (record.times_seen, record.wins, record.losses));
        assert_eq!(1, sql.history(&KEY).unwrap().len());
        assert!(sql.get(&other).unwrap().is_none());

        sql.conn.execute_batch("DROP TRIGGER reject_unit_one;").unwrap();
        assert_eq!(2, sql.record_moves(&game).unwrap());
        assert_eq!(2, sql.get(&KEY).unwrap().unwrap().times_seen);
        assert_eq!(1, sql.get(&other).unwrap().unwrap().times_seen);
    }
}
