use enum_map::Enum;
use enumset::EnumSetType;
use serde::{Deserialize, Serialize};

/// Coarse tag for what a move does. Assigned by the game's `classify`.
#[allow(clippy::derive_hash_xor_eq)]
#[derive(Debug, Ord, PartialOrd, EnumSetType, Hash, Enum, Serialize, Deserialize)]
#[enumset(repr = "u8")]
pub enum MoveCategory {
    Quiet = 0,
    Advance = 1,
    Capture = 2,
    Threat = 3,
    Block = 4,
    Placement = 5,
}

impl MoveCategory {
    pub const VALUES: [MoveCategory; 6] = [
        MoveCategory::Quiet,
        MoveCategory::Advance,
        MoveCategory::Capture,
        MoveCategory::Threat,
        MoveCategory::Block,
        MoveCategory::Placement,
    ];

    pub fn get_name(&self) -> &'static str {
        match self {
            MoveCategory::Quiet => "quiet",
            MoveCategory::Advance => "advance",
            MoveCategory::Capture => "capture",
            MoveCategory::Threat => "threat",
            MoveCategory::Block => "block",
            MoveCategory::Placement => "placement",
        }
    }
}

#[allow(clippy::derive_hash_xor_eq)]
#[derive(Debug, Ord, PartialOrd, EnumSetType, Hash, Enum, Serialize, Deserialize)]
#[enumset(repr = "u8")]
pub enum GamePhase {
    Opening = 0,
    Middlegame = 1,
    Endgame = 2,
}

impl GamePhase {
    pub const VALUES: [GamePhase; 3] = [GamePhase::Opening, GamePhase::Middlegame, GamePhase::Endgame];

    /// Map a game-defined progress measure in `[0, 1]` onto a phase.
    /// Values outside the range are clamped; non-finite values count as the start of the game.
    pub fn from_progress(progress: f64) -> GamePhase {
        let progress = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if progress < 1.0 / 3.0 {
            GamePhase::Opening
        } else if progress < 2.0 / 3.0 {
            GamePhase::Middlegame
        } else {
            GamePhase::Endgame
        }
    }
}

/// Abstract description of a move: small bucketed features, never board coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PatternKey {
    pub unit_type: u8,
    pub category: MoveCategory,
    pub distance_bucket: u8,
    pub phase: GamePhase,
    /// Optional extra dimensions: repetition count, stalls since progress, material tier.
    #[serde(default)]
    pub extra: [u8; 3],
}

impl PatternKey {
    pub const fn new(unit_type: u8, category: MoveCategory, distance_bucket: u8, phase: GamePhase) -> Self {
        Self {
            unit_type,
            category,
            distance_bucket,
            phase,
            extra: [0; 3],
        }
    }

    pub const fn with_extra(self, extra: [u8; 3]) -> Self {
        Self { extra, ..self }
    }

    /// Flat integer encoding used by persistent stores.
    pub fn to_columns(&self) -> [i64; 7] {
        [
            self.unit_type as i64,
            self.category.into_usize() as i64,
            self.distance_bucket as i64,
            self.phase.into_usize() as i64,
            self.extra[0] as i64,
            self.extra[1] as i64,
            self.extra[2] as i64,
        ]
    }

    pub fn from_columns(cols: [i64; 7]) -> Option<Self> {
        fn byte(v: i64) -> Option<u8> {
            u8::try_from(v).ok()
        }
        fn variant<E: Enum>(v: i64) -> Option<E> {
            let i = usize::try_from(v).ok()?;
            (i < E::LENGTH).then(|| E::from_usize(i))
        }
        Some(Self {
            unit_type: byte(cols[0])?,
            category: variant(cols[1])?,
            distance_bucket: byte(cols[2])?,
            phase: variant(cols[3])?,
            extra: [byte(cols[4])?, byte(cols[5])?, byte(cols[6])?],
        })
    }
}

/// The finite bounds a game declares for the keys it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySpace {
    pub unit_types: u8,
    pub distance_buckets: u8,
    /// Cardinality of each extra dimension. 1 means the dimension is unused and must be 0.
    pub extra: [u8; 3],
}

impl KeySpace {
    pub const fn new(unit_types: u8, distance_buckets: u8) -> Self {
        Self {
            unit_types,
            distance_buckets,
            extra: [1; 3],
        }
    }

    pub const fn with_extra(self, extra: [u8; 3]) -> Self {
        Self { extra, ..self }
    }

    pub fn validate(&self, key: &PatternKey) -> Result<(), String> {
        if key.unit_type >= self.unit_types {
            return Err(format!("unit_type {} >= {}", key.unit_type, self.unit_types));
        }
        if key.distance_bucket >= self.distance_buckets {
            return Err(format!(
                "distance_bucket {} >= {}",
                key.distance_bucket, self.distance_buckets
            ));
        }
        for (i, (value, bound)) in key.extra.iter().zip(self.extra.iter()).enumerate() {
            if value >= bound {
                return Err(format!("extra[{i}] {value} >= {bound}"));
            }
        }
        Ok(())
    }

    /// Total number of distinct keys in this space.
    pub fn cardinality(&self) -> u64 {
        let extra: u64 = self.extra.iter().map(|&c| c as u64).product();
        (self.unit_types as u64)
            * (MoveCategory::LENGTH as u64)
            * (self.distance_buckets as u64)
            * (GamePhase::LENGTH as u64)
            * extra
    }
}
