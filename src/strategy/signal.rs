//! Spread position states and the entry/exit transition rule shared by the
//! batch signal generator and the live tracker.

use serde::{Deserialize, Serialize};

#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpreadSignal {
    #[default]
    Flat,
    /// Long leg A, short leg B
    LongSpread,
    /// Short leg A, long leg B
    ShortSpread,
}

impl SpreadSignal {
    /// Numeric form used in signal tables: +1 long spread, -1 short spread, 0 flat.
    pub fn as_i8(self) -> i8 {
        match self {
            SpreadSignal::Flat => 0,
            SpreadSignal::LongSpread => 1,
            SpreadSignal::ShortSpread => -1,
        }
    }

    pub fn is_flat(self) -> bool {
        self == SpreadSignal::Flat
    }
}

impl std::fmt::Display for SpreadSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpreadSignal::Flat => write!(f, "FLAT"),
            SpreadSignal::LongSpread => write!(f, "LONG_SPREAD"),
            SpreadSignal::ShortSpread => write!(f, "SHORT_SPREAD"),
        }
    }
}

/// One step of the entry/exit state machine.
///
/// A non-finite z-score forces the state back to flat. Entries are only
/// considered from flat; an open position is held until `|z| <= exit_z`.
pub fn next_signal(prev: SpreadSignal, z: f64, entry_z: f64, exit_z: f64) -> SpreadSignal {
    if !z.is_finite() {
        return SpreadSignal::Flat;
    }
    match prev {
        SpreadSignal::Flat if z <= -entry_z => SpreadSignal::LongSpread,
        SpreadSignal::Flat if z >= entry_z => SpreadSignal::ShortSpread,
        SpreadSignal::Flat => SpreadSignal::Flat,
        _ if z.abs() <= exit_z => SpreadSignal::Flat,
        open => open,
    }
}

/// Runs the state machine over a z-score path in chronological order.
pub fn signal_path(zscores: &[f64], entry_z: f64, exit_z: f64) -> Vec<SpreadSignal> {
    zscores
        .iter()
        .scan(SpreadSignal::Flat, |state, &z| {
            *state = next_signal(*state, z, entry_z, exit_z);
            Some(*state)
        })
        .collect()
}
