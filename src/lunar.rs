//! Moon phase from a closed-form mean lunation.
//!
//! The phase fraction is the fractional number of mean synodic months since
//! a reference new moon, measured in days from 2001-01-01:
//!
//! ```text
//! phase = frac(0.20439731 + days × 0.03386319269)
//! ```
//!
//! `0.03386319269` is `1 / 29.530588…`, so the fraction advances by one full
//! cycle every lunation. Accuracy is a few hours, plenty for a daily panel.
//! Dates are taken at midnight, so `days` is always a whole number here.

use crate::WINDOW_DAYS;
use chrono::{Duration, NaiveDate};
use core::f64::consts::TAU;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase at the epoch, in lunations.
const PHASE_AT_EPOCH: f64 = 0.204_397_31;
/// Lunations per day.
const LUNATIONS_PER_DAY: f64 = 0.033_863_192_69;

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2001, 1, 1).expect("2001-01-01 is a valid date")
}

/// Position in the lunation cycle for `date`, in `[0, 1)`.
///
/// 0 is new moon, 0.5 full moon. Dates before the epoch wrap the same way as
/// dates after it.
pub fn phase_fraction(date: NaiveDate) -> f64 {
    let days = (date - epoch()).num_days() as f64;
    let lunations = PHASE_AT_EPOCH + days * LUNATIONS_PER_DAY;
    let frac = lunations.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if frac >= 1.0 {
        0.0
    } else {
        frac
    }
}

/// Illuminated share of the disc in percent, rounded to one decimal.
pub fn illumination_pct(phase: f64) -> f64 {
    let pct = 100.0 * (1.0 - (TAU * phase).cos()) / 2.0;
    (pct * 10.0).round() / 10.0
}

/// The eight named phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoonPhase {
    New,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    Full,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl MoonPhase {
    pub fn glyph(self) -> &'static str {
        match self {
            MoonPhase::New => "🌑",
            MoonPhase::WaxingCrescent => "🌒",
            MoonPhase::FirstQuarter => "🌓",
            MoonPhase::WaxingGibbous => "🌔",
            MoonPhase::Full => "🌕",
            MoonPhase::WaningGibbous => "🌖",
            MoonPhase::LastQuarter => "🌗",
            MoonPhase::WaningCrescent => "🌘",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MoonPhase::New => "Nouvelle lune",
            MoonPhase::WaxingCrescent => "Lune croissante",
            MoonPhase::FirstQuarter => "Premier quartier",
            MoonPhase::WaxingGibbous => "Gibbeuse croissante",
            MoonPhase::Full => "Pleine lune",
            MoonPhase::WaningGibbous => "Gibbeuse décroissante",
            MoonPhase::LastQuarter => "Dernier quartier",
            MoonPhase::WaningCrescent => "Lune décroissante",
        }
    }
}

impl fmt::Display for MoonPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.glyph(), self.label())
    }
}

/// Start of a half-open bucket `[start, next start)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseBound {
    pub start: f64,
    pub phase: MoonPhase,
}

/// Partition of `[0, 1)` into named phase buckets.
///
/// Buckets are listed by ascending `start`; the first starts at `0.0` and the
/// last one runs up to `1.0`. New moon usually appears twice, once at each
/// end, because the cycle wraps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhasePartition {
    bounds: Vec<PhaseBound>,
}

impl Default for PhasePartition {
    /// Eight buckets with narrow quarters:
    ///
    /// | range        | phase            |
    /// |--------------|------------------|
    /// | [0.00, 0.03) | new              |
    /// | [0.03, 0.22) | waxing crescent  |
    /// | [0.22, 0.27) | first quarter    |
    /// | [0.27, 0.47) | waxing gibbous   |
    /// | [0.47, 0.53) | full             |
    /// | [0.53, 0.73) | waning gibbous   |
    /// | [0.73, 0.78) | last quarter     |
    /// | [0.78, 0.97) | waning crescent  |
    /// | [0.97, 1.00) | new              |
    fn default() -> Self {
        use MoonPhase::*;
        Self::from_table(&[
            (0.0, New),
            (0.03, WaxingCrescent),
            (0.22, FirstQuarter),
            (0.27, WaxingGibbous),
            (0.47, Full),
            (0.53, WaningGibbous),
            (0.73, LastQuarter),
            (0.78, WaningCrescent),
            (0.97, New),
        ])
    }
}

impl PhasePartition {
    /// Six-name table with wide quarters (0.03/0.25/0.48/0.52/0.75/0.97).
    ///
    /// Kept so panels can match older printouts; it has no gibbous-waxing or
    /// waning-crescent bucket.
    pub fn legacy() -> Self {
        use MoonPhase::*;
        Self::from_table(&[
            (0.0, New),
            (0.03, WaxingCrescent),
            (0.25, FirstQuarter),
            (0.48, Full),
            (0.52, WaningGibbous),
            (0.75, LastQuarter),
            (0.97, New),
        ])
    }

    fn from_table(table: &[(f64, MoonPhase)]) -> Self {
        Self {
            bounds: table
                .iter()
                .map(|&(start, phase)| PhaseBound { start, phase })
                .collect(),
        }
    }

    /// Build a partition from explicit buckets, checking that they cover `[0, 1)`.
    pub fn new(bounds: Vec<PhaseBound>) -> Result<Self, String> {
        let partition = Self { bounds };
        partition.validate()?;
        Ok(partition)
    }

    /// Check the partition invariants: non-empty, starts at 0, strictly
    /// increasing, every start below 1.
    pub fn validate(&self) -> Result<(), String> {
        let first = self.bounds.first().ok_or("partition has no buckets")?;
        if first.start != 0.0 {
            return Err(format!("first bucket starts at {}, expected 0", first.start));
        }
        for pair in self.bounds.windows(2) {
            if pair[1].start <= pair[0].start {
                return Err(format!(
                    "bucket starts must increase: {} then {}",
                    pair[0].start, pair[1].start
                ));
            }
        }
        if let Some(last) = self.bounds.last() {
            if last.start >= 1.0 {
                return Err(format!("bucket start {} is not below 1", last.start));
            }
        }
        Ok(())
    }

    pub fn bounds(&self) -> &[PhaseBound] {
        &self.bounds
    }

    /// Phase whose bucket contains `phase`.
    pub fn classify(&self, phase: f64) -> MoonPhase {
        self.bounds
            .iter()
            .take_while(|bound| bound.start <= phase)
            .last()
            .or(self.bounds.first())
            .map_or(MoonPhase::New, |bound| bound.phase)
    }
}

/// Moon data for one calendar day.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoonDay {
    pub date: NaiveDate,
    /// Position in the lunation, `[0, 1)`
    pub phase_fraction: f64,
    /// Illuminated share, `[0, 100]`, one decimal
    pub illumination_pct: f64,
    pub phase: MoonPhase,
}

pub fn moon_day(date: NaiveDate, partition: &PhasePartition) -> MoonDay {
    let phase_fraction = phase_fraction(date);
    MoonDay {
        date,
        phase_fraction,
        illumination_pct: illumination_pct(phase_fraction),
        phase: partition.classify(phase_fraction),
    }
}

/// Moon data for `today` and the following days of the panel window.
pub fn moon_window(today: NaiveDate, partition: &PhasePartition) -> Vec<MoonDay> {
    (0..WINDOW_DAYS as i64)
        .map(|offset| moon_day(today + Duration::days(offset), partition))
        .collect()
}
