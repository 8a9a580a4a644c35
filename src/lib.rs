//! # Tide Panel Core Library
//!
//! This library gathers everything needed to draw a three-day coastal panel:
//! tide times scraped from a French tide-table page, a daily weather forecast,
//! and the phase of the moon computed locally.
//!
//! ## Data Flow
//!
//! 1. **Forecast**: one JSON request → three [`forecast::ForecastDay`] records
//! 2. **Moon**: closed-form lunation arithmetic → three [`lunar::MoonDay`] records
//! 3. **Tides**: one HTML request → table rows → [`TideEvent`]s grouped by the
//!    page's own date labels → aligned to today, today+1 and today+2
//! 4. **Join**: [`pipeline::assemble`] keys all three by calendar date into a
//!    [`pipeline::RenderModel`] that the renderer prints
//!
//! Every run starts from scratch. Nothing is cached and nothing is retried:
//! a producer that fails leaves an explicit [`Unavailable`] marker in the
//! panels it would have filled, and the other producers are unaffected.
//!
//! ## Core Types
//!
//! The tide types live here because both the parser and the alignment step
//! share them:
//! - [`TideEvent`]: one high or low water with its time, height and coefficient
//! - [`RawTideDay`]: events grouped under the label printed on the page
//! - [`TideDay`]: a group whose label was resolved to a calendar date
//! - [`Availability`]: data or the reason it is missing

use chrono::NaiveDate;
use std::fmt;

pub mod alignment;
pub mod config;
pub mod forecast;
pub mod lunar;
pub mod pipeline;
pub mod renderer;
pub mod tide_data;

#[cfg(test)]
mod tests;

/// Number of days covered by one panel: today and the two following days.
pub const WINDOW_DAYS: usize = 3;

/// High or low water.
///
/// The tide table does not say which is which. The kind is assigned from the
/// position of the event inside its row: even positions are low water, odd
/// positions high water. Heights are never consulted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TideKind {
    LowTide,
    HighTide,
}

impl TideKind {
    /// Kind of the `index`-th event of a row.
    pub fn from_position(index: usize) -> Self {
        if index % 2 == 0 {
            TideKind::LowTide
        } else {
            TideKind::HighTide
        }
    }

    /// Label used on French tide tables.
    pub fn label(self) -> &'static str {
        match self {
            TideKind::LowTide => "Basse mer",
            TideKind::HighTide => "Pleine mer",
        }
    }
}

/// A single tide event as printed on the page.
///
/// Values are kept verbatim. A token that could not be found in its cell is
/// replaced by [`PLACEHOLDER`] (time, height) or `None` (coefficient).
///
/// # Example
/// ```
/// use tide_panel_lib::{TideEvent, TideKind};
///
/// let low = TideEvent {
///     time: "03h12".to_string(),
///     height: "1,45m".to_string(),
///     coefficient: Some("87".to_string()),
///     kind: TideKind::LowTide,
/// };
/// assert_eq!(low.kind.label(), "Basse mer");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TideEvent {
    /// Time of day, `HHhMM`
    pub time: String,
    /// Height with unit, e.g. `7,85m`
    pub height: String,
    /// Tide coefficient (2 or 3 digits) when the table gives one
    pub coefficient: Option<String>,
    pub kind: TideKind,
}

/// Value used for a time or height token missing from its cell.
pub const PLACEHOLDER: &str = "?";

/// Events grouped under a raw date label, in page order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawTideDay {
    /// Date label exactly as it appears on the page (locale dependent)
    pub label: String,
    pub events: Vec<TideEvent>,
}

/// Events for a label that was resolved to a calendar date inside the window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TideDay {
    pub label: String,
    pub date: NaiveDate,
    pub events: Vec<TideEvent>,
}

/// Why a piece of a panel has no data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Unavailable {
    /// The request for this producer failed
    FetchFailed(String),
    /// The tide page was fetched but contained no tide table
    NoTable,
    /// Data was fetched but nothing matched this date
    NotInWindow,
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unavailable::FetchFailed(reason) => write!(f, "fetch failed: {reason}"),
            Unavailable::NoTable => write!(f, "no tide table on page"),
            Unavailable::NotInWindow => write!(f, "no entry for this date"),
        }
    }
}

/// Data for one panel slot, or the reason it is missing.
#[derive(Clone, Debug, PartialEq)]
pub enum Availability<T> {
    Available(T),
    Unavailable(Unavailable),
}

impl<T> Availability<T> {
    pub fn available(&self) -> Option<&T> {
        match self {
            Availability::Available(value) => Some(value),
            Availability::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available(_))
    }
}
