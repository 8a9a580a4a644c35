//! # Date Alignment
//!
//! Tide pages label their rows with free text such as `"Sam. 19 oct."` or
//! `"Dim 20"`. This module turns those labels into calendar dates and keeps
//! only the groups that fall on today, today+1 or today+2.
//!
//! Two strategies are available:
//!
//! - [`AlignmentStrategy::CalendarDate`] reads the day number *and* the French
//!   month name and builds a full date. It is exact across month and year
//!   boundaries.
//! - [`AlignmentStrategy::DayOfMonth`] reads only the day number and compares
//!   it with today's, wrapping at the end of the current month. It works with
//!   labels that omit the month, but it cannot tell `20 oct.` from `20 nov.`:
//!   any label whose day number is in range is accepted, whatever its month.

use crate::{RawTideDay, TideDay, WINDOW_DAYS};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Month name stems as printed on French tide tables, January first.
///
/// A label's month word matches the first stem it contains, so `"janvier"`,
/// `"janv."` and `"janv"` all resolve to January.
pub const MONTH_STEMS: [&str; 12] = [
    "janv", "févr", "mars", "avril", "mai", "juin", "juil", "août", "sept", "oct", "nov", "déc",
];

/// How a raw date label is matched to the panel window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentStrategy {
    /// Day number plus month name, compared as full dates
    #[default]
    CalendarDate,
    /// Day number only, compared with today's day of month
    DayOfMonth,
}

impl AlignmentStrategy {
    /// Calendar date of `label` if it falls within the window starting at `today`.
    pub fn resolve(self, label: &str, today: NaiveDate) -> Option<NaiveDate> {
        let date = match self {
            AlignmentStrategy::CalendarDate => resolve_calendar_date(label, today)?,
            AlignmentStrategy::DayOfMonth => resolve_day_of_month(label, today)?,
        };
        let offset = (date - today).num_days();
        (0..WINDOW_DAYS as i64).contains(&offset).then_some(date)
    }
}

/// Keep the groups whose label falls within `[today, today + 2]`.
///
/// Page order is preserved. When two labels resolve to the same date the first
/// one wins, so the result never holds more than [`WINDOW_DAYS`] entries.
pub fn align_to_window(
    days: Vec<RawTideDay>,
    today: NaiveDate,
    strategy: AlignmentStrategy,
) -> Vec<TideDay> {
    let mut aligned: Vec<TideDay> = Vec::with_capacity(WINDOW_DAYS);
    for day in days {
        let Some(date) = strategy.resolve(&day.label, today) else {
            debug!(label = %day.label, "tide label outside window");
            continue;
        };
        if aligned.iter().any(|kept| kept.date == date) {
            debug!(label = %day.label, %date, "duplicate tide date ignored");
            continue;
        }
        aligned.push(TideDay {
            label: day.label,
            date,
            events: day.events,
        });
        if aligned.len() == WINDOW_DAYS {
            break;
        }
    }
    aligned
}

/// Month number (1-12) for a month word, using [`MONTH_STEMS`].
pub fn month_from_word(word: &str) -> Option<u32> {
    let word = word.to_lowercase();
    MONTH_STEMS
        .iter()
        .position(|stem| word.contains(stem))
        .map(|index| index as u32 + 1)
}

fn resolve_calendar_date(label: &str, today: NaiveDate) -> Option<NaiveDate> {
    let (day, word) = day_and_word(label)?;
    let month = month_from_word(word)?;
    nearest_year_date(today, month, day)
}

fn resolve_day_of_month(label: &str, today: NaiveDate) -> Option<NaiveDate> {
    let day = first_day_number(label)? as i64;
    let mut offset = day - today.day() as i64;
    if offset < 0 {
        offset += days_in_month(today) as i64;
    }
    Some(today + Duration::days(offset))
}

/// Build `day/month` in the year that puts it closest to `today`.
///
/// A page read on 31 December that lists `1 janv.` means next January.
fn nearest_year_date(today: NaiveDate, month: u32, day: u32) -> Option<NaiveDate> {
    let date = NaiveDate::from_ymd_opt(today.year(), month, day)?;
    let offset = (date - today).num_days();
    if offset < -182 {
        NaiveDate::from_ymd_opt(today.year() + 1, month, day)
    } else if offset > 182 {
        NaiveDate::from_ymd_opt(today.year() - 1, month, day)
    } else {
        Some(date)
    }
}

fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|next| next.pred_opt())
        .map_or(31, |last| last.day())
}

/// First "1-2 digits, whitespace, letters" group of a label.
///
/// Mirrors a leftmost regex search: every start position is tried in turn and
/// a two-digit day is preferred over a one-digit one.
fn day_and_word(label: &str) -> Option<(u32, &str)> {
    let chars: Vec<(usize, char)> = label.char_indices().collect();
    for start in 0..chars.len() {
        for len in [2, 1] {
            if let Some(found) = day_word_at(label, &chars, start, len) {
                return Some(found);
            }
        }
    }
    None
}

fn day_word_at<'a>(
    label: &'a str,
    chars: &[(usize, char)],
    start: usize,
    digits: usize,
) -> Option<(u32, &'a str)> {
    let digit_end = start + digits;
    if digit_end > chars.len() || !chars[start..digit_end].iter().all(|(_, c)| c.is_ascii_digit()) {
        return None;
    }
    let mut pos = digit_end;
    while pos < chars.len() && chars[pos].1.is_whitespace() {
        pos += 1;
    }
    if pos == digit_end {
        return None;
    }
    let word_start = pos;
    while pos < chars.len() && chars[pos].1.is_alphabetic() {
        pos += 1;
    }
    if pos == word_start {
        return None;
    }
    let byte = |index: usize| chars.get(index).map_or(label.len(), |(b, _)| *b);
    let day = label[byte(start)..byte(digit_end)].parse().ok()?;
    Some((day, &label[byte(word_start)..byte(pos)]))
}

/// First one- or two-digit number of a label.
fn first_day_number(label: &str) -> Option<u32> {
    let digits: String = label
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .take(2)
        .collect();
    digits.parse().ok()
}
