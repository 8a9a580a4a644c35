//! # Tide Table Fetching and Extraction
//!
//! This module downloads a French tide-table page and turns its HTML table into
//! [`TideEvent`]s grouped by the page's own date labels.
//!
//! ## Data Source
//!
//! - **URL**: configurable, `https://maree.info/19` (Le Havre) by default
//! - **Format**: HTML table; the first column holds a date label on the first
//!   row of each day, the next three columns hold the day's times, heights
//!   and coefficients as free text
//!
//! ```html
//! <table>
//!   <tr><th>Date</th><th>Heure</th><th>Hauteur</th><th>Coeff.</th></tr>
//!   <tr><td>Sam. 19 oct.</td><td>03h12 09h25 15h40 21h55</td>
//!       <td>1,45m 7,85m 1,60m 7,70m</td><td>87 85</td></tr>
//! </table>
//! ```
//!
//! ## Processing Pipeline
//!
//! 1. **Fetch**: one HTTP GET with the configured User-Agent and timeout
//! 2. **Locate**: first table whose text holds both column markers
//! 3. **Group**: rows are grouped under the last non-empty first cell
//! 4. **Tokenize**: times, heights and coefficients are scanned out of their
//!    cells and paired by position
//! 5. **Align**: labels are resolved to dates and cut to the 3-day window
//!    (see [`crate::alignment`])
//!
//! ## Error Handling
//!
//! Only the fetch can fail. A page without a matching table gives `None` from
//! [`parse_tide_table`] and an empty list from [`extract_tides`]; a cell with
//! unexpected text yields placeholder tokens instead of dropping the row.

use crate::alignment::align_to_window;
use crate::config::TideConfig;
use crate::{RawTideDay, TideDay, TideEvent, TideKind, PLACEHOLDER};
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur while fetching the tide page.
#[derive(Error, Debug)]
pub enum TideError {
    /// HTTP request failed (network, timeout, or non-2xx status)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Text markers identifying the tide table among the page's tables.
#[derive(Clone, Copy, Debug)]
pub struct TableMarkers<'a> {
    pub date: &'a str,
    pub time: &'a str,
}

impl<'a> TableMarkers<'a> {
    pub fn from_config(config: &'a TideConfig) -> Self {
        TableMarkers {
            date: &config.date_marker,
            time: &config.time_marker,
        }
    }
}

/// Download the tide page.
///
/// No retries: a transport error, a timeout or a non-2xx status is returned
/// as [`TideError::Http`] and the caller decides what to show instead.
///
/// # Example
/// ```no_run
/// use tide_panel_lib::config::Config;
/// use tide_panel_lib::tide_data::fetch_tides;
///
/// # async fn run() {
/// let config = Config::default();
/// match fetch_tides(&config.tides).await {
///     Ok(html) => println!("{} bytes", html.len()),
///     Err(err) => eprintln!("tide page unavailable: {err}"),
/// }
/// # }
/// ```
pub async fn fetch_tides(config: &TideConfig) -> Result<String, TideError> {
    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    info!(url = %config.url, "fetching tide table");
    let html = client
        .get(config.url.as_str())
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    debug!(bytes = html.len(), "tide page received");
    Ok(html)
}

/// Parse the page and keep the groups that fall within the window starting at `today`.
///
/// Returns an empty list when the page has no tide table; use
/// [`tides_in_window`] to tell that case apart from an empty window.
pub fn extract_tides(html: &str, today: NaiveDate, config: &TideConfig) -> Vec<TideDay> {
    tides_in_window(html, today, config).unwrap_or_default()
}

/// Like [`extract_tides`], but `None` when the page has no tide table.
pub fn tides_in_window(html: &str, today: NaiveDate, config: &TideConfig) -> Option<Vec<TideDay>> {
    parse_tide_table(html, TableMarkers::from_config(config))
        .map(|days| align_to_window(days, today, config.alignment))
}

/// Group the events of the tide table by their raw date label, in page order.
///
/// Returns `None` if no table contains both markers.
pub fn parse_tide_table(html: &str, markers: TableMarkers<'_>) -> Option<Vec<RawTideDay>> {
    let doc = Html::parse_document(html);
    let table_sel = Selector::parse("table").expect("CSS selector should be valid");
    let row_sel = Selector::parse("tr").expect("CSS selector should be valid");
    let cell_sel = Selector::parse("td, th").expect("CSS selector should be valid");

    let table = doc.select(&table_sel).find(|table| {
        let text: String = table.text().collect();
        text.contains(markers.date) && text.contains(markers.time)
    });
    let Some(table) = table else {
        debug!("no table with tide markers found");
        return None;
    };

    let mut days: Vec<RawTideDay> = Vec::new();
    let mut current: Option<usize> = None;

    for row in table.select(&row_sel) {
        let cols: Vec<String> = row.select(&cell_sel).map(cell_text).collect();
        let Some(first) = cols.first() else {
            continue;
        };

        // Header row
        if first.contains(markers.date) && cols.join(" ").contains(markers.time) {
            continue;
        }

        if !first.is_empty() {
            current = Some(start_group(&mut days, first));
        }

        if cols.len() >= 4 {
            if let Some(index) = current {
                days[index]
                    .events
                    .extend(pair_tokens(&cols[1], &cols[2], &cols[3]));
            }
        }
    }

    debug!(groups = days.len(), "parsed tide table");
    Some(days)
}

/// Open a group for `label`, or restart the existing one with that label.
fn start_group(days: &mut Vec<RawTideDay>, label: &str) -> usize {
    if let Some(index) = days.iter().position(|day| day.label == label) {
        days[index].events.clear();
        return index;
    }
    days.push(RawTideDay {
        label: label.to_string(),
        events: Vec::new(),
    });
    days.len() - 1
}

/// Text of a cell: every text node trimmed, empty ones dropped, joined by a space.
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Pair the tokens of a row's time, height and coefficient cells by position.
///
/// As many events as the longer of the time and height lists are produced;
/// missing times and heights become [`PLACEHOLDER`], missing coefficients `None`.
pub fn pair_tokens(times: &str, heights: &str, coefficients: &str) -> Vec<TideEvent> {
    let times = time_tokens(times);
    let heights = height_tokens(heights);
    let coefficients = coefficient_tokens(coefficients);

    (0..times.len().max(heights.len()))
        .map(|i| TideEvent {
            time: times.get(i).map_or(PLACEHOLDER, String::as_str).to_string(),
            height: heights.get(i).map_or(PLACEHOLDER, String::as_str).to_string(),
            coefficient: coefficients.get(i).cloned(),
            kind: TideKind::from_position(i),
        })
        .collect()
}

/// Every `DDhDD` token, scanning left to right without overlap.
pub fn time_tokens(text: &str) -> Vec<String> {
    scan(text, |chars| {
        let matches = chars.len() >= 5
            && chars[0].is_ascii_digit()
            && chars[1].is_ascii_digit()
            && chars[2] == 'h'
            && chars[3].is_ascii_digit()
            && chars[4].is_ascii_digit();
        matches.then_some(5)
    })
}

/// Every `D,D+m` token (one digit, comma, digits, metre sign).
pub fn height_tokens(text: &str) -> Vec<String> {
    scan(text, |chars| {
        if chars.len() < 4 || !chars[0].is_ascii_digit() || chars[1] != ',' {
            return None;
        }
        let decimals = chars[2..].iter().take_while(|c| c.is_ascii_digit()).count();
        let unit = 2 + decimals;
        (decimals > 0 && chars.get(unit) == Some(&'m')).then_some(unit + 1)
    })
}

/// Every run of 2 or 3 digits; longer runs are split greedily.
pub fn coefficient_tokens(text: &str) -> Vec<String> {
    scan(text, |chars| {
        let digits = chars.iter().take(3).take_while(|c| c.is_ascii_digit()).count();
        (digits >= 2).then_some(digits)
    })
}

/// Leftmost, non-overlapping scan: `match_at` returns the token length found
/// at the head of the slice, if any.
fn scan(text: &str, match_at: impl Fn(&[char]) -> Option<usize>) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < chars.len() {
        match match_at(&chars[pos..]) {
            Some(len) => {
                tokens.push(chars[pos..pos + len].iter().collect());
                pos += len;
            }
            None => pos += 1,
        }
    }
    tokens
}
