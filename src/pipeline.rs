//! # Panel Pipeline
//!
//! Runs the three producers once, in a fixed order, and joins their output by
//! calendar date into a [`RenderModel`] of exactly three [`DayPanel`]s.
//!
//! [`run_pipeline`] does the I/O; [`assemble`] is the pure join and takes the
//! raw producer results, so every degradation path can be exercised without a
//! network.
//!
//! "Today" is the date in the configured location's time zone, the same zone
//! the forecast API is asked to report its days in.

use crate::config::Config;
use crate::forecast::{fetch_forecast, ForecastDay, ForecastError};
use crate::lunar::{moon_window, MoonDay};
use crate::tide_data::{fetch_tides, tides_in_window, TideError};
use crate::{Availability, TideDay, TideEvent, Unavailable, WINDOW_DAYS};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use tracing::{info, warn};

/// Everything the renderer needs for one column.
#[derive(Clone, Debug, PartialEq)]
pub struct DayPanel {
    pub date: NaiveDate,
    /// Weekday and day/month, e.g. `Samedi 19/10`
    pub heading: String,
    pub forecast: Availability<ForecastDay>,
    pub moon: MoonDay,
    pub tides: Availability<Vec<TideEvent>>,
}

/// Output of one run: three panels for today, today+1 and today+2.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderModel {
    pub location: String,
    pub generated_on: NaiveDate,
    pub days: Vec<DayPanel>,
}

/// Fetch everything for today and build the panels.
///
/// Never fails: a producer that cannot deliver leaves
/// [`Unavailable::FetchFailed`] in the slots it would have filled.
pub async fn run_pipeline(config: &Config) -> RenderModel {
    let today = today_in(&config.location.timezone, Utc::now());

    let forecast = fetch_forecast(&config.location, &config.forecast).await;
    if let Err(e) = &forecast {
        warn!("forecast fetch failed: {e}");
    }

    let moons = moon_window(today, &config.moon.partition);

    let tide_page = fetch_tides(&config.tides).await;
    if let Err(e) = &tide_page {
        warn!("tide fetch failed: {e}");
    }

    assemble(today, forecast, moons, tide_page, config)
}

/// Calendar date of `now` in the IANA zone `timezone`.
///
/// An unknown zone name falls back to the host's zone.
pub fn today_in(timezone: &str, now: DateTime<Utc>) -> NaiveDate {
    match timezone.parse::<Tz>() {
        Ok(tz) => now.with_timezone(&tz).date_naive(),
        Err(_) => {
            warn!(timezone = %timezone, "unknown time zone, using the host's");
            now.with_timezone(&Local).date_naive()
        }
    }
}

/// Join producer results by date into the three panels starting at `today`.
///
/// `moons` is the window from [`moon_window`] for the same `today`.
pub fn assemble(
    today: NaiveDate,
    forecast: Result<Vec<ForecastDay>, ForecastError>,
    moons: Vec<MoonDay>,
    tide_page: Result<String, TideError>,
    config: &Config,
) -> RenderModel {
    let tides = tide_days(today, tide_page, config);

    let days = moons
        .into_iter()
        .enumerate()
        .map(|(offset, moon)| {
            let date = today + Duration::days(offset as i64);
            DayPanel {
                date,
                heading: heading(date),
                forecast: forecast_for(&forecast, date),
                moon,
                tides: tides_for(&tides, date),
            }
        })
        .collect::<Vec<_>>();

    let with_tides = days.iter().filter(|day| day.tides.is_available()).count();
    info!(days = days.len(), with_tides, "panels assembled");

    RenderModel {
        location: config.location.name.clone(),
        generated_on: today,
        days,
    }
}

/// Tide groups inside the window, or why there are none at all.
fn tide_days(
    today: NaiveDate,
    tide_page: Result<String, TideError>,
    config: &Config,
) -> Result<Vec<TideDay>, Unavailable> {
    let html = tide_page.map_err(|e| Unavailable::FetchFailed(e.to_string()))?;
    let aligned = tides_in_window(&html, today, &config.tides).ok_or(Unavailable::NoTable)?;
    if aligned.len() < WINDOW_DAYS {
        warn!(found = aligned.len(), "tide table does not cover the whole window");
    }
    Ok(aligned)
}

fn forecast_for(
    forecast: &Result<Vec<ForecastDay>, ForecastError>,
    date: NaiveDate,
) -> Availability<ForecastDay> {
    match forecast {
        Ok(days) => days
            .iter()
            .find(|day| day.date == date)
            .cloned()
            .map_or(Availability::Unavailable(Unavailable::NotInWindow), Availability::Available),
        Err(e) => Availability::Unavailable(Unavailable::FetchFailed(e.to_string())),
    }
}

fn tides_for(
    tides: &Result<Vec<TideDay>, Unavailable>,
    date: NaiveDate,
) -> Availability<Vec<TideEvent>> {
    match tides {
        Ok(days) => days
            .iter()
            .find(|day| day.date == date)
            .map_or(Availability::Unavailable(Unavailable::NotInWindow), |day| {
                Availability::Available(day.events.clone())
            }),
        Err(reason) => Availability::Unavailable(reason.clone()),
    }
}

/// French weekday and day/month, e.g. `Samedi 19/10`.
pub fn heading(date: NaiveDate) -> String {
    let weekday = match date.weekday() {
        Weekday::Mon => "Lundi",
        Weekday::Tue => "Mardi",
        Weekday::Wed => "Mercredi",
        Weekday::Thu => "Jeudi",
        Weekday::Fri => "Vendredi",
        Weekday::Sat => "Samedi",
        Weekday::Sun => "Dimanche",
    };
    format!("{weekday} {}", date.format("%d/%m"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading() {
        let date = NaiveDate::from_ymd_opt(2024, 10, 19).unwrap();
        assert_eq!(heading(date), "Samedi 19/10");
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert_eq!(heading(date), "Lundi 03/06");
    }

    #[test]
    fn test_today_follows_configured_zone() {
        // 22:30 UTC in summer is already the next day in Paris
        let now = NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(22, 30, 0)
            .unwrap()
            .and_utc();
        assert_eq!(
            today_in("Europe/Paris", now),
            NaiveDate::from_ymd_opt(2024, 6, 16).unwrap()
        );
        assert_eq!(today_in("UTC", now), NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
        assert_eq!(
            today_in("America/New_York", now),
            NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
        );
    }

    #[test]
    fn test_forecast_for_missing_date() {
        let forecast: Result<Vec<ForecastDay>, ForecastError> = Ok(Vec::new());
        let date = NaiveDate::from_ymd_opt(2024, 10, 19).unwrap();
        assert_eq!(
            forecast_for(&forecast, date),
            Availability::Unavailable(Unavailable::NotInWindow)
        );
    }
}
