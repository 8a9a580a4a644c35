//! # Panel Rendering
//!
//! Renders a [`RenderModel`] as three side-by-side text columns, one per day,
//! for terminal output. Each column is built independently and the columns are
//! then zipped line by line.

use crate::forecast::ForecastDay;
use crate::lunar::MoonDay;
use crate::pipeline::{DayPanel, RenderModel};
use crate::{Availability, TideEvent, Unavailable};

/// Width of one column in characters.
const COLUMN_WIDTH: usize = 40;
/// Space between columns.
const GUTTER: &str = "  ";

/// Render the panel to stdout.
pub fn draw_ascii(model: &RenderModel) {
    print!("{}", render_text(model));
}

/// Render the panel to a string.
pub fn render_text(model: &RenderModel) -> String {
    let mut out = format!(
        "🌊 Marées, Soleil, Météo & Lune - {}\nPrévisions sur 3 jours – {}\n\n",
        model.location,
        model.generated_on.format("%d/%m/%Y")
    );

    let columns: Vec<Vec<String>> = model.days.iter().map(column).collect();
    let height = columns.iter().map(Vec::len).max().unwrap_or(0);

    for row in 0..height {
        let line = columns
            .iter()
            .map(|col| {
                let cell = col.get(row).map_or("", String::as_str);
                format!("{:<width$}", cell, width = COLUMN_WIDTH)
            })
            .collect::<Vec<_>>()
            .join(GUTTER);
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn column(day: &DayPanel) -> Vec<String> {
    let divider = "─".repeat(COLUMN_WIDTH - 2);
    let mut lines = vec![day.heading.clone(), divider.clone()];

    match &day.forecast {
        Availability::Available(forecast) => {
            lines.push(format!("🌞 Lever du soleil : {}", forecast.sunrise));
            lines.push(format!("🌇 Coucher du soleil : {}", forecast.sunset));
        }
        Availability::Unavailable(reason) => {
            lines.push(format!("🌞 Soleil indisponible {}", reason_text(reason)));
        }
    }

    lines.push(divider.clone());
    lines.push(moon_line(&day.moon));
    lines.push(divider.clone());

    match &day.forecast {
        Availability::Available(forecast) => lines.extend(weather_lines(forecast)),
        Availability::Unavailable(reason) => {
            lines.push(format!("❔ Météo indisponible {}", reason_text(reason)));
        }
    }

    lines.push(divider);

    match &day.tides {
        Availability::Available(events) if !events.is_empty() => {
            lines.extend(events.iter().map(tide_line));
        }
        Availability::Available(_) => lines.push("🌊 Aucune marée listée.".to_string()),
        Availability::Unavailable(reason) => {
            lines.push("🌊 Données marées indisponibles.".to_string());
            lines.push(format!("   {}", reason_text(reason)));
        }
    }

    lines
}

fn moon_line(moon: &MoonDay) -> String {
    format!("{} – {:.0}% éclairée", moon.phase, moon.illumination_pct)
}

fn weather_lines(forecast: &ForecastDay) -> Vec<String> {
    vec![
        forecast.weather_text().to_string(),
        format!("🌡️ {}°C – {}°C", forecast.tmin, forecast.tmax),
        format!(
            "💨 {} km/h ({})",
            forecast.wind_speed,
            forecast.wind_cardinal()
        ),
    ]
}

fn tide_line(event: &TideEvent) -> String {
    match &event.coefficient {
        Some(coefficient) => format!(
            "{} à {} → {} (Coeff {})",
            event.kind.label(),
            event.time,
            event.height,
            coefficient
        ),
        None => format!("{} à {} → {}", event.kind.label(), event.time, event.height),
    }
}

fn reason_text(reason: &Unavailable) -> &'static str {
    match reason {
        Unavailable::FetchFailed(_) => "(échec du téléchargement)",
        Unavailable::NoTable => "(tableau introuvable)",
        Unavailable::NotInWindow => "(date absente)",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lunar::{moon_day, PhasePartition};
    use crate::TideKind;
    use chrono::NaiveDate;

    fn panel(tides: Availability<Vec<TideEvent>>) -> DayPanel {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        DayPanel {
            date,
            heading: "Samedi 15/06".to_string(),
            forecast: Availability::Available(ForecastDay {
                date,
                sunrise: "05:45".to_string(),
                sunset: "22:01".to_string(),
                tmax: 19.4,
                tmin: 11.0,
                weather_code: 3,
                wind_speed: 22.3,
                wind_direction_deg: 250,
            }),
            moon: moon_day(date, &PhasePartition::default()),
            tides,
        }
    }

    fn model(days: Vec<DayPanel>) -> RenderModel {
        RenderModel {
            location: "Le Havre".to_string(),
            generated_on: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            days,
        }
    }

    #[test]
    fn test_tide_line() {
        let event = TideEvent {
            time: "09h25".to_string(),
            height: "7,85m".to_string(),
            coefficient: Some("87".to_string()),
            kind: TideKind::HighTide,
        };
        assert_eq!(tide_line(&event), "Pleine mer à 09h25 → 7,85m (Coeff 87)");
    }

    #[test]
    fn test_render_available_panel() {
        let events = vec![TideEvent {
            time: "03h12".to_string(),
            height: "1,45m".to_string(),
            coefficient: None,
            kind: TideKind::LowTide,
        }];
        let text = render_text(&model(vec![panel(Availability::Available(events))]));
        assert!(text.contains("Le Havre"));
        assert!(text.contains("15/06/2024"));
        assert!(text.contains("Samedi 15/06"));
        assert!(text.contains("Lever du soleil : 05:45"));
        assert!(text.contains("Basse mer à 03h12 → 1,45m"));
        assert!(text.contains("💨 22.3 km/h (O)"));
        assert!(text.contains("% éclairée"));
    }

    #[test]
    fn test_render_unavailable_tides() {
        let text = render_text(&model(vec![
            panel(Availability::Unavailable(Unavailable::NoTable)),
            panel(Availability::Unavailable(Unavailable::NotInWindow)),
        ]));
        assert!(text.contains("Données marées indisponibles."));
        assert!(text.contains("(tableau introuvable)"));
        assert!(text.contains("(date absente)"));
    }

    #[test]
    fn test_columns_side_by_side() {
        let text = render_text(&model(vec![
            panel(Availability::Available(Vec::new())),
            panel(Availability::Available(Vec::new())),
            panel(Availability::Available(Vec::new())),
        ]));
        let heading_line = text
            .lines()
            .find(|line| line.starts_with("Samedi 15/06"))
            .unwrap();
        assert_eq!(heading_line.matches("Samedi 15/06").count(), 3);
        assert!(text.contains("Aucune marée listée."));
    }
}
