//! Plain-text and JSON rendering for the terminal.

use chrono::Local;
use geoclima_core::{
    Coordinates, Enriched, EnrichSummary, Field, IconSize, LocationRecord, Stats, WeatherOutcome,
    WeatherSnapshot,
};
use serde_json::{Value, json};

pub fn print_options(field: Field, values: &[&str]) {
    println!("{field} ({}):", values.len());
    for value in values {
        println!("  {value}");
    }
}

pub fn print_table(rows: &[(usize, &LocationRecord)]) {
    println!(
        "{:>5}  {:<32} {:<20} {:<14} {:<14} {:<16} {:>11} {:>11}",
        "#", "Name", "Level", "Department", "Province", "District", "Latitude", "Longitude"
    );

    for (index, record) in rows {
        println!(
            "{:>5}  {:<32} {:<20} {:<14} {:<14} {:<16} {:>11.6} {:>11.6}",
            index,
            clip(&record.name, 32),
            clip(&record.level, 20),
            clip(&record.department, 14),
            clip(&record.province, 14),
            clip(&record.district, 16),
            record.coordinates.latitude(),
            record.coordinates.longitude(),
        );
    }

    let stats = Stats::of(rows.iter().map(|(_, r)| *r));
    println!();
    println!("Total schools:     {}", stats.total);
    println!("Levels:            {}", stats.levels);
    println!("Districts covered: {}", stats.districts);
    println!("Provinces:         {}", stats.provinces);
}

pub fn print_detail(enriched: &Enriched<'_>) {
    let record = enriched.record;

    println!("{}", record.name);
    println!("  Modular code:     {}", record.modular_code);
    println!("  Level/modality:   {}", record.level);
    println!("  Address:          {}", record.address);
    println!("  Department:       {}", record.department);
    println!("  Province:         {}", record.province);
    println!("  District:         {}", record.district);
    println!(
        "  Populated center: {} ({})",
        record.populated_center.as_deref().unwrap_or("-"),
        record.populated_center_code
    );
    println!("  Location:         {}", record.coordinates);
    println!();

    match &enriched.weather {
        WeatherOutcome::Available(w) => print_snapshot(w),
        WeatherOutcome::Unavailable(u) => {
            println!("Weather data unavailable for this location: {}", u.message);
        }
    }

    println!();
    println!("Consulted at {}", Local::now().format("%d/%m/%Y %H:%M"));
}

fn print_snapshot(w: &WeatherSnapshot) {
    println!("{}", w.description);
    println!("  Temperature:  {} °C (feels like {} °C)", w.temperature_c, w.feels_like_c);
    println!("  Humidity:     {}%", w.humidity_pct);
    println!("  Pressure:     {} hPa", w.pressure_hpa);
    println!("  Wind:         {} m/s", w.wind_speed_mps);
    println!("  Visibility:   {}", w.visibility_display());
    println!("  Cloudiness:   {}", w.cloudiness_display());
    println!("  Sunrise:      {}", w.sunrise);
    println!("  Sunset:       {}", w.sunset);
    println!("  Icon:         {}", w.icon_url(IconSize::Large));
}

/// One line per marker.
pub fn print_map(center: Option<Coordinates>, batch: &[Enriched<'_>]) {
    if let Some(center) = center {
        println!("Map center: {center}");
    }

    for enriched in batch {
        let record = enriched.record;
        let category = record.level_category();
        let weather = match &enriched.weather {
            WeatherOutcome::Available(w) => format!(
                "{} °C | {} | feels {} °C | humidity {}% | wind {} m/s",
                w.temperature_c, w.description, w.feels_like_c, w.humidity_pct, w.wind_speed_mps
            ),
            WeatherOutcome::Unavailable(_) => "weather unavailable".to_string(),
        };

        println!(
            "[{}/{}] {} ({}) {} :: {}",
            category.marker_color(),
            category.marker_icon(),
            record.name,
            record.level,
            record.coordinates,
            weather
        );
    }

    let summary = EnrichSummary::of(batch);
    println!();
    println!(
        "{} markers, {} with weather, {} unavailable",
        batch.len(),
        summary.available,
        summary.unavailable
    );
}

/// Marker list for a map front end.
pub fn map_json(center: Option<Coordinates>, batch: &[Enriched<'_>]) -> Value {
    let markers: Vec<Value> = batch
        .iter()
        .map(|enriched| {
            let category = enriched.record.level_category();
            json!({
                "record": enriched.record,
                "marker": {
                    "category": category,
                    "color": category.marker_color(),
                    "icon": category.marker_icon(),
                },
                "weather": enriched.weather,
                "weather_icon_url": enriched
                    .weather
                    .snapshot()
                    .map(|w| w.icon_url(IconSize::Small)),
            })
        })
        .collect();

    json!({
        "center": center,
        "summary": EnrichSummary::of(batch),
        "markers": markers,
    })
}

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let kept: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoclima_core::Unavailable;

    fn record() -> LocationRecord {
        LocationRecord {
            name: "IE 001".into(),
            modular_code: "0123456".into(),
            level: "Secundaria".into(),
            address: String::new(),
            department: "Lima".into(),
            province: "Lima".into(),
            district: "Ate".into(),
            populated_center_code: "1".into(),
            populated_center: None,
            coordinates: Coordinates::new(-12.05, -77.03).unwrap(),
        }
    }

    #[test]
    fn map_json_carries_marker_style_and_outcome() {
        let record = record();
        let batch = vec![Enriched {
            record: &record,
            weather: WeatherOutcome::Unavailable(Unavailable {
                status: Some(401),
                message: "Invalid API key".into(),
            }),
        }];

        let value = map_json(Some(record.coordinates), &batch);

        assert_eq!(value["markers"][0]["marker"]["color"], "orange");
        assert_eq!(value["markers"][0]["marker"]["icon"], "graduation-cap");
        assert_eq!(value["markers"][0]["weather"]["state"], "unavailable");
        assert_eq!(value["markers"][0]["weather_icon_url"], Value::Null);
        assert_eq!(value["summary"]["unavailable"], 1);
        assert_eq!(value["center"]["latitude"], -12.05);
    }

    #[test]
    fn clip_counts_characters() {
        assert_eq!(clip("Huancayo", 10), "Huancayo");
        assert_eq!(clip("Señor de los Milagros", 8), "Señor d…");
    }
}
