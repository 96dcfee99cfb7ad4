use std::io::Write;

use anyhow::Context;
use weather_core::DashboardView;

/// Print the view to stdout, as text or as one JSON document.
pub fn print(view: &DashboardView, json: bool) -> anyhow::Result<()> {
    let rendered = if json {
        serde_json::to_string_pretty(view).context("Failed to serialize dashboard")?
    } else {
        render_text(view)
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}").context("Failed to write to stdout")?;
    Ok(())
}

pub fn render_text(view: &DashboardView) -> String {
    let mut out = String::new();

    if !view.error.is_empty() {
        out.push_str(&format!("! {}\n\n", view.error));
    }

    out.push_str(&view.location);
    out.push('\n');
    if !view.date.is_empty() {
        out.push_str(&view.date);
        out.push('\n');
    }

    let temperature = if view.has_data() {
        format!("{} °C", view.temperature)
    } else {
        view.temperature.clone()
    };
    out.push_str(&format!("Temperature: {temperature}"));
    if !view.description.is_empty() {
        out.push_str(&format!("  {}", view.description));
    }
    out.push('\n');
    out.push_str(&format!(
        "Humidity: {}  Wind: {}\n",
        view.humidity, view.wind_speed
    ));
    if !view.icon_url.is_empty() {
        out.push_str(&format!("Icon: {}\n", view.icon_url));
    }

    if !view.forecast.is_empty() {
        out.push_str("\nForecast\n");
        for tile in &view.forecast {
            out.push_str(&format!(
                "  {:<4}{:>4} °C  {}\n",
                tile.day, tile.temperature, tile.icon_alt
            ));
        }
    }

    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use weather_core::ForecastTile;

    fn rendered_view() -> DashboardView {
        DashboardView {
            location: "London, GB".into(),
            date: "Monday, January 15, 2024".into(),
            temperature: "27.0".into(),
            icon_url: "https://openweathermap.org/img/wn/10d@2x.png".into(),
            icon_alt: "light rain".into(),
            description: "Light Rain".into(),
            humidity: "81%".into(),
            wind_speed: "4.12 m/s".into(),
            forecast: vec![ForecastTile {
                day: "Tue".into(),
                icon_url: "https://openweathermap.org/img/wn/04d.png".into(),
                icon_alt: "broken clouds".into(),
                temperature: "9".into(),
            }],
            error: String::new(),
        }
    }

    #[test]
    fn renders_full_dashboard() {
        let text = render_text(&rendered_view());

        assert_eq!(
            text,
            "London, GB\n\
             Monday, January 15, 2024\n\
             Temperature: 27.0 °C  Light Rain\n\
             Humidity: 81%  Wind: 4.12 m/s\n\
             Icon: https://openweathermap.org/img/wn/10d@2x.png\n\
             \n\
             Forecast\n  \
             Tue    9 °C  broken clouds"
        );
    }

    #[test]
    fn renders_placeholders_with_error_first() {
        let view = DashboardView {
            error: "City not found. Please try again.".into(),
            ..DashboardView::placeholder()
        };

        let text = render_text(&view);

        assert!(text.starts_with("! City not found. Please try again.\n\n---\n"));
        assert!(text.contains("Temperature: ---\n"));
        assert!(text.ends_with("Humidity: ---  Wind: ---"));
        assert!(!text.contains("°C"));
    }

    #[test]
    fn json_output_has_all_fields() {
        let value = serde_json::to_value(rendered_view()).unwrap();
        for field in [
            "location",
            "date",
            "temperature",
            "icon_url",
            "description",
            "humidity",
            "wind_speed",
            "forecast",
            "error",
        ] {
            assert!(value.get(field).is_some(), "missing field: {field}");
        }
    }
}
