// steward-cli/src/tools/weather.rs
use anyhow::Result;
use serde::Deserialize;

use steward_core::{handler_fn, ToolInput, ToolParameter, ToolParametersDefinition, ToolSpec};

#[derive(Deserialize)]
struct WeatherParams {
    location: String,
}

/// Canned conditions for a handful of cities.
pub fn get_weather(location: &str) -> String {
    let conditions = match location.to_lowercase().as_str() {
        "san francisco" => "☁️ Foggy, 58°F",
        "new york" => "☀️ Sunny, 72°F",
        "london" => "🌧️ Rainy, 55°F",
        "tokyo" => "🌤️ Clear, 68°F",
        "paris" => "☁️ Cloudy, 62°F",
        _ => return format!("Weather data not available for {}", location),
    };
    conditions.to_string()
}

pub fn get_weather_tool() -> ToolSpec {
    ToolSpec::new(
        "get_weather",
        "Get the current weather for a city. Returns temperature and conditions.",
        ToolParametersDefinition::new().property(
            "location",
            ToolParameter::string("The city name (e.g., 'San Francisco', 'Tokyo')"),
            true,
        ),
        handler_fn(|input: ToolInput| -> Result<String> {
            let params: WeatherParams = input.parse()?;
            Ok(get_weather(&params.location))
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_weather() {
        assert_eq!(get_weather("Tokyo"), "🌤️ Clear, 68°F");
        assert_eq!(get_weather("SAN FRANCISCO"), "☁️ Foggy, 58°F");
        assert_eq!(get_weather("Atlantis"), "Weather data not available for Atlantis");
    }
}
