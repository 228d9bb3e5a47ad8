use crate::cat::CatTool;
use crate::error::Result;
use crate::news::NewsTool;
use crate::traits::{Tool, to_llm_tool_def};
use crate::weather::WeatherTool;

/// Descriptors offered to the model with every initial request, in a fixed order.
pub fn registry(
    news: &NewsTool,
    weather: &WeatherTool,
    cat: &CatTool,
) -> Result<Vec<bb_llm::ToolDefinition>> {
    [news.spec(), weather.spec(), cat.spec()]
        .into_iter()
        .map(to_llm_tool_def)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::WeatherUnits;

    fn tools() -> (NewsTool, WeatherTool, CatTool) {
        let http = reqwest::Client::new();
        (
            NewsTool::new(http.clone(), "n", "http://news.invalid").expect("news"),
            WeatherTool::new(http.clone(), "w", "http://weather.invalid", WeatherUnits::Imperial)
                .expect("weather"),
            CatTool::new(http, "c", "http://cat.invalid").expect("cat"),
        )
    }

    fn required(def: &bb_llm::ToolDefinition) -> Vec<String> {
        def.parameters["required"]
            .as_array()
            .expect("required array")
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    #[test]
    fn registry_lists_three_tools_in_order() {
        let (news, weather, cat) = tools();
        let defs = registry(&news, &weather, &cat).expect("registry");
        let names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["get_news", "get_weather", "get_cat_img"]);
        assert_eq!(defs[0].description, "Get the latest news headlines");
        assert_eq!(defs[1].description, "Get the current weather in a given location");
        assert_eq!(defs[2].description, "Get a random cat image");
    }

    #[test]
    fn registry_schemas_match_argument_types() {
        let (news, weather, cat) = tools();
        let defs = registry(&news, &weather, &cat).expect("registry");
        assert_eq!(required(&defs[0]), vec!["category"]);
        assert_eq!(required(&defs[1]), vec!["location"]);
        assert!(required(&defs[2]).is_empty());
        for def in &defs {
            assert_eq!(def.parameters["type"], "object");
            assert_eq!(def.parameters["additionalProperties"], false);
        }
        assert_eq!(defs[1].parameters["properties"]["location"]["type"], "string");
    }
}
