//! Query string construction for the responses endpoint.
//!
//! `build_query` is pure: identical filter states always produce identical
//! strings. Parameter order is fixed and map-backed fields iterate in sorted
//! order, so nothing depends on hashing.

use url::form_urlencoded;

use crate::filter::FilterState;

/// Path of the paginated responses endpoint for one question.
pub fn responses_path(consultation_slug: &str, question_slug: &str) -> String {
    let consultation = encode_segment(consultation_slug);
    let question = encode_segment(question_slug);
    format!("/consultations/{consultation}/responses/{question}/json")
}

fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Serialize a filter state into the backend's query string.
///
/// Empty values are omitted entirely. Only the first selected value of each
/// demographic category (the one picked earliest) is sent; the backend
/// contract accepts a single value per category.
pub fn build_query(state: &FilterState) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());

    if !state.search_value().is_empty() {
        query.append_pair("searchValue", state.search_value());
        query.append_pair("searchMode", &state.search_mode().to_string());
    }

    if !state.theme_filters().is_empty() {
        let joined = state
            .theme_filters()
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");
        query.append_pair("themeFilters", &joined);
    }

    if state.evidence_rich_only() {
        query.append_pair("evidenceRich", "true");
    }

    query.append_pair("themesSortType", &state.theme_sort_key().to_string());
    query.append_pair(
        "themesSortDirection",
        &state.theme_sort_direction().to_string(),
    );

    for (category, values) in state.demo_filters() {
        if let Some(first) = values.first() {
            query.append_pair("demoFilters", &format!("{category}:{first}"));
        }
    }

    query.append_pair("page", &state.page().to_string());
    query.append_pair("page_size", &state.page_size().to_string());

    query.finish()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::filter::{DemoFilters, SearchMode, SortDirection, ThemeSortKey};

    fn demo(category: &str, values: &[&str]) -> DemoFilters {
        let mut filters = BTreeMap::new();
        filters.insert(
            category.to_string(),
            values.iter().map(|v| v.to_string()).collect(),
        );
        filters
    }

    #[test]
    fn test_default_state_only_sends_sort_and_paging() {
        let state = FilterState::default();
        assert_eq!(
            build_query(&state),
            "themesSortType=frequency&themesSortDirection=descending&page=1&page_size=50"
        );
    }

    #[test]
    fn test_blank_search_value_is_omitted() {
        let mut state = FilterState::default();
        state.set_search_value("   ");
        state.set_search_mode(SearchMode::Semantic);
        let query = build_query(&state);
        assert!(!query.contains("searchValue"));
        assert!(!query.contains("searchMode"));
    }

    #[test]
    fn test_full_state() {
        let mut state = FilterState::new(25, None);
        state.set_search_value("social housing");
        state.set_search_mode(SearchMode::Semantic);
        state.set_theme_filters(["12".to_string(), "7".to_string()]);
        state.set_evidence_rich_only(true);
        state.set_theme_sort_key(ThemeSortKey::Alphabetical);
        state.set_theme_sort_direction(SortDirection::Ascending);
        state.set_demo_filters(demo("region", &["north"]));

        assert_eq!(
            build_query(&state),
            "searchValue=social+housing&searchMode=semantic&themeFilters=12%2C7\
             &evidenceRich=true&themesSortType=alphabetical&themesSortDirection=ascending\
             &demoFilters=region%3Anorth&page=1&page_size=25"
        );
    }

    #[test]
    fn test_only_first_demographic_value_is_sent() {
        let mut state = FilterState::default();
        state.set_demo_filters(demo("country", &["wales", "england"]));

        let query = build_query(&state);
        assert!(query.contains("demoFilters=country%3Awales"));
        assert!(!query.contains("england"));
    }

    #[test]
    fn test_first_selected_demographic_value_wins_over_alphabetical() {
        let mut state = FilterState::default();
        state.toggle_demo_filter("country", "wales");
        state.toggle_demo_filter("country", "england");
        assert!(build_query(&state).contains("demoFilters=country%3Awales&"));

        state.toggle_demo_filter("country", "wales");
        assert!(build_query(&state).contains("demoFilters=country%3Aengland&"));
    }

    #[test]
    fn test_each_demographic_category_is_repeated() {
        let mut state = FilterState::default();
        let mut filters = demo("country", &["england"]);
        filters.extend(demo("age", &["18-24"]));
        state.set_demo_filters(filters);

        let query = build_query(&state);
        assert_eq!(query.matches("demoFilters=").count(), 2);
        let age = query.find("age%3A18-24").unwrap();
        let country = query.find("country%3Aengland").unwrap();
        assert!(age < country);
    }

    #[test]
    fn test_query_is_deterministic() {
        let mut state = FilterState::default();
        state.set_search_value("trains");
        state.set_theme_filters(["b".to_string(), "a".to_string()]);
        let mut filters = demo("country", &["scotland", "england"]);
        filters.extend(demo("age", &["65+"]));
        state.set_demo_filters(filters);

        let first = build_query(&state);
        for _ in 0..10 {
            assert_eq!(build_query(&state.clone()), first);
        }
    }

    #[test]
    fn test_theme_filters_keep_insertion_order() {
        let mut state = FilterState::default();
        state.add_theme_filter("9".to_string());
        state.add_theme_filter("3".to_string());
        assert!(build_query(&state).contains("themeFilters=9%2C3"));
    }

    #[test]
    fn test_responses_path_encodes_segments() {
        assert_eq!(
            responses_path("transport-2024", "q1"),
            "/consultations/transport-2024/responses/q1/json"
        );
        assert_eq!(
            responses_path("a b", "c/d"),
            "/consultations/a%20b/responses/c%2Fd/json"
        );
    }
}
