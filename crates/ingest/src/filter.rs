use yelp_core::Filters;

use crate::parser::{Record, categories_text, field_str};

/// Case-insensitive business filter. Each non-empty dimension must match;
/// with no filters every record passes.
pub fn passes(record: &Record, filters: &Filters) -> bool {
    if !filters.states().is_empty() {
        let state = field_str(record, "state").to_uppercase();
        if !filters.states().contains(&state) {
            return false;
        }
    }
    if !filters.cities().is_empty() {
        let city = field_str(record, "city").to_lowercase();
        if !filters.cities().contains(&city) {
            return false;
        }
    }
    if !filters.category_substrings().is_empty() {
        let text = categories_text(record);
        if !filters
            .category_substrings()
            .iter()
            .any(|needle| text.contains(needle.as_str()))
        {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn toronto_cafe() -> Record {
        record(json!({
            "business_id": "b1",
            "state": "on",
            "city": " TORONTO ",
            "categories": "Coffee & Tea, Cafes"
        }))
    }

    #[test]
    fn no_filters_accept_everything() {
        assert!(passes(&toronto_cafe(), &Filters::default()));
        assert!(passes(&record(json!({})), &Filters::default()));
    }

    #[test]
    fn matches_case_insensitively() {
        let filters = Filters::new(["ON"], ["toronto"], ["CAFE"]);
        assert!(passes(&toronto_cafe(), &filters));
    }

    #[test]
    fn each_dimension_can_reject() {
        let rec = toronto_cafe();
        let none: [&str; 0] = [];
        assert!(!passes(&rec, &Filters::new(["CA"], none, none)));
        assert!(!passes(&rec, &Filters::new(none, ["Montreal"], none)));
        assert!(!passes(&rec, &Filters::new(none, none, ["pizza"])));
        assert!(passes(&rec, &Filters::new(none, none, ["pizza", "tea"])));
    }

    #[test]
    fn missing_fields_fail_active_filters() {
        let rec = record(json!({"business_id": "b2"}));
        let none: [&str; 0] = [];
        assert!(!passes(&rec, &Filters::new(["ON"], none, none)));
        assert!(!passes(&rec, &Filters::new(none, none, ["coffee"])));
    }

    #[test]
    fn dimension_order_does_not_matter() {
        let none: [&str; 0] = [];
        let records = [
            toronto_cafe(),
            record(json!({"state": "CA", "city": "LA", "categories": "Coffee"})),
            record(json!({"state": "ON", "city": "Ottawa", "categories": "Bars"})),
        ];
        for rec in &records {
            let combined = passes(rec, &Filters::new(["ON"], ["toronto"], ["coffee"]));
            let separately = passes(rec, &Filters::new(none, none, ["coffee"]))
                && passes(rec, &Filters::new(none, ["toronto"], none))
                && passes(rec, &Filters::new(["ON"], none, none));
            assert_eq!(combined, separately);
        }
    }
}
