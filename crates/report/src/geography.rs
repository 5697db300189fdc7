use yelp_core::Counter;

pub const CANADA: &str = "Canada";
pub const UNITED_STATES: &str = "United States";
pub const OTHER_COUNTRY: &str = "Other/Unknown";

const CANADA_PROVINCES_TERRITORIES: [&str; 13] = [
    "AB", "BC", "MB", "NB", "NL", "NS", "NT", "NU", "ON", "PE", "QC", "SK", "YT",
];

const US_STATES_AND_DC: [&str; 51] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ",
    "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT",
    "VA", "WA", "WV", "WI", "WY", "DC",
];

/// Country label for a two-letter state or province code.
pub fn country_for_state(state: &str) -> &'static str {
    let state = state.trim().to_uppercase();
    if CANADA_PROVINCES_TERRITORIES.contains(&state.as_str()) {
        CANADA
    } else if US_STATES_AND_DC.contains(&state.as_str()) {
        UNITED_STATES
    } else {
        OTHER_COUNTRY
    }
}

pub fn country_counts(states: &Counter<String>) -> Counter<String> {
    let mut countries = Counter::new();
    for (state, count) in states.iter() {
        countries.add(country_for_state(state).to_string(), count);
    }
    countries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_codes_to_countries() {
        assert_eq!(country_for_state("ON"), CANADA);
        assert_eq!(country_for_state(" qc "), CANADA);
        assert_eq!(country_for_state("AZ"), UNITED_STATES);
        assert_eq!(country_for_state("DC"), UNITED_STATES);
        assert_eq!(country_for_state("XMS"), OTHER_COUNTRY);
        assert_eq!(country_for_state(""), OTHER_COUNTRY);
    }

    #[test]
    fn rolls_state_counts_up() {
        let mut states = Counter::new();
        states.add("ON".to_string(), 3);
        states.add("AB".to_string(), 2);
        states.add("PA".to_string(), 4);
        states.add("ABE".to_string(), 1);
        let countries = country_counts(&states);
        assert_eq!(countries.get(&CANADA.to_string()), 5);
        assert_eq!(countries.get(&UNITED_STATES.to_string()), 4);
        assert_eq!(countries.get(&OTHER_COUNTRY.to_string()), 1);
        assert_eq!(countries.total(), 10);
    }
}
