use std::cmp::Ordering;

use crate::db::Country;

/// Lower-cases and trims free-text input. Blank input yields `None` so it
/// never matches every country.
pub fn normalize_query(input: &str) -> Option<String> {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() { None } else { Some(needle) }
}

/// Picks one country among substring candidates.
///
/// Preference order: exact name match, then names starting with `needle`,
/// then the shortest name, then alphabetical name, then country code.
/// Candidates whose name does not contain `needle` are ignored.
pub fn best_match(needle: &str, candidates: Vec<Country>) -> Option<Country> {
    candidates
        .into_iter()
        .map(|country| (country.country_name.to_lowercase(), country))
        .filter(|(name, _)| name.contains(needle))
        .min_by(|(a_name, a), (b_name, b)| rank(needle, a_name, a, b_name, b))
        .map(|(_, country)| country)
}

fn rank(needle: &str, a_name: &str, a: &Country, b_name: &str, b: &Country) -> Ordering {
    let a_exact = a_name == needle;
    let b_exact = b_name == needle;
    let a_prefix = a_name.starts_with(needle);
    let b_prefix = b_name.starts_with(needle);

    b_exact
        .cmp(&a_exact)
        .then_with(|| b_prefix.cmp(&a_prefix))
        .then_with(|| a_name.chars().count().cmp(&b_name.chars().count()))
        .then_with(|| a_name.cmp(b_name))
        .then_with(|| a.country_code.cmp(&b.country_code))
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::{best_match, normalize_query};
    use crate::db::Country;

    fn countries(rows: &[(&str, &str)]) -> Vec<Country> {
        rows.iter()
            .map(|(code, name)| Country {
                country_code: code.to_string(),
                country_name: name.to_string(),
            })
            .collect()
    }

    #[test_case("  France ", Some("france") ; "trims and lowercases")]
    #[test_case("", None ; "empty input")]
    #[test_case("   ", None ; "whitespace only")]
    fn normalize_query_cases(input: &str, expected: Option<&str>) {
        assert_eq!(normalize_query(input).as_deref(), expected);
    }

    #[test_case("franc", "FR" ; "single substring match")]
    #[test_case("india", "IN" ; "exact match beats longer names")]
    #[test_case("guinea", "GN" ; "exact match beats prefix and suffix matches")]
    #[test_case("united", "US" ; "shortest prefix match")]
    #[test_case("land", "PL" ; "shortest infix match")]
    fn best_match_cases(needle: &str, expected_code: &str) {
        let candidates = countries(&[
            ("FR", "France"),
            ("IO", "British Indian Ocean Territory"),
            ("IN", "India"),
            ("GQ", "Equatorial Guinea"),
            ("GW", "Guinea-Bissau"),
            ("GN", "Guinea"),
            ("PG", "Papua New Guinea"),
            ("GB", "United Kingdom"),
            ("US", "United States"),
            ("AE", "United Arab Emirates"),
            ("PL", "Poland"),
            ("FI", "Finland"),
            ("IE", "Ireland"),
        ]);

        let found = best_match(needle, candidates).expect("a match");
        assert_eq!(found.country_code, expected_code);
    }

    #[test]
    fn best_match_ignores_order_of_candidates() {
        let forward = countries(&[("GF", "French Guiana"), ("FR", "France")]);
        let backward = countries(&[("FR", "France"), ("GF", "French Guiana")]);

        assert_eq!(best_match("fr", forward).map(|c| c.country_code), Some("FR".to_string()));
        assert_eq!(best_match("fr", backward).map(|c| c.country_code), Some("FR".to_string()));
    }

    #[test]
    fn best_match_breaks_length_ties_alphabetically() {
        let candidates = countries(&[("IE", "Ireland"), ("FI", "Finland")]);
        let found = best_match("land", candidates).expect("a match");
        assert_eq!(found.country_code, "FI");
    }

    #[test]
    fn best_match_breaks_name_ties_by_code() {
        let candidates = countries(&[("ZZ", "Atlantis"), ("AA", "Atlantis")]);
        let found = best_match("atlantis", candidates).expect("a match");
        assert_eq!(found.country_code, "AA");
    }

    #[test]
    fn best_match_without_candidates_is_none() {
        assert!(best_match("atlantis", Vec::new()).is_none());
        assert!(best_match("atlantis", countries(&[("FR", "France")])).is_none());
    }
}
