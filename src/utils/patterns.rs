//! Generates candidate email addresses from a person's name and a domain.

use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

/// Folds a name part to its closest plain-ASCII, lowercase form.
///
/// Diacritics are decomposed (NFKD) and the combining marks dropped, so
/// "José" becomes "jose". Anything that still is not ASCII alphanumeric,
/// an apostrophe, or a hyphen is removed.
pub(crate) fn normalize_name_part(part: &str) -> String {
    part.trim()
        .nfkd()
        .filter(|c| c.is_ascii())
        .collect::<String>()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '\'' || *c == '-')
        .collect()
}

/// Generates the ordered, deduplicated candidate set for one person.
///
/// Order is a priority signal: the probe loop tries candidates front to back
/// and the first server-accepted one wins, so the most common corporate forms
/// come first. Returns an empty vector when either name part is empty after
/// normalization or the domain looks unusable; verification must not run in
/// that case.
pub fn generate_candidates(first_name: &str, last_name: &str, domain: &str) -> Vec<String> {
    let first = normalize_name_part(first_name);
    let last = normalize_name_part(last_name);
    let domain = domain.trim().to_lowercase();

    if first.is_empty() || last.is_empty() {
        tracing::debug!(
            "No candidates for '{} {}': name empty after normalization",
            first_name,
            last_name
        );
        return Vec::new();
    }
    if domain.is_empty() || !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.')
    {
        tracing::warn!("No candidates: invalid domain '{}'", domain);
        return Vec::new();
    }

    let f_initial = first.chars().next().map(String::from).unwrap_or_default();
    let l_initial = last.chars().next().map(String::from).unwrap_or_default();

    let mut local_parts = vec![
        first.clone(),
        last.clone(),
        format!("{}.{}", first, last),
        format!("{}{}", first, last),
    ];
    if !f_initial.is_empty() {
        local_parts.push(format!("{}{}", f_initial, last));
        local_parts.push(format!("{}.{}", f_initial, last));
    }
    if !l_initial.is_empty() {
        local_parts.push(format!("{}{}", first, l_initial));
        local_parts.push(format!("{}.{}", first, l_initial));
    }
    if !f_initial.is_empty() && !l_initial.is_empty() {
        local_parts.push(format!("{}{}", f_initial, l_initial));
    }

    // First-seen order wins; later duplicates carry no extra signal.
    let mut seen = HashSet::new();
    local_parts
        .into_iter()
        .filter(|local| seen.insert(local.clone()))
        .map(|local| format!("{}@{}", local, domain))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order_fixed_prefix() {
        let candidates = generate_candidates("John", "Doe", "example.com");
        assert_eq!(
            &candidates[..4],
            &[
                "john@example.com".to_string(),
                "doe@example.com".to_string(),
                "john.doe@example.com".to_string(),
                "johndoe@example.com".to_string(),
            ]
        );
        assert_eq!(
            &candidates[4..],
            &[
                "jdoe@example.com".to_string(),
                "j.doe@example.com".to_string(),
                "johnd@example.com".to_string(),
                "john.d@example.com".to_string(),
                "jd@example.com".to_string(),
            ]
        );
    }

    #[test]
    fn test_no_duplicates() {
        let candidates = generate_candidates("Bo", "Bo", "example.com");
        let unique: HashSet<_> = candidates.iter().collect();
        assert_eq!(unique.len(), candidates.len());
        // bo == bo, so first@ and last@ collapse; first entry keeps priority.
        assert_eq!(candidates[0], "bo@example.com");
    }

    #[test]
    fn test_empty_names_yield_empty_set() {
        assert!(generate_candidates("", "Doe", "example.com").is_empty());
        assert!(generate_candidates("John", "", "example.com").is_empty());
        assert!(generate_candidates("   ", "Doe", "example.com").is_empty());
    }

    #[test]
    fn test_invalid_domain_yields_empty_set() {
        assert!(generate_candidates("John", "Doe", "").is_empty());
        assert!(generate_candidates("John", "Doe", "no-dot").is_empty());
        assert!(generate_candidates("John", "Doe", ".com").is_empty());
        assert!(generate_candidates("John", "Doe", "example.").is_empty());
    }

    #[test]
    fn test_diacritics_folded_to_ascii() {
        let candidates = generate_candidates("José", "Müller", "example.de");
        assert_eq!(candidates[0], "jose@example.de");
        assert_eq!(candidates[1], "muller@example.de");
        assert!(candidates.contains(&"jose.muller@example.de".to_string()));
        assert!(candidates.iter().all(|c| c.is_ascii()));
    }

    #[test]
    fn test_case_folded() {
        let candidates = generate_candidates("JOHN", "DOE", "Example.COM");
        assert_eq!(candidates[0], "john@example.com");
        assert!(candidates
            .iter()
            .all(|c| c.chars().all(|ch| !ch.is_ascii_uppercase())));
    }

    #[test]
    fn test_name_with_purely_nonascii_symbols_is_empty() {
        assert!(generate_candidates("李", "王", "example.cn").is_empty());
    }
}
