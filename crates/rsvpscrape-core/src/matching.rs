//! Loose text matching against the deployment vocabulary.
//!
//! Remote labels are not byte-identical to the canonical event set across
//! sessions, so event labels are resolved with a fixed precedence:
//! exact, then normalized equality, then normalized containment in either
//! direction, then the event's keyword set.

use crate::config::{EventDef, Principal};

/// Side reported when no principal matches
pub const UNKNOWN_SIDE: &str = "Unknown";

/// Lowercase, spell out '&', and keep only ASCII alphanumerics.
pub fn normalize_label(label: &str) -> String {
    label
        .to_lowercase()
        .replace('&', "and")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// How a label matched an event; earlier variants are stronger matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    Exact,
    Normalized,
    Containment,
    Keywords,
}

/// Strongest way a remote label refers to the canonical event, if any.
pub fn match_kind(label: &str, event: &EventDef) -> Option<MatchKind> {
    if label == event.name {
        return Some(MatchKind::Exact);
    }

    let label_norm = normalize_label(label);
    let event_norm = normalize_label(&event.name);
    if label_norm.is_empty() || event_norm.is_empty() {
        return None;
    }
    if label_norm == event_norm {
        return Some(MatchKind::Normalized);
    }
    if label_norm.contains(&event_norm) || event_norm.contains(&label_norm) {
        return Some(MatchKind::Containment);
    }

    let keywords_match = !event.keywords.is_empty()
        && event
            .keywords
            .iter()
            .all(|k| label_norm.contains(&normalize_label(k)));
    keywords_match.then_some(MatchKind::Keywords)
}

/// Canonical event the label refers to.
///
/// Each match kind is tried across every event before falling back to the next,
/// so an exact match on a later event beats a containment match on an earlier one.
/// Within one kind the first event in profile order wins.
pub fn resolve_event<'a>(label: &str, events: &'a [EventDef]) -> Option<&'a EventDef> {
    events
        .iter()
        .filter_map(|e| match_kind(label, e).map(|kind| (kind, e)))
        .min_by_key(|(kind, _)| *kind)
        .map(|(_, e)| e)
}

/// Side of a household, derived only from its relationship text.
pub fn derive_side(relationship: &str, principals: &[Principal]) -> String {
    let rel_lower = relationship.to_lowercase();
    principals
        .iter()
        .find(|p| {
            let name = p.name.to_lowercase();
            let side = p.side.to_lowercase();
            (!name.is_empty() && rel_lower.contains(&name))
                || (!side.is_empty() && rel_lower.contains(&side))
        })
        .map(|p| p.side.clone())
        .unwrap_or_else(|| UNKNOWN_SIDE.to_string())
}

/// Reduce raw relationship text to a known category, or its first line when none matches.
pub fn normalize_relationship(raw: &str, vocabulary: &[String]) -> String {
    if let Some(known) = vocabulary.iter().find(|v| !v.is_empty() && raw.contains(v.as_str())) {
        return known.clone();
    }
    raw.lines().next().unwrap_or("").trim().to_string()
}

/// Drop a leading list number: "2. Jordan Smith" -> "Jordan Smith"
pub fn strip_list_number(text: &str) -> &str {
    let trimmed = text.trim();
    let digits = trimmed.len() - trimmed.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return trimmed;
    }
    match trimmed[digits..].strip_prefix('.') {
        Some(rest) => rest.trim_start(),
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Profile;

    fn events() -> Vec<EventDef> {
        Profile::default().events
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("Mahek's Vidhi & Haaldi"), "maheksvidhiandhaaldi");
        assert_eq!(normalize_label("maheks vidhi and haaldi"), "maheksvidhiandhaaldi");
        assert_eq!(normalize_label("  "), "");
    }

    #[test]
    fn test_match_kind_punctuation_and_case() {
        let vidhi = EventDef::new("Mahek's Vidhi & Haaldi", &["mahek", "vidhi"]);
        assert_eq!(match_kind("Mahek's Vidhi & Haaldi", &vidhi), Some(MatchKind::Exact));
        assert_eq!(match_kind("maheks vidhi and haaldi", &vidhi), Some(MatchKind::Normalized));
        assert_eq!(match_kind("MAHEK'S VIDHI &amp; HAALDI", &vidhi), Some(MatchKind::Keywords));
    }

    #[test]
    fn test_match_kind_unrelated_label_fails() {
        let vidhi = EventDef::new("Mahek's Vidhi & Haaldi", &["mahek", "vidhi"]);
        assert_eq!(match_kind("Reception", &vidhi), None);
        assert_eq!(match_kind("Saumya's Vidhi & Haaldi", &vidhi), None);
        assert_eq!(match_kind("", &vidhi), None);
    }

    #[test]
    fn test_match_kind_containment_either_direction() {
        let wedding = EventDef::new("Wedding", &[]);
        assert_eq!(match_kind("Wedding Ceremony", &wedding), Some(MatchKind::Containment));
        let long = EventDef::new("Wedding Ceremony", &[]);
        assert_eq!(match_kind("wedding", &long), Some(MatchKind::Containment));
    }

    #[test]
    fn test_match_kind_keywords() {
        let vidhi = EventDef::new("Mahek's Vidhi & Haaldi", &["mahek", "vidhi"]);
        assert_eq!(match_kind("Haldi and Vidhi for Mahek", &vidhi), Some(MatchKind::Keywords));
        assert_eq!(match_kind("Haldi and Vidhi", &vidhi), None);
    }

    #[test]
    fn test_resolve_event_prefers_stronger_match_over_profile_order() {
        let events = vec![EventDef::new("Wedding", &[]), EventDef::new("Wedding Reception", &[])];
        let name = |label: &str| resolve_event(label, &events).map(|e| e.name.as_str());

        assert_eq!(name("Wedding Reception"), Some("Wedding Reception"));
        assert_eq!(name("wedding reception"), Some("Wedding Reception"));
        assert_eq!(name("Wedding"), Some("Wedding"));
        // Containment on both: first in profile order
        assert_eq!(name("Wedding Reception Dinner"), Some("Wedding"));
        assert_eq!(name("Reception"), Some("Wedding Reception"));
    }

    #[test]
    fn test_resolve_event_default_profile() {
        let events = events();
        assert_eq!(
            resolve_event("saumyas vidhi and haaldi", &events).map(|e| e.name.as_str()),
            Some("Saumya's Vidhi & Haaldi")
        );
        assert_eq!(resolve_event("Reception", &events).map(|e| e.name.as_str()), Some("Reception"));
        assert!(resolve_event("Sangeet", &events).is_none());
    }

    #[test]
    fn test_derive_side() {
        let principals = Profile::default().principals;
        assert_eq!(derive_side("Saumya's Family Friend", &principals), "Bride");
        assert_eq!(derive_side("Mahek's Friend", &principals), "Groom");
        assert_eq!(derive_side("Groom's Family", &principals), "Groom");
        assert_eq!(derive_side("Mahek and Saumya's Friend", &principals), "Bride");
        assert_eq!(derive_side("Coworker", &principals), "Unknown");
        assert_eq!(derive_side("", &principals), "Unknown");
    }

    #[test]
    fn test_normalize_relationship() {
        let vocab = Profile::default().relationships;
        assert_eq!(
            normalize_relationship("Mahek's Family Friend\nMahek's Friend", &vocab),
            "Mahek's Family Friend"
        );
        assert_eq!(normalize_relationship("Mahek's Family", &vocab), "Mahek's Family");
        assert_eq!(normalize_relationship("  Neighbor \nother", &vocab), "Neighbor");
        assert_eq!(normalize_relationship("", &vocab), "");
    }

    #[test]
    fn test_strip_list_number() {
        assert_eq!(strip_list_number("1. Alex Smith"), "Alex Smith");
        assert_eq!(strip_list_number("12.Jordan"), "Jordan");
        assert_eq!(strip_list_number("Alex Smith"), "Alex Smith");
        assert_eq!(strip_list_number("3M Guest"), "3M Guest");
    }
}
