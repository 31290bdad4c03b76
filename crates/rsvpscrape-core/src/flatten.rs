//! Row flattener: one scraped household in, one record per person out.
//!
//! Pure and deterministic. The first person is the head of household and every
//! other record points back at the head's full name through `guest_of`.

use std::collections::BTreeMap;

use crate::config::{EventDef, Profile};
use crate::matching::derive_side;
use crate::models::{GuestRecord, Response, ScrapeResult};

/// First name the remote UI gives an unnamed plus-one
const PLACEHOLDER_FIRST_NAME: &str = "Guest";

/// First name of an unnamed child entry; never inherits a last name
const CHILD_FIRST_NAME: &str = "Child";

/// Split "First Middle Last" into ("First", "Middle Last").
pub fn split_name(full: &str) -> (String, String) {
    let mut parts = full.split_whitespace();
    let first = parts.next().unwrap_or("").to_string();
    let last = parts.collect::<Vec<_>>().join(" ");
    (first, last)
}

/// Flatten every successful household, preserving input order.
pub fn flatten_all(results: &[ScrapeResult], profile: &Profile) -> Vec<GuestRecord> {
    results.iter().flat_map(|r| flatten(r, profile)).collect()
}

/// Flatten one household into `people().len()` records.
pub fn flatten(result: &ScrapeResult, profile: &Profile) -> Vec<GuestRecord> {
    let people = result.people();
    let Some(head) = people.first().cloned() else {
        return Vec::new();
    };

    let relationship = result.relationship();
    let side = derive_side(&relationship, &profile.principals);
    let events_invited = result.identity.events_invited.join(", ");
    let (head_first, head_last) = split_name(&head);

    // Statuses line up with `people` when they came from the responses panel
    let statuses: Vec<Option<&BTreeMap<String, Response>>> = if result.responses.is_empty() {
        vec![None; people.len()]
    } else {
        result.responses.people.iter().map(|p| Some(&p.statuses)).collect()
    };

    let mut placeholder_count = 0;
    let mut records = Vec::with_capacity(people.len());

    for (i, raw_name) in people.iter().enumerate() {
        let (mut first_name, mut last_name) = split_name(raw_name);
        let mut full_name = raw_name.clone();

        if i > 0 && first_name == PLACEHOLDER_FIRST_NAME && last_name.is_empty() {
            placeholder_count += 1;
            first_name = head_first.clone();
            last_name = format!("Guest {} {}", placeholder_count, head_last)
                .trim()
                .to_string();
            full_name = format!("{} {}", first_name, last_name);
        } else if i > 0
            && last_name.is_empty()
            && !head_last.is_empty()
            && first_name != CHILD_FIRST_NAME
        {
            last_name = head_last.clone();
            full_name = format!("{} {}", first_name, last_name);
        }

        let rsvp = profile
            .events
            .iter()
            .map(|event| status_for_event(statuses[i], event))
            .collect();

        records.push(GuestRecord {
            household_index: result.position,
            first_name,
            last_name,
            full_name,
            guest_of: if i == 0 { String::new() } else { head.clone() },
            relationship: relationship.clone(),
            side: side.clone(),
            rsvp,
            events_invited: events_invited.clone(),
        });
    }

    records
}

/// Statuses are keyed by canonical event name once extracted
fn status_for_event(statuses: Option<&BTreeMap<String, Response>>, event: &EventDef) -> Response {
    statuses
        .and_then(|map| map.get(&event.name))
        .copied()
        .unwrap_or(Response::NotInvited)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IdentityInfo, ResponseInfo};

    fn household(
        position: usize,
        relationship: &str,
        entries: &[(&str, &str, Response)],
    ) -> ScrapeResult {
        let mut responses = ResponseInfo::default();
        for (event, name, status) in entries {
            responses.record_section(event, vec![(name.to_string(), *status)]);
        }
        ScrapeResult {
            position,
            display_name: "Smith, Alex".to_string(),
            row_relationship: None,
            identity: IdentityInfo {
                relationship: relationship.to_string(),
                events_invited: vec!["Wedding".to_string()],
                ..Default::default()
            },
            responses,
        }
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("Alex Smith"), ("Alex".to_string(), "Smith".to_string()));
        assert_eq!(split_name("Ana de la Cruz"), ("Ana".to_string(), "de la Cruz".to_string()));
        assert_eq!(split_name("Guest"), ("Guest".to_string(), String::new()));
        assert_eq!(split_name(""), (String::new(), String::new()));
    }

    #[test]
    fn test_flatten_groom_family_scenario() {
        let result = household(
            7,
            "Groom's Family",
            &[
                ("Wedding", "Alex Smith", Response::Attending),
                ("Wedding", "Jordan Smith", Response::Declined),
            ],
        );
        let records = flatten(&result, &Profile::default());

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.household_index == 7));
        assert!(records.iter().all(|r| r.side == "Groom"));
        assert_eq!(records[0].full_name, "Alex Smith");
        assert_eq!(records[0].guest_of, "");
        assert_eq!(records[1].full_name, "Jordan Smith");
        assert_eq!(records[1].guest_of, "Alex Smith");

        // Canonical order: Mahek's Vidhi, Saumya's Vidhi, Wedding, Reception
        assert_eq!(records[0].rsvp[2], Response::Attending);
        assert_eq!(records[1].rsvp[2], Response::Declined);
        assert_eq!(records[0].rsvp[0], Response::NotInvited);
        assert_eq!(records[0].events_invited, "Wedding");
    }

    #[test]
    fn test_exactly_one_head_per_household() {
        let result = household(
            3,
            "Mahek's Friend",
            &[
                ("Wedding", "Alex Smith", Response::Attending),
                ("Wedding", "Sam", Response::Attending),
                ("Reception", "Guest", Response::NoResponse),
            ],
        );
        let records = flatten(&result, &Profile::default());
        assert_eq!(records.len(), 3);
        assert_eq!(records.iter().filter(|r| r.is_head()).count(), 1);
    }

    #[test]
    fn test_placeholder_promotion() {
        let mut result = household(
            1,
            "Saumya's Friend",
            &[("Wedding", "Alex Smith", Response::Attending)],
        );
        result.responses.record_section(
            "Reception",
            vec![
                ("Guest".to_string(), Response::Attending),
                ("Guest".to_string(), Response::NoResponse),
            ],
        );
        let records = flatten(&result, &Profile::default());

        assert_eq!(records[1].first_name, "Alex");
        assert_eq!(records[1].last_name, "Guest 1 Smith");
        assert_eq!(records[1].full_name, "Alex Guest 1 Smith");
        assert_eq!(records[2].full_name, "Alex Guest 2 Smith");
        // Statuses follow the listed person, not the rewritten name
        assert_eq!(records[1].rsvp[3], Response::Attending);
        assert_eq!(records[2].rsvp[3], Response::NoResponse);
        assert_eq!(records[1].rsvp[2], Response::NotInvited);
    }

    #[test]
    fn test_last_name_inheritance_skips_children() {
        let result = household(
            2,
            "Mahek's Family",
            &[
                ("Wedding", "Alex Smith", Response::Attending),
                ("Wedding", "Sam", Response::Attending),
                ("Wedding", "Child", Response::Attending),
            ],
        );
        let records = flatten(&result, &Profile::default());
        assert_eq!(records[1].full_name, "Sam Smith");
        assert_eq!(records[1].last_name, "Smith");
        assert_eq!(records[2].full_name, "Child");
        assert_eq!(records[2].last_name, "");
    }

    #[test]
    fn test_overlapping_event_names_keep_their_own_columns() {
        let profile = Profile {
            events: vec![EventDef::new("Wedding", &[]), EventDef::new("Wedding Reception", &[])],
            ..Profile::default()
        };
        let result = household(
            0,
            "Mahek's Family",
            &[
                ("Wedding", "Alex Smith", Response::Declined),
                ("Wedding Reception", "Alex Smith", Response::Attending),
            ],
        );
        let records = flatten(&result, &profile);
        assert_eq!(records[0].rsvp, vec![Response::Declined, Response::Attending]);
    }

    #[test]
    fn test_unlisted_event_is_not_invited() {
        let result = household(
            0,
            "Mahek's Family",
            &[("Mahek's Vidhi & Haaldi", "Alex Smith", Response::Declined)],
        );
        let records = flatten(&result, &Profile::default());
        assert_eq!(records[0].rsvp[0], Response::Declined);
        assert_eq!(records[0].rsvp[1], Response::NotInvited);
    }

    #[test]
    fn test_identity_fallback_without_responses() {
        let result = ScrapeResult {
            position: 5,
            identity: IdentityInfo {
                primary_first: "Alex".to_string(),
                primary_last: "Smith".to_string(),
                partner_first: "Jordan".to_string(),
                relationship: "Coworker".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let records = flatten(&result, &Profile::default());
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].full_name, "Jordan Smith");
        assert_eq!(records[0].side, "Unknown");
        assert!(records[0].rsvp.iter().all(|r| *r == Response::NotInvited));
    }

    #[test]
    fn test_empty_household_yields_no_records() {
        assert!(flatten(&ScrapeResult::default(), &Profile::default()).is_empty());
    }

    #[test]
    fn test_flatten_is_deterministic() {
        let result = household(
            9,
            "Saumya's Family",
            &[
                ("Reception", "Alex Smith", Response::Attending),
                ("Wedding", "Alex Smith", Response::Declined),
                ("Wedding", "Guest", Response::NoResponse),
            ],
        );
        let profile = Profile::default();
        let first: Vec<_> = flatten(&result, &profile).iter().map(|r| r.to_row()).collect();
        let second: Vec<_> = flatten(&result, &profile).iter().map(|r| r.to_row()).collect();
        assert_eq!(first, second);
    }
}
