use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::Response;

/// Identity fields read from the guest info panel of one household.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityInfo {
    pub primary_first: String,
    pub primary_last: String,
    pub partner_first: String,
    pub partner_last: String,
    /// Normalized relationship category, empty when none was found
    pub relationship: String,
    /// Canonical names of the events the household is invited to
    pub events_invited: Vec<String>,
}

impl IdentityInfo {
    /// Primary and partner full names, skipping empty ones
    pub fn names(&self) -> Vec<String> {
        [
            (&self.primary_first, &self.primary_last),
            (&self.partner_first, &self.partner_last),
        ]
        .iter()
        .map(|(first, last)| format!("{} {}", first, last).trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
    }
}

/// One person listed on the responses panel, with a status per canonical event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonResponses {
    pub name: String,
    pub statuses: BTreeMap<String, Response>,
}

/// Everything read from the responses panel of one household.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseInfo {
    /// Canonical events that had a section on the panel, in panel order
    pub events_found: Vec<String>,
    /// People in the order they were first seen
    pub people: Vec<PersonResponses>,
}

impl ResponseInfo {
    /// Note every person listed under one event section, in listed order.
    ///
    /// A name seen for the n-th time within a section maps to the n-th person of that
    /// name, so repeated placeholders ("Guest", "Guest") stay distinct people.
    pub fn record_section(&mut self, event: &str, entries: Vec<(String, Response)>) {
        if !self.events_found.iter().any(|e| e == event) {
            self.events_found.push(event.to_string());
        }
        let mut seen: HashMap<String, usize> = HashMap::new();
        for (name, response) in entries {
            let occurrence = seen.entry(name.clone()).or_insert(0);
            let idx = match self
                .people
                .iter()
                .enumerate()
                .filter(|(_, p)| p.name == name)
                .nth(*occurrence)
            {
                Some((idx, _)) => idx,
                None => {
                    self.people.push(PersonResponses {
                        name: name.clone(),
                        statuses: BTreeMap::new(),
                    });
                    self.people.len() - 1
                }
            };
            *occurrence += 1;
            self.people[idx].statuses.insert(event.to_string(), response);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }
}

/// Raw extraction payload for one household, held in memory until flattening.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeResult {
    /// Zero-based row position in the live guest list
    pub position: usize,
    pub display_name: String,
    /// Relationship shown in parentheses on the list row, if any
    pub row_relationship: Option<String>,
    pub identity: IdentityInfo,
    pub responses: ResponseInfo,
}

impl ScrapeResult {
    /// People in discovery order: the responses panel first, the identity panel as fallback.
    pub fn people(&self) -> Vec<String> {
        if !self.responses.is_empty() {
            return self.responses.people.iter().map(|p| p.name.clone()).collect();
        }
        self.identity.names()
    }

    /// Resolve the household relationship from the best available source.
    pub fn relationship(&self) -> String {
        if !self.identity.relationship.is_empty() {
            return self.identity.relationship.clone();
        }
        if let Some(rel) = self.row_relationship.as_deref().filter(|r| !r.is_empty()) {
            return rel.to_string();
        }
        parenthesized(&self.display_name).unwrap_or_default()
    }
}

/// Text between the first '(' and the following ')', trimmed
fn parenthesized(text: &str) -> Option<String> {
    let start = text.find('(')?;
    let end = start + text[start..].find(')')?;
    let inner = text[start + 1..end].trim();
    (!inner.is_empty()).then(|| inner.to_string())
}
