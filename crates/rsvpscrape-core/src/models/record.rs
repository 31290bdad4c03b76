use serde::{Deserialize, Serialize};

use super::Response;

/// Column holding the household position; the merge key.
pub const HOUSEHOLD_INDEX_COLUMN: &str = "Household_Index";

/// Columns that precede the per-event RSVP columns
const LEADING_COLUMNS: [&str; 7] = [
    HOUSEHOLD_INDEX_COLUMN,
    "First_Name",
    "Last_Name",
    "Full_Name",
    "Guest_Of",
    "Relationship",
    "Side",
];

/// Final column listing the events the household is invited to
const EVENTS_INVITED_COLUMN: &str = "Events_Invited";

/// Column name for an event: "Mahek's Vidhi & Haaldi" -> "RSVP_Maheks_Vidhi_and_Haaldi"
pub fn event_column(event_name: &str) -> String {
    let key = event_name
        .replace('\'', "")
        .replace(' ', "_")
        .replace('&', "and");
    format!("RSVP_{}", key)
}

/// Header row of the output dataset for the given canonical events.
pub fn dataset_headers<'a>(event_names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut headers: Vec<String> = LEADING_COLUMNS.iter().map(|c| c.to_string()).collect();
    headers.extend(event_names.into_iter().map(event_column));
    headers.push(EVENTS_INVITED_COLUMN.to_string());
    headers
}

/// One output row: a single person of a household.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestRecord {
    pub household_index: usize,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    /// Full name of the head of household; empty for the head itself
    pub guest_of: String,
    pub relationship: String,
    pub side: String,
    /// One entry per canonical event, in canonical order
    pub rsvp: Vec<Response>,
    /// Comma-joined list of invited events
    pub events_invited: String,
}

impl GuestRecord {
    pub fn is_head(&self) -> bool {
        self.guest_of.is_empty()
    }

    /// Cells in `dataset_headers` order.
    pub fn to_row(&self) -> Vec<String> {
        let mut row = vec![
            self.household_index.to_string(),
            self.first_name.clone(),
            self.last_name.clone(),
            self.full_name.clone(),
            self.guest_of.clone(),
            self.relationship.clone(),
            self.side.clone(),
        ];
        row.extend(self.rsvp.iter().map(|r| r.as_str().to_string()));
        row.push(self.events_invited.clone());
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_column() {
        assert_eq!(event_column("Mahek's Vidhi & Haaldi"), "RSVP_Maheks_Vidhi_and_Haaldi");
        assert_eq!(event_column("Wedding"), "RSVP_Wedding");
    }

    #[test]
    fn test_dataset_headers() {
        let headers = dataset_headers(["Wedding", "Reception"]);
        assert_eq!(headers.first().map(String::as_str), Some("Household_Index"));
        assert_eq!(headers[7], "RSVP_Wedding");
        assert_eq!(headers[8], "RSVP_Reception");
        assert_eq!(headers.last().map(String::as_str), Some("Events_Invited"));
        assert_eq!(headers.len(), 10);
    }

    #[test]
    fn test_to_row_matches_headers() {
        let record = GuestRecord {
            household_index: 7,
            first_name: "Jordan".to_string(),
            last_name: "Smith".to_string(),
            full_name: "Jordan Smith".to_string(),
            guest_of: "Alex Smith".to_string(),
            relationship: "Groom's Family".to_string(),
            side: "Groom".to_string(),
            rsvp: vec![Response::Declined, Response::NotInvited],
            events_invited: "Wedding".to_string(),
        };
        let row = record.to_row();
        assert_eq!(row.len(), dataset_headers(["Wedding", "Reception"]).len());
        assert_eq!(row[0], "7");
        assert_eq!(row[7], "Declined");
        assert_eq!(row[8], "");
        assert!(!record.is_head());
    }
}
