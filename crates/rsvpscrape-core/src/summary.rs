//! Response counts over a finished dataset.

use std::collections::BTreeMap;

use tracing::info;

use crate::config::Profile;
use crate::models::{event_column, Response};
use crate::store::Dataset;

const GUEST_OF_COLUMN: &str = "Guest_Of";
const SIDE_COLUMN: &str = "Side";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventTally {
    pub event: String,
    pub attending: usize,
    pub declined: usize,
    pub no_response: usize,
}

impl EventTally {
    pub fn invited(&self) -> usize {
        self.attending + self.declined + self.no_response
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RsvpSummary {
    pub people: usize,
    pub households: usize,
    pub events: Vec<EventTally>,
    /// Heads of household per side
    pub sides: BTreeMap<String, usize>,
}

impl RsvpSummary {
    pub fn from_dataset(dataset: &Dataset, profile: &Profile) -> Self {
        let mut summary = RsvpSummary {
            people: dataset.len(),
            ..Self::default()
        };

        for event in &profile.events {
            let column = event_column(&event.name);
            let mut tally = EventTally {
                event: event.name.clone(),
                ..EventTally::default()
            };
            for row in &dataset.rows {
                match dataset.cell(row, &column).and_then(Response::from_cell) {
                    Some(Response::Attending) => tally.attending += 1,
                    Some(Response::Declined) => tally.declined += 1,
                    Some(Response::NoResponse) => tally.no_response += 1,
                    _ => {}
                }
            }
            summary.events.push(tally);
        }

        for row in &dataset.rows {
            if dataset.cell(row, GUEST_OF_COLUMN).unwrap_or("").is_empty() {
                summary.households += 1;
                let side = dataset.cell(row, SIDE_COLUMN).unwrap_or("").to_string();
                *summary.sides.entry(side).or_insert(0) += 1;
            }
        }
        summary
    }

    pub fn log(&self) {
        info!(people = self.people, households = self.households, "Dataset summary");
        for tally in &self.events {
            info!(
                event = %tally.event,
                attending = tally.attending,
                declined = tally.declined,
                no_response = tally.no_response,
                "Event responses"
            );
        }
        for (side, heads) in &self.sides {
            info!(side = %side, households = heads, "Households by side");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{dataset_headers, GuestRecord};

    fn record(
        index: usize,
        name: &str,
        guest_of: &str,
        side: &str,
        rsvp: Vec<Response>,
    ) -> GuestRecord {
        GuestRecord {
            household_index: index,
            first_name: String::new(),
            last_name: String::new(),
            full_name: name.to_string(),
            guest_of: guest_of.to_string(),
            relationship: String::new(),
            side: side.to_string(),
            rsvp,
            events_invited: String::new(),
        }
    }

    #[test]
    fn test_summary_counts() {
        let profile = Profile::default();
        let headers = dataset_headers(profile.event_names());
        let n = profile.events.len();
        let mut attending = vec![Response::NotInvited; n];
        attending[2] = Response::Attending;
        let mut declined = vec![Response::NotInvited; n];
        declined[2] = Response::Declined;
        let mut pending = vec![Response::NotInvited; n];
        pending[3] = Response::NoResponse;

        let dataset = Dataset::from_records(
            headers,
            &[
                record(0, "A", "", "Bride", attending.clone()),
                record(0, "B", "A", "Bride", declined),
                record(1, "C", "", "Groom", attending),
                record(2, "D", "", "Unknown", pending),
            ],
        );
        let summary = RsvpSummary::from_dataset(&dataset, &profile);

        assert_eq!(summary.people, 4);
        assert_eq!(summary.households, 3);
        assert_eq!(summary.events[2].attending, 2);
        assert_eq!(summary.events[2].declined, 1);
        assert_eq!(summary.events[2].invited(), 3);
        assert_eq!(summary.events[3].no_response, 1);
        assert_eq!(summary.events[0].invited(), 0);
        assert_eq!(summary.sides["Bride"], 1);
        assert_eq!(summary.sides["Groom"], 1);
        assert_eq!(summary.sides["Unknown"], 1);
    }
}
