use std::collections::HashSet;

use tracing::warn;

/// Which households a run should visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Contiguous window starting at `start`; `limit` of `None` runs to the end
    Window { start: usize, limit: Option<usize> },
    /// Explicit positions, visited in the given order
    Explicit(Vec<usize>),
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Window {
            start: 0,
            limit: None,
        }
    }
}

impl Selection {
    /// Resolve to concrete positions against a list of `rows` households.
    pub fn targets(&self, rows: usize) -> Vec<usize> {
        match self {
            Selection::Window { start, limit } => {
                let end = match limit {
                    Some(limit) => start.saturating_add(*limit).min(rows),
                    None => rows,
                };
                (*start..end).collect()
            }
            Selection::Explicit(positions) => {
                let mut seen = HashSet::new();
                let mut targets = Vec::with_capacity(positions.len());
                for &position in positions {
                    if position >= rows {
                        warn!(position, rows, "Requested household is beyond the guest list");
                        continue;
                    }
                    if seen.insert(position) {
                        targets.push(position);
                    }
                }
                targets
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window() {
        assert_eq!(Selection::default().targets(3), vec![0, 1, 2]);
        let window = Selection::Window {
            start: 2,
            limit: Some(2),
        };
        assert_eq!(window.targets(10), vec![2, 3]);
        assert_eq!(window.targets(3), vec![2]);
        let past_end = Selection::Window {
            start: 5,
            limit: None,
        };
        assert!(past_end.targets(3).is_empty());
    }

    #[test]
    fn test_explicit_keeps_order_and_drops_duplicates() {
        let explicit = Selection::Explicit(vec![7, 2, 7, 40, 0]);
        assert_eq!(explicit.targets(10), vec![7, 2, 0]);
    }
}
