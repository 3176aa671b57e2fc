use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::AppError;
use crate::parser::types::{Activity, Ticket};

/// Inclusive calendar-date range: start ≤ date(t) ≤ end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if start > end {
            return Err(AppError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(DateRange { start, end })
    }

    /// Missing timestamps never match.
    pub fn contains(&self, ts: Option<&NaiveDateTime>) -> bool {
        match ts {
            Some(dt) => {
                let d = dt.date();
                self.start <= d && d <= self.end
            }
            None => false,
        }
    }
}

/// Tickets opened within `range` whose team is selected.
/// An empty team selection selects nothing.
pub fn filter_tickets<'a>(
    tickets: &'a [Ticket],
    range: &DateRange,
    team_codes: &[u32],
) -> Vec<&'a Ticket> {
    tickets
        .iter()
        .filter(|t| range.contains(t.opened_at.as_ref()))
        .filter(|t| t.team_code.is_some_and(|code| team_codes.contains(&code)))
        .collect()
}

/// Activities that occurred within `range`.
pub fn filter_activities<'a>(activities: &'a [Activity], range: &DateRange) -> Vec<&'a Activity> {
    activities
        .iter()
        .filter(|a| range.contains(a.occurred_at.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn ticket(id: i64, opened: Option<&str>, team: Option<u32>) -> Ticket {
        Ticket {
            id,
            opened_at: opened.map(dt),
            closed_at: None,
            team_code: team,
            operator_code: Some(497),
            responsible_code: None,
            channel_code: Some(1),
            status_code: Some(1),
        }
    }

    fn activity(id: &str, occurred: Option<&str>) -> Activity {
        Activity {
            id: id.to_string(),
            ticket_id: 1,
            occurred_at: occurred.map(dt),
            operator_code: Some(206),
            activity_type_code: Some(22.0),
            description: None,
        }
    }

    #[test]
    fn test_range_rejects_inverted_bounds() {
        let err = DateRange::new(d("2024-02-01"), d("2024-01-01")).unwrap_err();
        assert!(matches!(err, AppError::InvalidDateRange { .. }));
        assert!(DateRange::new(d("2024-01-01"), d("2024-01-01")).is_ok());
    }

    #[test]
    fn test_bounds_are_inclusive_on_whole_days() {
        let range = DateRange::new(d("2024-01-01"), d("2024-01-31")).unwrap();
        let tickets = vec![
            ticket(1, Some("2024-01-01 00:00:00"), Some(1)),
            ticket(2, Some("2024-01-31 23:59:59"), Some(1)),
            ticket(3, Some("2023-12-31 23:59:59"), Some(1)),
            ticket(4, Some("2024-02-01 00:00:00"), Some(1)),
        ];
        let ids: Vec<i64> = filter_tickets(&tickets, &range, &[1]).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_null_timestamp_never_matches() {
        let range = DateRange::new(d("1970-01-01"), d("2999-12-31")).unwrap();
        let tickets = vec![ticket(1, None, Some(1))];
        assert!(filter_tickets(&tickets, &range, &[1]).is_empty());
        let acts = vec![activity("a", None)];
        assert!(filter_activities(&acts, &range).is_empty());
    }

    #[test]
    fn test_team_selection() {
        let range = DateRange::new(d("2024-01-01"), d("2024-12-31")).unwrap();
        let tickets = vec![
            ticket(1, Some("2024-03-01 10:00:00"), Some(1)),
            ticket(2, Some("2024-03-01 10:00:00"), Some(3)),
            ticket(3, Some("2024-03-01 10:00:00"), None),
        ];
        assert_eq!(filter_tickets(&tickets, &range, &[3]).len(), 1);
        assert_eq!(filter_tickets(&tickets, &range, &[1, 3]).len(), 2);
    }

    #[test]
    fn test_empty_team_selection_selects_nothing() {
        let range = DateRange::new(d("2024-01-01"), d("2024-12-31")).unwrap();
        let tickets = vec![ticket(1, Some("2024-03-01 10:00:00"), Some(1))];
        assert!(filter_tickets(&tickets, &range, &[]).is_empty());
    }

    #[test]
    fn test_filtered_timestamps_within_range() {
        let range = DateRange::new(d("2024-01-10"), d("2024-01-20")).unwrap();
        let acts: Vec<Activity> = (1..=31)
            .map(|day| activity(&day.to_string(), Some(&format!("2024-01-{day:02} 12:00:00"))))
            .collect();
        let kept = filter_activities(&acts, &range);
        assert_eq!(kept.len(), 11);
        for a in kept {
            let day = a.occurred_at.unwrap().date();
            assert!(range.start <= day && day <= range.end);
        }
    }

    #[test]
    fn test_input_is_not_mutated() {
        let range = DateRange::new(d("2024-01-01"), d("2024-01-31")).unwrap();
        let tickets = vec![
            ticket(1, Some("2024-01-05 10:00:00"), Some(1)),
            ticket(2, Some("2024-05-05 10:00:00"), Some(1)),
        ];
        let before = tickets.clone();
        let _ = filter_tickets(&tickets, &range, &[1]);
        assert_eq!(tickets, before);
    }
}
