use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analyzer::filter::DateRange;
use crate::analyzer::reports::{build_report, ReportContext, ReportKind, ReportOutput};
use crate::error::AppError;
use crate::parser::deserializers::parse_date;
use crate::source::Snapshot;
use crate::state::{AppState, SnapshotAccess};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    /// `None` builds the whole catalogue.
    pub kind: Option<ReportKind>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    /// Empty means every reference team.
    #[serde(default)]
    pub teams: Vec<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub range: DateRange,
    pub teams: Vec<u32>,
    pub ticket_count: usize,
    pub activity_count: usize,
    pub reports: Vec<ReportOutput>,
}

fn parse_bound(label: &str, value: &str) -> Result<NaiveDate, AppError> {
    parse_date(value).ok_or_else(|| AppError::InvalidDate(format!("{label}: {value}")))
}

/// Explicit bounds win; a missing bound falls back to the earliest / latest
/// ticket opening date of the snapshot, then to today.
fn resolve_range(snapshot: &Snapshot, request: &ReportRequest) -> Result<DateRange, AppError> {
    let opened = || {
        snapshot
            .tickets
            .iter()
            .filter_map(|t| t.opened_at.map(|dt| dt.date()))
    };
    let today = chrono::Local::now().date_naive();

    let start = match request.date_from.as_deref() {
        Some(s) => parse_bound("début", s)?,
        None => opened().min().unwrap_or(today),
    };
    let end = match request.date_to.as_deref() {
        Some(s) => parse_bound("fin", s)?,
        None => opened().max().unwrap_or(today),
    };
    DateRange::new(start, end)
}

pub(crate) fn run_report_logic(state: &AppState, request: &ReportRequest) -> Result<Dashboard, AppError> {
    let snapshot = state.snapshot()?;
    let range = resolve_range(&snapshot, request)?;

    let teams = if request.teams.is_empty() {
        state.reference.team_codes()
    } else {
        for code in &request.teams {
            if state.reference.team(*code).is_none() {
                log::warn!("Équipe inconnue dans le filtre: {}", code);
            }
        }
        request.teams.clone()
    };

    let ctx = ReportContext::new(
        &state.reference,
        &snapshot.tickets,
        &snapshot.activities,
        range,
        &teams,
    );
    log::debug!(
        "Période {} → {}: {} tickets, {} acompanhamentos retenus",
        range.start,
        range.end,
        ctx.tickets.len(),
        ctx.activities.len()
    );

    let kinds: Vec<ReportKind> = match request.kind {
        Some(kind) => vec![kind],
        None => ReportKind::ALL.to_vec(),
    };
    let reports = kinds.into_iter().map(|kind| build_report(&ctx, kind)).collect();

    Ok(Dashboard {
        range,
        teams,
        ticket_count: ctx.tickets.len(),
        activity_count: ctx.activities.len(),
        reports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::parser::types::Ticket;
    use crate::reference::ReferenceData;
    use crate::source::DataSource;
    use chrono::NaiveDateTime;

    struct Fixed(Vec<Ticket>);

    impl DataSource for Fixed {
        fn load(&self) -> Result<Snapshot, AppError> {
            Ok(Snapshot::new(self.0.clone(), Vec::new()))
        }
        fn describe(&self) -> String {
            "fixed".into()
        }
    }

    fn ticket(id: i64, opened: &str, team: u32) -> Ticket {
        Ticket {
            id,
            opened_at: NaiveDateTime::parse_from_str(opened, "%Y-%m-%d %H:%M:%S").ok(),
            closed_at: None,
            team_code: Some(team),
            operator_code: Some(497),
            responsible_code: None,
            channel_code: Some(1),
            status_code: Some(7),
        }
    }

    fn state() -> AppState {
        let tickets = vec![
            ticket(1, "2024-01-10 09:00:00", 1),
            ticket(2, "2024-03-02 12:00:00", 1),
            ticket(3, "2024-02-15 08:30:00", 3),
        ];
        AppState::new(ReferenceData::default(), AppConfig::default(), Box::new(Fixed(tickets)))
    }

    #[test]
    fn test_defaults_cover_snapshot_and_all_teams() {
        let dashboard = run_report_logic(&state(), &ReportRequest::default()).unwrap();
        assert_eq!(dashboard.range.start.to_string(), "2024-01-10");
        assert_eq!(dashboard.range.end.to_string(), "2024-03-02");
        assert_eq!(dashboard.teams, vec![1, 3]);
        assert_eq!(dashboard.ticket_count, 3);
        assert_eq!(dashboard.reports.len(), ReportKind::ALL.len());
    }

    #[test]
    fn test_single_kind_with_explicit_range() {
        let request = ReportRequest {
            kind: Some(ReportKind::TeamVolume),
            date_from: Some("2024-02-01".into()),
            date_to: Some("2024-03-31".into()),
            teams: vec![1],
        };
        let dashboard = run_report_logic(&state(), &request).unwrap();
        assert_eq!(dashboard.reports.len(), 1);
        let report = &dashboard.reports[0];
        // February + March, selected team only
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.total, 1);
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let request = ReportRequest {
            date_from: Some("2024-05-01".into()),
            date_to: Some("2024-01-01".into()),
            ..ReportRequest::default()
        };
        let err = run_report_logic(&state(), &request).unwrap_err();
        assert!(matches!(err, AppError::InvalidDateRange { .. }));
    }

    #[test]
    fn test_unparseable_bound_is_rejected() {
        let request = ReportRequest {
            date_from: Some("janvier".into()),
            ..ReportRequest::default()
        };
        let err = run_report_logic(&state(), &request).unwrap_err();
        assert!(matches!(err, AppError::InvalidDate(_)));
    }

    #[test]
    fn test_request_deserializes_from_json() {
        let request: ReportRequest = serde_json::from_str(
            r#"{"kind":"finalized-by-operator","dateFrom":"2024-01-01","dateTo":"2024-01-31"}"#,
        )
        .unwrap();
        assert_eq!(request.kind, Some(ReportKind::FinalizedByOperator));
        assert!(request.teams.is_empty());
    }
}
