use chrono::NaiveDateTime;
use serde::Serialize;

/// One ticket row as read from the source, before normalisation.
#[derive(Debug, Clone, Default)]
pub struct TicketRaw {
    pub id: Option<String>,
    pub opened_at: Option<String>,
    pub closed_at: Option<String>,
    pub team_code: Option<String>,
    pub operator_code: Option<String>,
    pub responsible_code: Option<String>,
    pub channel_code: Option<String>,
    pub status_code: Option<String>,
}

/// One activity (acompanhamento) row as read from the source.
#[derive(Debug, Clone, Default)]
pub struct ActivityRaw {
    pub id: Option<String>,
    pub ticket_id: Option<String>,
    pub occurred_at: Option<String>,
    pub operator_code: Option<String>,
    pub activity_type_code: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: i64,
    /// `None` when the source timestamp could not be parsed.
    pub opened_at: Option<NaiveDateTime>,
    pub closed_at: Option<NaiveDateTime>,
    pub team_code: Option<u32>,
    pub operator_code: Option<i64>,
    pub responsible_code: Option<i64>,
    pub channel_code: Option<i64>,
    pub status_code: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub ticket_id: i64,
    pub occurred_at: Option<NaiveDateTime>,
    pub operator_code: Option<i64>,
    pub activity_type_code: Option<f64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseWarning {
    pub line: usize,
    pub message: String,
}
