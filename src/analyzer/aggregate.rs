//! Grouping of filtered tickets/activities by one or more dimensions.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::analyzer::channel::{categorize, ChannelCategory};
use crate::analyzer::temporal::month_key;
use crate::parser::types::{Activity, Ticket};
use crate::reference::ReferenceData;

/// cdsituacao of a closed ticket.
pub const FINALIZED_STATUS: i64 = 7;

/// cdtipoacompanhamento values counted as follow-ups of interest.
pub const FOLLOW_UP_TYPE_CODES: [f64; 2] = [20.0, 22.0];

/// Marker phrase looked for in activity descriptions (case-insensitive).
pub const FOLLOW_UP_MARKER: &str = "retorno ao solicitante";

/// Which team a ticket is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamAssignment {
    /// The ticket's recorded cdequipe.
    TicketTeam,
    /// The home team of the ticket's operator.
    OperatorHomeTeam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Period,
    Operator,
    /// Ticket responsible, falling back to the operator when absent.
    Responsible,
    Team(TeamAssignment),
    ChannelCategory,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Rows,
    DistinctTickets,
}

/// Which activities count as follow-ups of interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpMode {
    ActivityType,
    DescriptionMarker,
}

impl FollowUpMode {
    pub fn matches(&self, activity: &Activity) -> bool {
        match self {
            FollowUpMode::ActivityType => activity
                .activity_type_code
                .is_some_and(|c| FOLLOW_UP_TYPE_CODES.contains(&c)),
            FollowUpMode::DescriptionMarker => activity
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(FOLLOW_UP_MARKER)),
        }
    }
}

pub fn is_finalized(ticket: &Ticket) -> bool {
    ticket.status_code == Some(FINALIZED_STATUS)
}

/// One component of a grouping key. `Null` stands for a missing or unmapped
/// value; such rows form their own group rather than being dropped.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum KeyPart {
    Period(String),
    Code(i64),
    Channel(ChannelCategory),
    Null,
}

impl KeyPart {
    fn from_code(code: Option<i64>) -> Self {
        code.map(KeyPart::Code).unwrap_or(KeyPart::Null)
    }
}

pub type GroupKey = Vec<KeyPart>;

/// A source row that can be grouped.
pub trait Record {
    fn ticket_id(&self) -> i64;
    fn timestamp(&self) -> Option<&NaiveDateTime>;
    fn dimension(&self, dim: Dimension, reference: &ReferenceData) -> KeyPart;

    /// Calendar month of the primary timestamp.
    fn period(&self) -> KeyPart {
        self.timestamp()
            .map(|dt| KeyPart::Period(month_key(dt)))
            .unwrap_or(KeyPart::Null)
    }
}

impl Record for Ticket {
    fn ticket_id(&self) -> i64 {
        self.id
    }

    fn timestamp(&self) -> Option<&NaiveDateTime> {
        self.opened_at.as_ref()
    }

    fn dimension(&self, dim: Dimension, reference: &ReferenceData) -> KeyPart {
        match dim {
            Dimension::Period => self.period(),
            Dimension::Operator => KeyPart::from_code(self.operator_code),
            Dimension::Responsible => {
                KeyPart::from_code(self.responsible_code.or(self.operator_code))
            }
            Dimension::Team(TeamAssignment::TicketTeam) => {
                KeyPart::from_code(self.team_code.map(i64::from))
            }
            Dimension::Team(TeamAssignment::OperatorHomeTeam) => KeyPart::from_code(
                self.operator_code
                    .and_then(|op| reference.home_team(op))
                    .map(i64::from),
            ),
            Dimension::ChannelCategory => categorize(reference, self.channel_code)
                .map(KeyPart::Channel)
                .unwrap_or(KeyPart::Null),
            Dimension::Status => KeyPart::from_code(self.status_code),
        }
    }
}

impl Record for Activity {
    fn ticket_id(&self) -> i64 {
        self.ticket_id
    }

    fn timestamp(&self) -> Option<&NaiveDateTime> {
        self.occurred_at.as_ref()
    }

    fn dimension(&self, dim: Dimension, reference: &ReferenceData) -> KeyPart {
        match dim {
            Dimension::Period => self.period(),
            Dimension::Operator | Dimension::Responsible => KeyPart::from_code(self.operator_code),
            // Activities carry no team of their own: always the operator's home team.
            Dimension::Team(_) => KeyPart::from_code(
                self.operator_code
                    .and_then(|op| reference.home_team(op))
                    .map(i64::from),
            ),
            Dimension::ChannelCategory | Dimension::Status => KeyPart::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Aggregate {
    pub key: GroupKey,
    pub count: usize,
}

/// Groups `rows` by `group_by` and applies `metric` to each group.
/// Groups come out in key order; callers are expected to sort for display.
pub fn aggregate<R: Record>(
    rows: &[&R],
    group_by: &[Dimension],
    metric: Metric,
    reference: &ReferenceData,
) -> Vec<Aggregate> {
    let key_of = |row: &R| -> GroupKey {
        group_by
            .iter()
            .map(|&dim| row.dimension(dim, reference))
            .collect()
    };

    match metric {
        Metric::Rows => {
            let mut counts: BTreeMap<GroupKey, usize> = BTreeMap::new();
            for &row in rows {
                *counts.entry(key_of(row)).or_insert(0) += 1;
            }
            counts
                .into_iter()
                .map(|(key, count)| Aggregate { key, count })
                .collect()
        }
        Metric::DistinctTickets => {
            let mut distinct: BTreeMap<GroupKey, BTreeSet<i64>> = BTreeMap::new();
            for &row in rows {
                distinct.entry(key_of(row)).or_default().insert(row.ticket_id());
            }
            distinct
                .into_iter()
                .map(|(key, ids)| Aggregate {
                    key,
                    count: ids.len(),
                })
                .collect()
        }
    }
}
