//! The fixed catalogue of dashboard reports. Each report is a filter →
//! aggregate → reconcile chain over one immutable snapshot.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::analyzer::aggregate::{
    aggregate, is_finalized, Dimension, FollowUpMode, KeyPart, Metric, TeamAssignment,
};
use crate::analyzer::channel::{ChannelCategory, UNMAPPED_CHANNEL_LABEL};
use crate::analyzer::filter::{filter_activities, filter_tickets, DateRange};
use crate::analyzer::reconcile::{
    reconcile, ReferenceEntry, ReportStats, RowOrder, SummaryRow,
};
use crate::analyzer::temporal::generate_month_keys;
use crate::parser::types::{Activity, Ticket};
use crate::reference::ReferenceData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    /// Tickets per month and per recorded team.
    TeamVolume,
    /// Tickets per month and per home team of the handling operator.
    TeamAttendance,
    TicketsByOperator,
    /// Distinct tickets touched per operator, from the activity log.
    AttendedByOperator,
    TicketsByChannel,
    FollowUpsByType,
    FollowUpsByMarker,
    FinalizedByOperator,
}

impl ReportKind {
    pub const ALL: [ReportKind; 8] = [
        ReportKind::TeamVolume,
        ReportKind::TeamAttendance,
        ReportKind::TicketsByOperator,
        ReportKind::AttendedByOperator,
        ReportKind::TicketsByChannel,
        ReportKind::FollowUpsByType,
        ReportKind::FollowUpsByMarker,
        ReportKind::FinalizedByOperator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::TeamVolume => "team-volume",
            ReportKind::TeamAttendance => "team-attendance",
            ReportKind::TicketsByOperator => "tickets-by-operator",
            ReportKind::AttendedByOperator => "attended-by-operator",
            ReportKind::TicketsByChannel => "tickets-by-channel",
            ReportKind::FollowUpsByType => "follow-ups-by-type",
            ReportKind::FollowUpsByMarker => "follow-ups-by-marker",
            ReportKind::FinalizedByOperator => "finalized-by-operator",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::TeamVolume => "Chamados por Equipe e Mês",
            ReportKind::TeamAttendance => "Chamados por Equipe do Operador e Mês",
            ReportKind::TicketsByOperator => "Chamados por Operador",
            ReportKind::AttendedByOperator => "Chamados Atendidos por Operador",
            ReportKind::TicketsByChannel => "Chamados por Meio de Solicitação",
            ReportKind::FollowUpsByType => "Acompanhamentos de Interesse por Operador (tipo)",
            ReportKind::FollowUpsByMarker => "Acompanhamentos de Interesse por Operador (descrição)",
            ReportKind::FinalizedByOperator => "Chamados Finalizados por Operador",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("Rapport inconnu: {s}"))
    }
}

/// What the presentation layer receives for one report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOutput {
    pub kind: ReportKind,
    pub title: String,
    pub rows: Vec<SummaryRow>,
    pub total: usize,
    /// Rows that matched the report's criteria but map to no reference entity.
    pub excluded: usize,
    pub zero_count: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ReportStats>,
}

/// Filtered view of one snapshot, shared by all reports of a request.
pub struct ReportContext<'a> {
    pub reference: &'a ReferenceData,
    pub range: DateRange,
    /// Teams selected by the filter; the team grid is limited to them.
    pub teams: Vec<u32>,
    pub tickets: Vec<&'a Ticket>,
    pub activities: Vec<&'a Activity>,
}

impl<'a> ReportContext<'a> {
    pub fn new(
        reference: &'a ReferenceData,
        tickets: &'a [Ticket],
        activities: &'a [Activity],
        range: DateRange,
        team_codes: &[u32],
    ) -> Self {
        ReportContext {
            reference,
            range,
            teams: team_codes.to_vec(),
            tickets: filter_tickets(tickets, &range, team_codes),
            activities: filter_activities(activities, &range),
        }
    }
}

// ─── Reference sets ──────────────────────────────────────────────────────────

pub fn operator_entries(reference: &ReferenceData) -> Vec<ReferenceEntry> {
    reference
        .operators()
        .iter()
        .map(|op| {
            let entry = ReferenceEntry::new(vec![KeyPart::Code(op.code)], op.name.clone());
            match reference.team_name(op.team) {
                Some(team) => entry.with_group(team),
                None => entry,
            }
        })
        .collect()
}

/// Every month of `range` crossed with every team, month-major.
pub fn team_month_entries(
    reference: &ReferenceData,
    range: &DateRange,
    teams: &[u32],
) -> Vec<ReferenceEntry> {
    let selected: Vec<_> = reference
        .teams()
        .iter()
        .filter(|t| teams.contains(&t.code))
        .collect();
    generate_month_keys(range.start, range.end)
        .into_iter()
        .flat_map(|(period_key, period_label)| {
            selected.iter().map(move |team| {
                ReferenceEntry::new(
                    vec![KeyPart::Period(period_key.clone()), KeyPart::Code(i64::from(team.code))],
                    team.name.clone(),
                )
                .with_group(period_label.clone())
            })
        })
        .collect()
}

/// The channel categories, plus the unmapped bucket when `with_unmapped`.
pub fn channel_entries(with_unmapped: bool) -> Vec<ReferenceEntry> {
    let mut entries: Vec<ReferenceEntry> = ChannelCategory::ALL
        .iter()
        .map(|c| ReferenceEntry::new(vec![KeyPart::Channel(*c)], c.label()))
        .collect();
    if with_unmapped {
        entries.push(ReferenceEntry::new(vec![KeyPart::Null], UNMAPPED_CHANNEL_LABEL));
    }
    entries
}

// ─── Report builders ─────────────────────────────────────────────────────────

pub fn build_report(ctx: &ReportContext<'_>, kind: ReportKind) -> ReportOutput {
    let output = match kind {
        ReportKind::TeamVolume => team_by_month(ctx, kind, TeamAssignment::TicketTeam),
        ReportKind::TeamAttendance => team_by_month(ctx, kind, TeamAssignment::OperatorHomeTeam),
        ReportKind::TicketsByOperator => tickets_by_operator(ctx),
        ReportKind::AttendedByOperator => attended_by_operator(ctx),
        ReportKind::TicketsByChannel => tickets_by_channel(ctx),
        ReportKind::FollowUpsByType => follow_ups(ctx, kind, FollowUpMode::ActivityType),
        ReportKind::FollowUpsByMarker => follow_ups(ctx, kind, FollowUpMode::DescriptionMarker),
        ReportKind::FinalizedByOperator => finalized_by_operator(ctx),
    };

    if output.excluded > 0 {
        log::debug!(
            "{}: {} ligne(s) hors référentiel exclue(s)",
            kind,
            output.excluded
        );
    }
    if !output.zero_count.is_empty() {
        log::warn!("{}: sans activité sur la période: {}", kind, output.zero_count.join(", "));
    }
    output
}

fn team_by_month(ctx: &ReportContext<'_>, kind: ReportKind, mode: TeamAssignment) -> ReportOutput {
    let aggs = aggregate(
        &ctx.tickets,
        &[Dimension::Period, Dimension::Team(mode)],
        Metric::Rows,
        ctx.reference,
    );
    let reconciled = reconcile(
        &aggs,
        &team_month_entries(ctx.reference, &ctx.range, &ctx.teams),
        RowOrder::Reference,
    );
    let zero_count = reconciled
        .rows
        .iter()
        .filter(|r| r.count == 0)
        .map(|r| match &r.group {
            Some(period) => format!("{} ({})", r.label, period),
            None => r.label.clone(),
        })
        .collect();

    ReportOutput {
        kind,
        title: kind.title().to_string(),
        total: reconciled.total,
        excluded: reconciled.excluded,
        rows: reconciled.rows,
        zero_count,
        stats: None,
    }
}

fn tickets_by_operator(ctx: &ReportContext<'_>) -> ReportOutput {
    let kind = ReportKind::TicketsByOperator;
    let aggs = aggregate(&ctx.tickets, &[Dimension::Operator], Metric::Rows, ctx.reference);
    let reconciled = reconcile(&aggs, &operator_entries(ctx.reference), RowOrder::CountDesc);
    ReportOutput {
        kind,
        title: kind.title().to_string(),
        total: reconciled.total,
        excluded: reconciled.excluded,
        zero_count: reconciled.zero_count(),
        rows: reconciled.rows,
        stats: None,
    }
}

fn attended_by_operator(ctx: &ReportContext<'_>) -> ReportOutput {
    let kind = ReportKind::AttendedByOperator;
    let aggs = aggregate(
        &ctx.activities,
        &[Dimension::Operator],
        Metric::DistinctTickets,
        ctx.reference,
    );
    let reconciled = reconcile(&aggs, &operator_entries(ctx.reference), RowOrder::CountDesc);
    ReportOutput {
        kind,
        title: kind.title().to_string(),
        total: reconciled.total,
        excluded: reconciled.excluded,
        zero_count: reconciled.zero_count(),
        rows: reconciled.rows,
        stats: None,
    }
}

fn tickets_by_channel(ctx: &ReportContext<'_>) -> ReportOutput {
    let kind = ReportKind::TicketsByChannel;
    let aggs = aggregate(&ctx.tickets, &[Dimension::ChannelCategory], Metric::Rows, ctx.reference);
    let has_unmapped = aggs.iter().any(|a| a.key == [KeyPart::Null]);
    let reconciled =
        reconcile(&aggs, &channel_entries(has_unmapped), RowOrder::CountDesc).with_percentages();
    ReportOutput {
        kind,
        title: kind.title().to_string(),
        total: reconciled.total,
        excluded: reconciled.excluded,
        zero_count: reconciled.zero_count(),
        rows: reconciled.rows,
        stats: None,
    }
}

fn follow_ups(ctx: &ReportContext<'_>, kind: ReportKind, mode: FollowUpMode) -> ReportOutput {
    let matching: Vec<&Activity> = ctx
        .activities
        .iter()
        .copied()
        .filter(|a| mode.matches(a))
        .collect();
    let aggs = aggregate(&matching, &[Dimension::Operator], Metric::Rows, ctx.reference);
    let reconciled =
        reconcile(&aggs, &operator_entries(ctx.reference), RowOrder::CountDesc).with_percentages();
    ReportOutput {
        kind,
        title: kind.title().to_string(),
        total: reconciled.total,
        excluded: reconciled.excluded,
        zero_count: reconciled.zero_count(),
        stats: Some(reconciled.stats()),
        rows: reconciled.rows,
    }
}

fn finalized_by_operator(ctx: &ReportContext<'_>) -> ReportOutput {
    let kind = ReportKind::FinalizedByOperator;
    let finalized: Vec<&Ticket> = ctx
        .tickets
        .iter()
        .copied()
        .filter(|t| is_finalized(t))
        .collect();
    let aggs = aggregate(&finalized, &[Dimension::Responsible], Metric::Rows, ctx.reference);
    let reconciled =
        reconcile(&aggs, &operator_entries(ctx.reference), RowOrder::CountDesc).with_percentages();
    ReportOutput {
        kind,
        title: kind.title().to_string(),
        total: reconciled.total,
        excluded: reconciled.excluded,
        zero_count: reconciled.zero_count(),
        stats: Some(reconciled.stats()),
        rows: reconciled.rows,
    }
}
