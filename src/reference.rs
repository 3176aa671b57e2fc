//! Static reference tables: teams, operators (with their home team) and the
//! channel-code → channel-category mapping.
//!
//! Built once at startup and shared read-only by every report.

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analyzer::channel::{ChannelCategory, DEFAULT_CHANNEL_MAP};
use crate::error::AppError;

/// Équipes connues : (code, nom).
const DEFAULT_TEAMS: &[(u32, &str)] = &[(1, "Service Desk"), (3, "Suporte Técnico")];

/// Opérateurs connus : (code, nom, équipe d'origine).
const DEFAULT_OPERATORS: &[(i64, &str, u32)] = &[
    (497, "Bryan Hudson do Nascimento Silva", 1),
    (462, "Maria Priscila Barros Pinheiro", 1),
    (122, "Anderlan Davi dos Santos Pontes", 1),
    (63, "Victor Salvador de Araújo", 1),
    (206, "João Saulo da costa Almeida", 3),
    (133, "Pedro Henrique Pereira da Rocha", 3),
    (240, "Alan Mendonça dos Santos", 3),
    (258, "Bayron Rafael Pires de Lima", 3),
    (103, "Flávio Oliveira de Morais Sarmento", 3),
    (229, "João Marcos Correia da Silva", 3),
    (158, "Thiago Ferreira Silva", 3),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub code: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub code: i64,
    pub name: String,
    pub team: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMapping {
    pub code: i64,
    pub category: ChannelCategory,
}

/// On-disk shape of a reference override file.
#[derive(Debug, Deserialize)]
struct ReferenceFile {
    teams: Vec<Team>,
    operators: Vec<Operator>,
    #[serde(default)]
    channels: Option<Vec<ChannelMapping>>,
}

/// Immutable reference data. Insertion order of teams and operators is the
/// tie-break order used when ranking reconciled summaries.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    teams: Vec<Team>,
    operators: Vec<Operator>,
    channels: HashMap<i64, ChannelCategory>,
    team_index: HashMap<u32, usize>,
    operator_index: HashMap<i64, usize>,
}

impl Default for ReferenceData {
    fn default() -> Self {
        let teams = DEFAULT_TEAMS
            .iter()
            .map(|&(code, name)| Team {
                code,
                name: name.to_string(),
            })
            .collect();
        let operators = DEFAULT_OPERATORS
            .iter()
            .map(|&(code, name, team)| Operator {
                code,
                name: name.to_string(),
                team,
            })
            .collect();
        let channels = DEFAULT_CHANNEL_MAP
            .iter()
            .map(|&(code, category)| ChannelMapping { code, category })
            .collect();
        Self::from_parts(teams, operators, channels)
    }
}

impl ReferenceData {
    /// Builds reference data after checking that codes are unique and that
    /// every operator points at a known team.
    pub fn new(
        teams: Vec<Team>,
        operators: Vec<Operator>,
        channels: Vec<ChannelMapping>,
    ) -> Result<Self, AppError> {
        if teams.is_empty() {
            return Err(AppError::InvalidReference("aucune équipe définie".into()));
        }
        if operators.is_empty() {
            return Err(AppError::InvalidReference("aucun opérateur défini".into()));
        }

        let mut seen_teams = HashSet::new();
        for t in &teams {
            if !seen_teams.insert(t.code) {
                return Err(AppError::InvalidReference(format!(
                    "code d'équipe dupliqué: {}",
                    t.code
                )));
            }
        }

        let mut seen_ops = HashSet::new();
        for op in &operators {
            if !seen_ops.insert(op.code) {
                return Err(AppError::InvalidReference(format!(
                    "code d'opérateur dupliqué: {}",
                    op.code
                )));
            }
            if !seen_teams.contains(&op.team) {
                return Err(AppError::InvalidReference(format!(
                    "opérateur {} rattaché à une équipe inconnue: {}",
                    op.code, op.team
                )));
            }
        }

        let mut seen_channels = HashSet::new();
        for c in &channels {
            if !seen_channels.insert(c.code) {
                return Err(AppError::InvalidReference(format!(
                    "code de canal dupliqué: {}",
                    c.code
                )));
            }
        }

        Ok(Self::from_parts(teams, operators, channels))
    }

    fn from_parts(teams: Vec<Team>, operators: Vec<Operator>, channels: Vec<ChannelMapping>) -> Self {
        let team_index = teams.iter().enumerate().map(|(i, t)| (t.code, i)).collect();
        let operator_index = operators
            .iter()
            .enumerate()
            .map(|(i, o)| (o.code, i))
            .collect();
        let channels = channels.into_iter().map(|c| (c.code, c.category)).collect();
        ReferenceData {
            teams,
            operators,
            channels,
            team_index,
            operator_index,
        }
    }

    /// Loads a JSON override. Channels are optional and default to the
    /// built-in mapping.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, AppError> {
        let file: ReferenceFile = serde_json::from_reader(reader)?;
        let channels = file.channels.unwrap_or_else(|| {
            DEFAULT_CHANNEL_MAP
                .iter()
                .map(|&(code, category)| ChannelMapping { code, category })
                .collect()
        });
        Self::new(file.teams, file.operators, channels)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    pub fn team_codes(&self) -> Vec<u32> {
        self.teams.iter().map(|t| t.code).collect()
    }

    pub fn operator(&self, code: i64) -> Option<&Operator> {
        self.operator_index.get(&code).map(|&i| &self.operators[i])
    }

    /// Home team of an operator, independent of any ticket's own team code.
    pub fn home_team(&self, operator_code: i64) -> Option<u32> {
        self.operator(operator_code).map(|o| o.team)
    }

    pub fn team(&self, code: u32) -> Option<&Team> {
        self.team_index.get(&code).map(|&i| &self.teams[i])
    }

    pub fn team_name(&self, code: u32) -> Option<&str> {
        self.team(code).map(|t| t.name.as_str())
    }

    pub fn channel_category(&self, channel_code: i64) -> Option<ChannelCategory> {
        self.channels.get(&channel_code).copied()
    }
}
