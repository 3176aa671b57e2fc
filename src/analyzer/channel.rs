use serde::{Deserialize, Serialize};

use crate::reference::ReferenceData;

/// Meio de solicitação: how a ticket reached the helpdesk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelCategory {
    Telefone,
    Email,
    Pessoalmente,
    WebService,
    Chat,
    OperacaoMonitoramento,
    Oficio,
    Ura,
}

impl ChannelCategory {
    /// Display order of the categories in channel summaries.
    pub const ALL: [ChannelCategory; 8] = [
        ChannelCategory::Telefone,
        ChannelCategory::Email,
        ChannelCategory::Pessoalmente,
        ChannelCategory::WebService,
        ChannelCategory::Chat,
        ChannelCategory::OperacaoMonitoramento,
        ChannelCategory::Oficio,
        ChannelCategory::Ura,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ChannelCategory::Telefone => "Telefone",
            ChannelCategory::Email => "Email",
            ChannelCategory::Pessoalmente => "Pessoalmente",
            ChannelCategory::WebService => "Web Service",
            ChannelCategory::Chat => "Chat",
            ChannelCategory::OperacaoMonitoramento => "Operação Monitoramento",
            ChannelCategory::Oficio => "Oficio",
            ChannelCategory::Ura => "URA",
        }
    }
}

/// Label of the bucket holding tickets whose channel code has no category.
pub const UNMAPPED_CHANNEL_LABEL: &str = "Não mapeado";

/// Source channel code (cdorigem) → category.
pub const DEFAULT_CHANNEL_MAP: &[(i64, ChannelCategory)] = &[
    (1, ChannelCategory::Telefone),
    (18, ChannelCategory::Telefone),
    (5, ChannelCategory::Telefone),
    (2, ChannelCategory::Email),
    (6, ChannelCategory::Email),
    (4, ChannelCategory::Pessoalmente),
    (7, ChannelCategory::Pessoalmente),
    (17, ChannelCategory::Pessoalmente),
    (14, ChannelCategory::WebService),
    (3, ChannelCategory::WebService),
    (8, ChannelCategory::WebService),
    (13, ChannelCategory::WebService),
    (20, ChannelCategory::WebService),
    (15, ChannelCategory::Chat),
    (9, ChannelCategory::Chat),
    (10, ChannelCategory::OperacaoMonitoramento),
    (11, ChannelCategory::Oficio),
    (12, ChannelCategory::Ura),
    (19, ChannelCategory::Ura),
];

/// Unmapped or missing codes yield `None`.
pub fn categorize(reference: &ReferenceData, channel_code: Option<i64>) -> Option<ChannelCategory> {
    channel_code.and_then(|c| reference.channel_category(c))
}
