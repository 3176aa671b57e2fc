use std::collections::HashMap;

use crate::error::AppError;

// Tickets (hd_chamado)
pub const TICKET_ID: &str = "cdchamado";
pub const TICKET_OPENED_AT: &str = "dtchamado";
pub const TICKET_CLOSED_AT: &str = "dttermino";
pub const TICKET_TEAM: &str = "cdequipe";
pub const TICKET_OPERATOR: &str = "cdusuario";
pub const TICKET_RESPONSIBLE: &str = "cdresponsavel";
pub const TICKET_CHANNEL: &str = "cdorigem";
pub const TICKET_STATUS: &str = "cdsituacao";

// Activities (hd_acompanhamento)
pub const ACTIVITY_ID: &str = "cdacompanhamento";
pub const ACTIVITY_TICKET_ID: &str = "cdchamado";
pub const ACTIVITY_OCCURRED_AT: &str = "dtacompanhamento";
pub const ACTIVITY_OPERATOR: &str = "cdusuario";
pub const ACTIVITY_TYPE: &str = "cdtipoacompanhamento";
pub const ACTIVITY_DESCRIPTION: &str = "dsacompanhamento";

/// Column contract of one source table.
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    pub name: &'static str,
    /// Colonnes obligatoires : l'import échoue si l'une d'elles est absente.
    pub required: &'static [&'static str],
    /// Colonnes optionnelles : absentes = valeur par défaut, signalées dans le résultat.
    pub optional: &'static [&'static str],
}

pub const TICKETS_SCHEMA: TableSchema = TableSchema {
    name: "tickets",
    required: &[
        TICKET_ID,
        TICKET_OPENED_AT,
        TICKET_CLOSED_AT,
        TICKET_TEAM,
        TICKET_OPERATOR,
        TICKET_CHANNEL,
        TICKET_STATUS,
    ],
    optional: &[TICKET_RESPONSIBLE],
};

pub const ACTIVITIES_SCHEMA: TableSchema = TableSchema {
    name: "activities",
    required: &[
        ACTIVITY_ID,
        ACTIVITY_TICKET_ID,
        ACTIVITY_OCCURRED_AT,
        ACTIVITY_OPERATOR,
        ACTIVITY_TYPE,
        ACTIVITY_DESCRIPTION,
    ],
    optional: &[],
};

/// Maps column names to their index in a CSV record.
pub struct ColumnMap {
    indices: HashMap<String, usize>,
    headers: Vec<String>,
}

impl ColumnMap {
    /// Header fields are trimmed of surrounding whitespace (and a UTF-8 BOM).
    pub fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut indices = HashMap::new();
        let mut header_list = Vec::new();
        for (i, field) in headers.iter().enumerate() {
            let name = field.trim_start_matches('\u{feff}').trim().to_string();
            indices.entry(name.clone()).or_insert(i);
            header_list.push(name);
        }
        ColumnMap {
            indices,
            headers: header_list,
        }
    }

    pub fn get<'a>(&self, record: &'a csv::StringRecord, col: &str) -> Option<&'a str> {
        self.indices.get(col).and_then(|&i| record.get(i))
    }

    pub fn has(&self, col: &str) -> bool {
        self.indices.contains_key(col)
    }

    pub fn all_headers(&self) -> &[String] {
        &self.headers
    }
}

#[derive(Debug)]
pub struct ColumnValidation {
    pub present: Vec<String>,
    pub missing_optional: Vec<String>,
}

/// Returns `AppError::MissingColumns` naming every absent required column.
pub fn validate_columns(
    col_map: &ColumnMap,
    schema: &TableSchema,
) -> Result<ColumnValidation, AppError> {
    let missing_required: Vec<String> = schema
        .required
        .iter()
        .filter(|&&c| !col_map.has(c))
        .map(|c| c.to_string())
        .collect();

    if !missing_required.is_empty() {
        return Err(AppError::MissingColumns {
            table: schema.name,
            columns: missing_required,
        });
    }

    let missing_optional = schema
        .optional
        .iter()
        .filter(|&&c| !col_map.has(c))
        .map(|c| c.to_string())
        .collect();

    Ok(ColumnValidation {
        present: col_map.all_headers().to_vec(),
        missing_optional,
    })
}
