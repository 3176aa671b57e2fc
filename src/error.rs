use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erreur d'entrée/sortie: {0}")]
    Io(#[from] std::io::Error),

    #[error("Erreur CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Erreur SQLite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Erreur de sérialisation: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Colonnes obligatoires manquantes ({table}): {}", .columns.join(", "))]
    MissingColumns {
        table: &'static str,
        columns: Vec<String>,
    },

    #[error("Fichier vide ou sans données")]
    EmptyFile,

    #[error("Date invalide: {0}")]
    InvalidDate(String),

    #[error("Période invalide: {start} est postérieure à {end}")]
    InvalidDateRange { start: String, end: String },

    #[error("Données de référence invalides: {0}")]
    InvalidReference(String),

    #[error("Aucun import actif dans la base")]
    NoActiveImport,

    #[error("{0}")]
    Custom(String),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
