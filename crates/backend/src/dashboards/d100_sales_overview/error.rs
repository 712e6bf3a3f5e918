use thiserror::Error;

/// Failure of a dataset load attempt. Either variant leaves no dataset behind.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to fetch dataset from '{source_url}': {reason}")]
    Fetch { source_url: String, reason: String },

    #[error("required column '{column}' not found in dataset")]
    SchemaValidation { column: String },
}

impl LoadError {
    pub fn fetch(source_url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            source_url: source_url.into(),
            reason: reason.to_string(),
        }
    }

    /// Short kind used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "fetch",
            Self::SchemaValidation { .. } => "schema_validation",
        }
    }
}

/// A cell that could not be parsed. The row is kept, the cell becomes null
/// (or the column default).
#[derive(Debug, Clone, PartialEq)]
pub struct ParseWarning {
    /// 1-based line in the CSV source, header included
    pub line: u64,
    pub column: &'static str,
    pub value: String,
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}: cannot parse '{}' in column '{}'",
            self.line, self.value, self.column
        )
    }
}
