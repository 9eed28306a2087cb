use std::fmt;

pub const DEFAULT_ANALYSIS_QUERY: &str = "Analyze this financial document for investment insights";

/// Query text handed to the analysis engine. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisQuery(String);

impl AnalysisQuery {
    /// Trims the caller's query, falling back to the default prompt when it is
    /// absent or blank.
    pub fn new(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(q) if !q.is_empty() => Self(q.to_string()),
            _ => Self::default(),
        }
    }

    pub fn from_raw(query: impl Into<String>) -> Self {
        Self(query.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_ANALYSIS_QUERY
    }
}

impl Default for AnalysisQuery {
    fn default() -> Self {
        Self(DEFAULT_ANALYSIS_QUERY.to_string())
    }
}

impl fmt::Display for AnalysisQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
