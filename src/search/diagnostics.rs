//! Non-fatal outcomes of loading and lookup.

use std::fmt;
use tracing::warn;

/// Something a caller may want to know about, that is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A lookup matched nothing.
    NotFound {
        query: String,
        /// Similar item names, best first.
        suggestions: Vec<String>,
    },
    /// Several candidates had the best rank; the first was returned.
    Ambiguous {
        query: String,
        chosen: String,
        others: Vec<String>,
    },
    /// A local source was loaded without a root URL, so item URIs stay
    /// relative.
    MissingRootUrl { source: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { query, suggestions } if suggestions.is_empty() => {
                write!(f, "Cannot find {}", query)
            }
            Self::NotFound { query, suggestions } => {
                write!(
                    f,
                    "Cannot find {}. Did you mean: {}?",
                    query,
                    suggestions.join(", ")
                )
            }
            Self::Ambiguous {
                query,
                chosen,
                others,
            } => write!(
                f,
                "Ambiguous lookup {}: using {}, ignoring {}",
                query,
                chosen,
                others.join(", ")
            ),
            Self::MissingRootUrl { source } => write!(
                f,
                "No root URL for {}: item URIs are relative",
                source
            ),
        }
    }
}

/// Receives diagnostics.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);

    /// Whether reports are used at all. When `false`, callers skip building
    /// diagnostics such as near-miss suggestions.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Logs each diagnostic as a warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
    }
}

/// Drops all diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct Quiet;

impl DiagnosticSink for Quiet {
    fn report(&mut self, _diagnostic: Diagnostic) {}

    fn is_enabled(&self) -> bool {
        false
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn messages() {
        let missing = Diagnostic::NotFound {
            query: "srot".to_string(),
            suggestions: vec!["sort".to_string()],
        };
        check!(missing.to_string() == "Cannot find srot. Did you mean: sort?");

        let bare = Diagnostic::NotFound {
            query: "xyz".to_string(),
            suggestions: Vec::new(),
        };
        check!(bare.to_string() == "Cannot find xyz");
    }

    #[test]
    fn vec_collects_reports() {
        let mut sink = Vec::new();
        sink.report(Diagnostic::MissingRootUrl {
            source: "objects.inv".to_string(),
        });
        check!(sink.len() == 1);
        check!(sink.is_enabled());
        check!(!Quiet.is_enabled());
    }
}
