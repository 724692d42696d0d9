use thiserror::Error;

/// Whole-expression failures. Individual clauses never fail to parse; they
/// degrade to [`super::Clause::Unsupported`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterParseError {
    #[error("Empty filter expression")]
    Empty,

    #[error("Unbalanced quote at byte {position} in filter expression")]
    UnbalancedQuote { position: usize },
}
