use super::parser::{Clause, Field, FilterExpression, Operator};
use crate::diagnostics::DiagnosticSink;
use crate::normalize::Record;
use serde_json::Value;
use std::borrow::Cow;

const CONTEXT: &str = "filter";

/// Raw value of `field`, or `None` when absent or null.
///
/// Non-string values are compared in their JSON text form.
fn field_value<'r>(record: &'r Record, field: Field) -> Option<Cow<'r, str>> {
    match record.get(field.name())? {
        Value::Null => None,
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        other => Some(Cow::Owned(other.to_string())),
    }
}

impl Clause {
    /// Unsupported clauses always match.
    pub fn matches(&self, record: &Record) -> bool {
        let Clause::Predicate { field, op, value } = self else {
            return true;
        };
        let Some(actual) = field_value(record, *field) else {
            return false;
        };
        if actual.is_empty() {
            return false;
        }

        match op {
            Operator::Contains => actual.contains(value.as_str()),
            Operator::ContainsIgnoreCase => actual
                .to_lowercase()
                .contains(value.to_lowercase().as_str()),
            Operator::Equals => actual == value.as_str(),
        }
    }
}

impl FilterExpression {
    /// True when any OR-group has all of its clauses matching.
    pub fn matches(&self, record: &Record) -> bool {
        self.groups
            .iter()
            .any(|group| group.iter().all(|clause| clause.matches(record)))
    }
}

/// Keeps the records matching `expression`, in their original order.
///
/// An absent or blank expression keeps everything. An expression that cannot
/// be parsed also keeps everything, with an error diagnostic: filter text is
/// user-supplied and must never abort retrieval.
pub fn filter_records(
    mut records: Vec<Record>,
    expression: Option<&str>,
    sink: &dyn DiagnosticSink,
) -> Vec<Record> {
    let Some(text) = expression.filter(|e| !e.trim().is_empty()) else {
        return records;
    };

    let expr = match FilterExpression::parse(text) {
        Ok(expr) => expr,
        Err(e) => {
            sink.error(
                CONTEXT,
                format!(
                    "Filter parsing error: {}. Invalid filter syntax: '{}'. Returning all logs.",
                    e, text
                ),
            );
            return records;
        }
    };

    for clause in expr.unsupported() {
        sink.warning(
            CONTEXT,
            format!("Unsupported filter condition: '{}'", clause),
        );
    }

    records.retain(|record| expr.matches(record));
    records
}

/// Borrowing form of [`filter_records`]; the input slice is left untouched.
pub fn apply(records: &[Record], expression: Option<&str>, sink: &dyn DiagnosticSink) -> Vec<Record> {
    filter_records(records.to_vec(), expression, sink)
}
