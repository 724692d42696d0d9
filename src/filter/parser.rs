use super::error::FilterParseError;
use std::fmt;
use std::str::FromStr;

pub const OR_SEPARATOR: &str = " or ";
pub const AND_SEPARATOR: &str = " and ";

/// Record fields the filter language understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Topics,
    Message,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::Topics => "topics",
            Field::Message => "message",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "topics" => Some(Field::Topics),
            "message" => Some(Field::Message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `~`
    Contains,
    /// `~i`
    ContainsIgnoreCase,
    /// `=`
    Equals,
}

impl Operator {
    pub fn token(&self) -> &'static str {
        match self {
            Operator::Contains => "~",
            Operator::ContainsIgnoreCase => "~i",
            Operator::Equals => "=",
        }
    }
}

/// A single `field<op>"value"` condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    Predicate {
        field: Field,
        op: Operator,
        value: String,
    },
    /// Anything the language does not understand: unknown field, unknown
    /// operator or broken quoting. Kept verbatim and evaluated as a match.
    Unsupported(String),
}

impl Clause {
    pub fn parse(s: &str) -> Self {
        let text = s.trim();
        parse_predicate(text).unwrap_or_else(|| Clause::Unsupported(text.to_string()))
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, Clause::Predicate { .. })
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Predicate { field, op, value } => {
                write!(f, "{}{}\"{}\"", field.name(), op.token(), value)
            }
            Clause::Unsupported(raw) => write!(f, "{}", raw),
        }
    }
}

fn parse_predicate(text: &str) -> Option<Clause> {
    let field_end = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.'))
        .unwrap_or(text.len());
    let field = Field::from_name(&text[..field_end])?;
    let rest = &text[field_end..];

    // `~i` first: a plain `~` prefix would swallow it.
    let (op, rest) = if let Some(rest) = rest.strip_prefix("~i") {
        (Operator::ContainsIgnoreCase, rest)
    } else if let Some(rest) = rest.strip_prefix('~') {
        (Operator::Contains, rest)
    } else if let Some(rest) = rest.strip_prefix('=') {
        (Operator::Equals, rest)
    } else {
        return None;
    };

    // Only the first quoted literal counts; anything after it is ignored.
    let literal = rest.strip_prefix('"')?;
    let close = literal.find('"')?;
    let value = &literal[..close];
    if value.is_empty() {
        return None;
    }

    Some(Clause::Predicate {
        field,
        op,
        value: value.to_string(),
    })
}

/// A parsed filter: OR of AND-groups.
///
/// `A and B or C and D` always reads as `(A and B) or (C and D)`; there is
/// no grouping syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterExpression {
    pub groups: Vec<Vec<Clause>>,
}

impl FilterExpression {
    pub fn parse(s: &str) -> Result<Self, FilterParseError> {
        if s.trim().is_empty() {
            return Err(FilterParseError::Empty);
        }
        if s.matches('"').count() % 2 == 1 {
            let position = s.rfind('"').unwrap_or(0);
            return Err(FilterParseError::UnbalancedQuote { position });
        }

        // An empty part (`a and `, ` or b`) becomes an unsupported clause.
        let groups: Vec<Vec<Clause>> = split_outside_quotes(s, OR_SEPARATOR)
            .into_iter()
            .map(|group| {
                split_outside_quotes(group, AND_SEPARATOR)
                    .into_iter()
                    .map(Clause::parse)
                    .collect()
            })
            .collect();

        Ok(FilterExpression { groups })
    }

    pub fn clauses(&self) -> impl Iterator<Item = &Clause> {
        self.groups.iter().flatten()
    }

    pub fn unsupported(&self) -> impl Iterator<Item = &Clause> {
        self.clauses().filter(|c| !c.is_supported())
    }
}

impl FromStr for FilterExpression {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterExpression::parse(s)
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (g, group) in self.groups.iter().enumerate() {
            if g > 0 {
                f.write_str(OR_SEPARATOR)?;
            }
            for (c, clause) in group.iter().enumerate() {
                if c > 0 {
                    f.write_str(AND_SEPARATOR)?;
                }
                write!(f, "{}", clause)?;
            }
        }
        Ok(())
    }
}

/// Splits on `sep` wherever it does not fall inside a double-quoted literal.
pub fn split_outside_quotes<'a>(s: &'a str, sep: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    let mut i = 0;

    while i < s.len() {
        if !in_quotes && s[i..].starts_with(sep) {
            parts.push(&s[start..i]);
            i += sep.len();
            start = i;
            continue;
        }
        let c = s[i..].chars().next().unwrap_or('\0');
        if c == '"' {
            in_quotes = !in_quotes;
        }
        i += c.len_utf8().max(1);
    }
    parts.push(&s[start..]);

    parts
}

/// ANDs `right` into every OR-group of `left`, keeping OR-of-AND form.
///
/// `A or B` conjoined with `W` gives `A and W or B and W`.
pub fn conjoin(left: &str, right: &str) -> String {
    let left = left.trim();
    let right = right.trim();
    if left.is_empty() {
        return right.to_string();
    }
    if right.is_empty() {
        return left.to_string();
    }

    let right_groups = split_outside_quotes(right, OR_SEPARATOR);
    let mut merged = Vec::new();
    for l in split_outside_quotes(left, OR_SEPARATOR) {
        for r in &right_groups {
            merged.push(format!("{}{}{}", l.trim(), AND_SEPARATOR, r.trim()));
        }
    }
    merged.join(OR_SEPARATOR)
}
