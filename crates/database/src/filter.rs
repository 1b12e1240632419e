//! WHERE-clause predicates that always compile to bound `$n` placeholders.
//!
//! Two spellings are supported:
//!
//! - structured predicates: `Filter::le("id", 2).and(Filter::eq("name", name))`
//! - printf-style fragments: `Fragment::new("id = %d").arg(3)`, or a plain
//!   `&str` when the fragment takes no arguments.
//!
//! Fragment verbs (`%d`, `%s`, `%v`, ...) never substitute text into the
//! statement. Each one becomes the next `$n` placeholder and its argument is
//! bound by the driver. Flags, width and precision (`%5d`, `%.2f`) are
//! accepted and ignored. A verb wrapped in single quotes (`'%s'`) loses the
//! quotes. A verb elsewhere inside a quoted literal splits it, so
//! `'%s%%'` becomes `$1 || '%'`. `%%` is a literal `%`.

use crate::error::DbError;
use core_types::{SqlField, Value};
use std::iter::Peekable;
use std::ops::Not;
use std::str::Chars;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

impl Comparison {
    fn as_sql(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "<>",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
            Comparison::Like => "LIKE",
        }
    }
}

/// A caller-written predicate with printf-style argument slots.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    text: String,
    args: Vec<Value>,
}

impl Fragment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            args: Vec::new(),
        }
    }

    /// Supplies the value for the next `%` verb.
    pub fn arg<T: SqlField>(mut self, value: T) -> Self {
        self.args.push(value.to_value());
        self
    }

    fn compile(&self, values: &mut Vec<Value>) -> Result<String, DbError> {
        let base = values.len();
        let mut sql = String::with_capacity(self.text.len());
        let mut placeholders = 0;
        // Byte offset of the opening quote of the literal being scanned.
        let mut literal: Option<usize> = None;
        let mut chars = self.text.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '\'' {
                sql.push(c);
                match literal {
                    None => literal = Some(sql.len() - 1),
                    Some(_) if chars.peek() == Some(&'\'') => {
                        chars.next();
                        sql.push('\'');
                    }
                    Some(_) => literal = None,
                }
                continue;
            }
            if c != '%' {
                sql.push(c);
                continue;
            }

            let mut modifiers = String::new();
            while let Some(&m) = chars.peek() {
                if !VERB_MODIFIERS.contains(m) {
                    break;
                }
                modifiers.push(m);
                chars.next();
            }

            match chars.peek().copied() {
                Some('%') if modifiers.is_empty() => {
                    chars.next();
                    sql.push('%');
                }
                Some(verb) if verb.is_ascii_alphabetic() => {
                    chars.next();
                    placeholders += 1;
                    let placeholder = format!("${}", base + placeholders);

                    let Some(start) = literal else {
                        sql.push_str(&placeholder);
                        continue;
                    };

                    // Inside a literal the placeholder is concatenated with
                    // whatever text surrounds it.
                    if sql.len() == start + 1 {
                        sql.pop();
                    } else {
                        sql.push_str("' || ");
                    }
                    sql.push_str(&placeholder);
                    if closes_literal(&chars) {
                        chars.next();
                        literal = None;
                    } else {
                        sql.push_str(" || '");
                        literal = Some(sql.len() - 1);
                    }
                }
                _ => {
                    sql.push('%');
                    sql.push_str(&modifiers);
                }
            }
        }

        if placeholders != self.args.len() {
            return Err(DbError::FilterArity {
                filter: self.text.clone(),
                placeholders,
                arguments: self.args.len(),
            });
        }

        values.extend(self.args.iter().cloned());
        Ok(sql)
    }
}

/// Flag, width and precision characters that may sit between `%` and the verb.
const VERB_MODIFIERS: &str = "+-#0123456789.";

/// Whether the next character ends the current literal, as opposed to an
/// escaped `''` quote.
fn closes_literal(chars: &Peekable<Chars<'_>>) -> bool {
    let mut ahead = chars.clone();
    ahead.next() == Some('\'') && ahead.next() != Some('\'')
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Fragment(Fragment),
    Compare {
        column: String,
        op: Comparison,
        value: Value,
    },
    Null {
        column: String,
        negated: bool,
    },
    All(Vec<Filter>),
    Any(Vec<Filter>),
    Not(Box<Filter>),
}

/// The body of a WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter(Predicate);

impl Filter {
    pub fn compare<T: SqlField>(column: impl Into<String>, op: Comparison, value: T) -> Self {
        Filter(Predicate::Compare {
            column: column.into(),
            op,
            value: value.to_value(),
        })
    }

    pub fn eq<T: SqlField>(column: impl Into<String>, value: T) -> Self {
        Self::compare(column, Comparison::Eq, value)
    }

    pub fn ne<T: SqlField>(column: impl Into<String>, value: T) -> Self {
        Self::compare(column, Comparison::Ne, value)
    }

    pub fn lt<T: SqlField>(column: impl Into<String>, value: T) -> Self {
        Self::compare(column, Comparison::Lt, value)
    }

    pub fn le<T: SqlField>(column: impl Into<String>, value: T) -> Self {
        Self::compare(column, Comparison::Le, value)
    }

    pub fn gt<T: SqlField>(column: impl Into<String>, value: T) -> Self {
        Self::compare(column, Comparison::Gt, value)
    }

    pub fn ge<T: SqlField>(column: impl Into<String>, value: T) -> Self {
        Self::compare(column, Comparison::Ge, value)
    }

    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::compare(column, Comparison::Like, pattern.into())
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Filter(Predicate::Null {
            column: column.into(),
            negated: false,
        })
    }

    pub fn is_not_null(column: impl Into<String>) -> Self {
        Filter(Predicate::Null {
            column: column.into(),
            negated: true,
        })
    }

    /// Matches when every filter matches. An empty set matches every row.
    pub fn all(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter(Predicate::All(filters.into_iter().collect()))
    }

    /// Matches when any filter matches. An empty set matches no row.
    pub fn any(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter(Predicate::Any(filters.into_iter().collect()))
    }

    pub fn and(self, other: impl Into<Filter>) -> Self {
        match self.0 {
            Predicate::All(mut filters) => {
                filters.push(other.into());
                Filter(Predicate::All(filters))
            }
            predicate => Filter::all([Filter(predicate), other.into()]),
        }
    }

    pub fn or(self, other: impl Into<Filter>) -> Self {
        match self.0 {
            Predicate::Any(mut filters) => {
                filters.push(other.into());
                Filter(Predicate::Any(filters))
            }
            predicate => Filter::any([Filter(predicate), other.into()]),
        }
    }

    /// Appends the predicate's SQL, pushing bound values onto `values`.
    /// Placeholders continue from the values already present.
    pub(crate) fn compile(&self, values: &mut Vec<Value>) -> Result<String, DbError> {
        match &self.0 {
            Predicate::Fragment(fragment) => fragment.compile(values),
            Predicate::Compare { column, op, value } => {
                values.push(value.clone());
                Ok(format!("{column} {} ${}", op.as_sql(), values.len()))
            }
            Predicate::Null { column, negated } => Ok(if *negated {
                format!("{column} IS NOT NULL")
            } else {
                format!("{column} IS NULL")
            }),
            Predicate::All(filters) => compile_joined(filters, " AND ", "TRUE", values),
            Predicate::Any(filters) => compile_joined(filters, " OR ", "FALSE", values),
            Predicate::Not(inner) => Ok(format!("NOT ({})", inner.compile(values)?)),
        }
    }
}

fn compile_joined(
    filters: &[Filter],
    separator: &str,
    empty: &str,
    values: &mut Vec<Value>,
) -> Result<String, DbError> {
    match filters {
        [] => Ok(empty.to_string()),
        [only] => only.compile(values),
        many => {
            let parts = many
                .iter()
                .map(|filter| filter.compile(values).map(|sql| format!("({sql})")))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(parts.join(separator))
        }
    }
}

impl Not for Filter {
    type Output = Filter;

    fn not(self) -> Filter {
        Filter(Predicate::Not(Box::new(self)))
    }
}

impl From<Fragment> for Filter {
    fn from(fragment: Fragment) -> Self {
        Filter(Predicate::Fragment(fragment))
    }
}

impl From<&str> for Filter {
    fn from(text: &str) -> Self {
        Fragment::new(text).into()
    }
}

impl From<String> for Filter {
    fn from(text: String) -> Self {
        Fragment::new(text).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(filter: impl Into<Filter>) -> (String, Vec<Value>) {
        let mut values = Vec::new();
        let sql = filter.into().compile(&mut values).unwrap();
        (sql, values)
    }

    #[test]
    fn plain_fragments_pass_through() {
        assert_eq!(compile("name = 'C'"), ("name = 'C'".to_string(), vec![]));
        assert_eq!(compile("id <= 2 AND name = 'A'").0, "id <= 2 AND name = 'A'");
    }

    #[test]
    fn fragment_verbs_become_bound_placeholders() {
        let (sql, values) = compile(Fragment::new("id = %d").arg(3_i32));
        assert_eq!(sql, "id = $1");
        assert_eq!(values, vec![Value::Int32(3)]);

        let (sql, values) = compile(Fragment::new("name = '%s' AND age > %d").arg("O'Brien".to_string()).arg(40_i64));
        assert_eq!(sql, "name = $1 AND age > $2");
        assert_eq!(values, vec![Value::Text("O'Brien".into()), Value::Int64(40)]);
    }

    #[test]
    fn percent_escapes_and_bare_percent_signs_stay_literal() {
        assert_eq!(compile("name LIKE 'A%'").0, "name LIKE 'A%'");
        assert_eq!(compile("name LIKE '%%bc'").0, "name LIKE '%bc'");
        assert_eq!(compile("ratio > 50 %").0, "ratio > 50 %");
    }

    #[test]
    fn verbs_inside_literals_are_concatenated() {
        let (sql, values) = compile(Fragment::new("name LIKE '%s%%'").arg("A".to_string()));
        assert_eq!(sql, "name LIKE $1 || '%'");
        assert_eq!(values, vec![Value::Text("A".into())]);

        let (sql, _) = compile(Fragment::new("name LIKE '%%%s%%'").arg("B".to_string()));
        assert_eq!(sql, "name LIKE '%' || $1 || '%'");

        let (sql, _) = compile(Fragment::new("note = 'it''s %s'").arg("late".to_string()));
        assert_eq!(sql, "note = 'it''s ' || $1");
    }

    #[test]
    fn width_and_precision_are_ignored() {
        let (sql, values) = compile(
            Fragment::new("price > %.2f AND id = %5d")
                .arg(9.5_f64)
                .arg(7_i32),
        );
        assert_eq!(sql, "price > $1 AND id = $2");
        assert_eq!(values, vec![Value::Float64(9.5), Value::Int32(7)]);
        assert_eq!(compile("name LIKE '%5%'").0, "name LIKE '%5%'");
    }

    #[test]
    fn failed_arity_checks_bind_nothing() {
        let mut values = vec![Value::Bool(true)];
        let result = Filter::from(Fragment::new("id = %d")).compile(&mut values);

        assert!(matches!(result, Err(DbError::FilterArity { placeholders: 1, arguments: 0, .. })));
        assert_eq!(values, vec![Value::Bool(true)]);
    }

    #[test]
    fn fragment_arity_is_checked() {
        let mut values = Vec::new();
        let err = Filter::from(Fragment::new("id = %d AND age = %d").arg(1_i32))
            .compile(&mut values)
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::FilterArity {
                placeholders: 2,
                arguments: 1,
                ..
            }
        ));

        let err = Filter::from(Fragment::new("id = 1").arg(1_i32))
            .compile(&mut values)
            .unwrap_err();
        assert!(matches!(err, DbError::FilterArity { placeholders: 0, .. }));
    }

    #[test]
    fn structured_predicates_number_placeholders_in_order() {
        let filter = Filter::le("id", 2_i32)
            .and(Filter::eq("name", "A".to_string()))
            .and(Filter::is_not_null("age"));
        let (sql, values) = compile(filter);

        assert_eq!(sql, "(id <= $1) AND (name = $2) AND (age IS NOT NULL)");
        assert_eq!(values, vec![Value::Int32(2), Value::Text("A".into())]);
    }

    #[test]
    fn placeholders_continue_after_existing_values() {
        let mut values = vec![Value::Bool(true)];
        let sql = Filter::gt("age", 18_i16)
            .or(Fragment::new("name = %s").arg("Kim".to_string()))
            .compile(&mut values)
            .unwrap();

        assert_eq!(sql, "(age > $2) OR (name = $3)");
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn negation_and_empty_groups() {
        assert_eq!(compile(!Filter::like("name", "A%")).0, "NOT (name LIKE $1)");
        assert_eq!(compile(Filter::all(Vec::new())).0, "TRUE");
        assert_eq!(compile(Filter::any(Vec::new())).0, "FALSE");
        assert_eq!(compile(Filter::any([Filter::is_null("age")])).0, "age IS NULL");
    }
}
