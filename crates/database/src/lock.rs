use crate::statement::Statement;
use std::fmt;

/// PostgreSQL table lock modes, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    /// Conflicts with `AccessExclusive` only.
    AccessShare,
    /// Conflicts with `Exclusive` and `AccessExclusive`.
    RowShare,
    /// Conflicts with `Share` and every stronger mode.
    RowExclusive,
    /// Conflicts with `ShareUpdateExclusive` and every stronger mode.
    ShareUpdateExclusive,
    /// Conflicts with `RowExclusive`, `ShareUpdateExclusive` and every mode
    /// stronger than itself.
    Share,
    /// Conflicts with `RowExclusive` and every stronger mode.
    ShareRowExclusive,
    /// Only concurrent `AccessShare` locks are allowed, so only reads proceed
    /// in parallel.
    Exclusive,
    /// Conflicts with every mode.
    AccessExclusive,
}

impl LockMode {
    pub fn as_sql(self) -> &'static str {
        match self {
            LockMode::AccessShare => "ACCESS SHARE",
            LockMode::RowShare => "ROW SHARE",
            LockMode::RowExclusive => "ROW EXCLUSIVE",
            LockMode::ShareUpdateExclusive => "SHARE UPDATE EXCLUSIVE",
            LockMode::Share => "SHARE",
            LockMode::ShareRowExclusive => "SHARE ROW EXCLUSIVE",
            LockMode::Exclusive => "EXCLUSIVE",
            LockMode::AccessExclusive => "ACCESS EXCLUSIVE",
        }
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// `LOCK TABLE <table> IN <mode> MODE;`
pub fn lock_table_statement(table: &str, mode: LockMode) -> Statement {
    Statement::new(format!("LOCK TABLE {table} IN {mode} MODE;"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_statements_name_the_mode() {
        assert_eq!(
            lock_table_statement("Pizza", LockMode::ShareRowExclusive).sql,
            "LOCK TABLE Pizza IN SHARE ROW EXCLUSIVE MODE;"
        );
        assert_eq!(
            lock_table_statement("Pizza", LockMode::AccessShare).sql,
            "LOCK TABLE Pizza IN ACCESS SHARE MODE;"
        );
    }
}
