//! Generated SQL scripts.
//!
//! A [`Script`] is both the rendered file text and the ordered statement
//! list [`apply_script`](crate::apply::apply_script) runs.

use std::fmt;

/// One generated statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// SQL text, without the trailing semicolon.
    pub sql: String,
    /// Rendered commented out and never executed.
    pub disabled: bool,
}

impl Statement {
    /// An executable statement.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            disabled: false,
        }
    }

    /// A statement that is rendered as a comment only.
    pub fn disabled(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            disabled: true,
        }
    }
}

/// A titled group of statements, usually one migration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Section {
    /// Migration version, when the section is one migration.
    pub version: Option<String>,
    /// Comment rendered above the statements, one `--` line per line.
    pub title: Option<String>,
    pub statements: Vec<Statement>,
}

/// A complete generated script.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Script {
    /// Header comment lines, without the `-- ` prefix.
    pub header: Vec<String>,
    /// Statements that run before every section.
    pub preamble: Vec<Statement>,
    pub sections: Vec<Section>,
}

impl Script {
    /// Executable statements in order, skipping disabled ones.
    pub fn statements(&self) -> Vec<&str> {
        self.preamble
            .iter()
            .chain(self.sections.iter().flat_map(|s| s.statements.iter()))
            .filter(|s| !s.disabled)
            .map(|s| s.sql.as_str())
            .collect()
    }

    /// Find the section for a migration version.
    pub fn section(&self, version: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|s| s.version.as_deref() == Some(version))
    }

    /// Render the script as file text.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

fn write_statement(f: &mut fmt::Formatter<'_>, statement: &Statement) -> fmt::Result {
    if statement.disabled {
        let lines: Vec<&str> = statement.sql.lines().collect();
        for (i, line) in lines.iter().enumerate() {
            let end = if i + 1 == lines.len() { ";" } else { "" };
            writeln!(f, "-- {}{}", line, end)?;
        }
        return Ok(());
    }
    writeln!(f, "{};", statement.sql)
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.header {
            writeln!(f, "-- {}", line)?;
        }
        if !self.header.is_empty() {
            writeln!(f)?;
        }
        for statement in &self.preamble {
            write_statement(f, statement)?;
        }
        for section in &self.sections {
            writeln!(f)?;
            for line in section.title.iter().flat_map(|t| t.lines()) {
                writeln!(f, "-- {}", line)?;
            }
            for statement in &section.statements {
                write_statement(f, statement)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_and_statements() {
        let script = Script {
            header: vec!["Generated".into()],
            preamble: vec![Statement::new("CREATE TABLE a (x INTEGER)")],
            sections: vec![Section {
                version: Some("1".into()),
                title: Some("Migration: 1".into()),
                statements: vec![
                    Statement::disabled("ALTER TABLE a DROP COLUMN x"),
                    Statement::new("DROP TABLE IF EXISTS b"),
                ],
            }],
        };

        assert_eq!(
            script.render(),
            "-- Generated\n\nCREATE TABLE a (x INTEGER);\n\n-- Migration: 1\n-- ALTER TABLE a DROP COLUMN x;\nDROP TABLE IF EXISTS b;\n"
        );
        assert_eq!(
            script.statements(),
            vec!["CREATE TABLE a (x INTEGER)", "DROP TABLE IF EXISTS b"]
        );
        assert!(script.section("1").is_some());
    }
}
