use std::fmt;
use std::str::FromStr;

use phf::phf_set;

use crate::error::IdentifyError;
use crate::params::ParamTypes;

/// A SQL dialect selects keyword, quoting and parameter rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    Generic,
    MySql,
    Psql,
    MsSql,
    Sqlite,
    Oracle,
    BigQuery,
}

/// Reserved keywords shared by every dialect. Words outside this set lex as
/// `unknown` tokens and never drive statement classification.
static KEYWORDS: phf::Set<&'static str> = phf_set! {
    "SELECT", "INSERT", "DELETE", "UPDATE", "CREATE", "DROP", "DATABASE",
    "SCHEMA", "TABLE", "VIEW", "TRIGGER", "FUNCTION", "INDEX", "ALTER",
    "TRUNCATE", "WITH", "AS", "MATERIALIZED", "BEGIN", "DECLARE", "CASE",
    "LOOP", "IF", "REPEAT", "WHILE", "FOR", "PROCEDURE", "SHOW", "DATABASES",
    "KEYS", "TABLES", "COLUMNS", "STATUS", "BINARY", "BINLOG", "CHARACTER",
    "COLLATION", "ENGINE", "ENGINES", "ERRORS", "EVENTS", "GRANTS", "MASTER",
    "OPEN", "PLUGINS", "PRIVILEGES", "PROCESSLIST", "PROFILE", "PROFILES",
    "RELAYLOG", "REPLICAS", "SLAVE", "REPLICA", "TRIGGERS", "VARIABLES", "WARNINGS",
};

const GENERIC_BLOCK_OPENERS: &[&str] = &["BEGIN", "CASE"];
const PROCEDURAL_BLOCK_OPENERS: &[&str] = &["BEGIN", "CASE", "LOOP", "IF"];
const ORACLE_BLOCK_OPENERS: &[&str] = &["DECLARE", "BEGIN", "CASE"];
const BIGQUERY_BLOCK_OPENERS: &[&str] =
    &["BEGIN", "CASE", "IF", "LOOP", "REPEAT", "WHILE", "FOR"];

impl Dialect {
    pub const ALL: [Dialect; 7] = [
        Dialect::MsSql,
        Dialect::Sqlite,
        Dialect::MySql,
        Dialect::Oracle,
        Dialect::Psql,
        Dialect::BigQuery,
        Dialect::Generic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::MySql => "mysql",
            Self::Psql => "psql",
            Self::MsSql => "mssql",
            Self::Sqlite => "sqlite",
            Self::Oracle => "oracle",
            Self::BigQuery => "bigquery",
        }
    }

    /// Whether the (already uppercased) word is a reserved keyword.
    pub fn is_keyword(self, upper: &str) -> bool {
        KEYWORDS.contains(upper)
    }

    /// Keywords that open a procedural block closed by `END`.
    pub fn block_openers(self) -> &'static [&'static str] {
        match self {
            Self::Generic | Self::MsSql | Self::Sqlite => GENERIC_BLOCK_OPENERS,
            Self::Psql | Self::MySql => PROCEDURAL_BLOCK_OPENERS,
            Self::Oracle => ORACLE_BLOCK_OPENERS,
            Self::BigQuery => BIGQUERY_BLOCK_OPENERS,
        }
    }

    pub fn is_block_opener(self, upper: &str) -> bool {
        self.block_openers().contains(&upper)
    }

    /// Characters that open a string literal.
    pub fn is_string_opener(self, c: u8) -> bool {
        c == b'\'' || (self == Self::MySql && c == b'"')
    }

    /// Characters that open a quoted identifier.
    pub fn is_quote_opener(self, c: u8) -> bool {
        c == b'"' || c == b'`' || (self == Self::MsSql && c == b'[')
    }

    pub fn default_param_types(self) -> ParamTypes {
        match self {
            Self::Psql => ParamTypes {
                numbered: vec!['$'],
                ..ParamTypes::default()
            },
            Self::MsSql => ParamTypes {
                named: vec![':'],
                ..ParamTypes::default()
            },
            Self::BigQuery => ParamTypes {
                positional: true,
                named: vec!['@'],
                quoted: vec!['@'],
                ..ParamTypes::default()
            },
            Self::Sqlite => ParamTypes {
                positional: true,
                numbered: vec!['?'],
                named: vec![':', '@'],
                ..ParamTypes::default()
            },
            Self::Generic | Self::MySql | Self::Oracle => ParamTypes {
                positional: true,
                ..ParamTypes::default()
            },
        }
    }

    fn allowed_names() -> String {
        let names: Vec<&str> = Self::ALL.iter().map(|d| d.name()).collect();
        format!("[{}]", names.join(" "))
    }
}

/// Closing delimiter for a string or quoted-identifier opener.
pub fn closing_quote(opener: u8) -> u8 {
    match opener {
        b'[' => b']',
        other => other,
    }
}

impl FromStr for Dialect {
    type Err = IdentifyError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| IdentifyError::InvalidDialect {
                name: name.to_string(),
                allowed: Self::allowed_names(),
            })
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
