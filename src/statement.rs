use std::fmt;

use serde::{Serialize, Serializer};

use crate::token::Pos;

/// Coarse behavioral category of a statement type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionType {
    Listing,
    Modification,
    Information,
    AnonBlock,
    Unknown,
}

impl ExecutionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Listing => "LISTING",
            Self::Modification => "MODIFICATION",
            Self::Information => "INFORMATION",
            Self::AnonBlock => "ANON_BLOCK",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Static `type -> execution type` table. Unmapped types are `UNKNOWN`.
    pub fn of(statement_type: &StatementType) -> Self {
        statement_type.execution_type()
    }
}

impl fmt::Display for ExecutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! statement_types {
    ($($variant:ident => $name:literal, $exec:ident;)+) => {
        /// Statement classification.
        ///
        /// `Other` carries a type name built from an unexpected object
        /// keyword when strict mode is off (`CREATE LOGFILE` ->
        /// `CREATE_LOGFILE`); it always maps to `UNKNOWN` execution.
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum StatementType {
            $($variant,)+
            Other(String),
        }

        impl StatementType {
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $name,)+
                    Self::Other(name) => name,
                }
            }

            /// Resolve a type name, falling back to `Other`.
            pub fn from_name(name: &str) -> Self {
                match name {
                    $($name => Self::$variant,)+
                    other => Self::Other(other.to_string()),
                }
            }

            fn execution_type(&self) -> ExecutionType {
                match self {
                    $(Self::$variant => ExecutionType::$exec,)+
                    Self::Other(_) => ExecutionType::Unknown,
                }
            }
        }
    };
}

statement_types! {
    Insert => "INSERT", Modification;
    Update => "UPDATE", Modification;
    Delete => "DELETE", Modification;
    Select => "SELECT", Listing;
    Truncate => "TRUNCATE", Modification;
    CreateDatabase => "CREATE_DATABASE", Modification;
    CreateSchema => "CREATE_SCHEMA", Modification;
    CreateTable => "CREATE_TABLE", Modification;
    CreateView => "CREATE_VIEW", Modification;
    CreateTrigger => "CREATE_TRIGGER", Modification;
    CreateFunction => "CREATE_FUNCTION", Modification;
    CreateIndex => "CREATE_INDEX", Modification;
    CreateProcedure => "CREATE_PROCEDURE", Modification;
    ShowBinary => "SHOW_BINARY", Listing;
    ShowBinlog => "SHOW_BINLOG", Listing;
    ShowCharacter => "SHOW_CHARACTER", Listing;
    ShowCollation => "SHOW_COLLATION", Listing;
    ShowCreate => "SHOW_CREATE", Listing;
    ShowEngine => "SHOW_ENGINE", Listing;
    ShowEngines => "SHOW_ENGINES", Listing;
    ShowErrors => "SHOW_ERRORS", Listing;
    ShowEvents => "SHOW_EVENTS", Listing;
    ShowFunction => "SHOW_FUNCTION", Listing;
    ShowGrants => "SHOW_GRANTS", Listing;
    ShowMaster => "SHOW_MASTER", Listing;
    ShowOpen => "SHOW_OPEN", Listing;
    ShowPlugins => "SHOW_PLUGINS", Listing;
    ShowPrivileges => "SHOW_PRIVILEGES", Listing;
    ShowProcedure => "SHOW_PROCEDURE", Listing;
    ShowProcesslist => "SHOW_PROCESSLIST", Listing;
    ShowProfile => "SHOW_PROFILE", Listing;
    ShowProfiles => "SHOW_PROFILES", Listing;
    ShowRelaylog => "SHOW_RELAYLOG", Listing;
    ShowReplicas => "SHOW_REPLICAS", Listing;
    ShowSlave => "SHOW_SLAVE", Listing;
    ShowReplica => "SHOW_REPLICA", Listing;
    ShowStatus => "SHOW_STATUS", Listing;
    ShowTriggers => "SHOW_TRIGGERS", Listing;
    ShowVariables => "SHOW_VARIABLES", Listing;
    ShowWarnings => "SHOW_WARNINGS", Listing;
    ShowDatabases => "SHOW_DATABASES", Listing;
    ShowKeys => "SHOW_KEYS", Listing;
    ShowIndex => "SHOW_INDEX", Listing;
    ShowTable => "SHOW_TABLE", Listing;
    ShowTables => "SHOW_TABLES", Listing;
    ShowColumns => "SHOW_COLUMNS", Listing;
    DropDatabase => "DROP_DATABASE", Modification;
    DropSchema => "DROP_SCHEMA", Modification;
    DropTable => "DROP_TABLE", Modification;
    DropView => "DROP_VIEW", Modification;
    DropTrigger => "DROP_TRIGGER", Modification;
    DropFunction => "DROP_FUNCTION", Modification;
    DropIndex => "DROP_INDEX", Modification;
    DropProcedure => "DROP_PROCEDURE", Modification;
    AlterDatabase => "ALTER_DATABASE", Modification;
    AlterSchema => "ALTER_SCHEMA", Modification;
    AlterTable => "ALTER_TABLE", Modification;
    AlterView => "ALTER_VIEW", Modification;
    AlterTrigger => "ALTER_TRIGGER", Modification;
    AlterFunction => "ALTER_FUNCTION", Modification;
    AlterIndex => "ALTER_INDEX", Modification;
    AlterProcedure => "ALTER_PROCEDURE", Modification;
    AnonBlock => "ANON_BLOCK", AnonBlock;
    Unknown => "UNKNOWN", Unknown;
}

impl StatementType {
    /// Types whose terminating semicolon is honored only once every opened
    /// procedural block has closed.
    pub fn requires_block_closure(&self) -> bool {
        matches!(
            self,
            Self::CreateTrigger
                | Self::CreateFunction
                | Self::CreateProcedure
                | Self::AnonBlock
                | Self::Unknown
        )
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StatementType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Mutable accumulator owned by one classifier while a statement is in
/// progress.
#[derive(Debug, Clone, Default)]
pub struct PendingStatement {
    pub start: Option<Pos>,
    pub statement_type: Option<StatementType>,
    pub execution_type: Option<ExecutionType>,
    /// Set once a terminating semicolon is confirmed.
    pub end_marker: Option<Pos>,
    pub can_end_on_semicolon: bool,
    pub parameters: Vec<String>,
    pub tables: Vec<String>,
    /// Folded from a preceding `WITH ...` header.
    pub is_cte: bool,
}

impl PendingStatement {
    /// `?` is appended every time; other parameters only on first sight.
    pub fn add_parameter(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if text == "?" || !self.parameters.iter().any(|p| p == text) {
            self.parameters.push(text.to_string());
        }
    }

    pub fn add_table(&mut self, text: &str) {
        if !self.tables.iter().any(|t| t == text) {
            self.tables.push(text.to_string());
        }
    }

    pub fn set_type(&mut self, statement_type: StatementType) {
        self.statement_type = Some(statement_type);
    }

    pub fn is_type(&self, statement_type: &StatementType) -> bool {
        self.statement_type.as_ref() == Some(statement_type)
    }

    /// Convert into the immutable result. `fallback_start` covers a statement
    /// whose every token so far was swallowed by a modifier clause.
    pub fn finalize(self, end: Pos, fallback_start: Pos) -> Statement {
        let start = self.start.unwrap_or(fallback_start);
        Statement {
            start,
            end: end.max(start),
            statement_type: self.statement_type.unwrap_or(StatementType::Unknown),
            execution_type: self.execution_type.unwrap_or(ExecutionType::Unknown),
            end_marker: self.end_marker.map(|_| ';'),
            parameters: self.parameters,
            tables: self.tables,
            is_cte: self.is_cte,
        }
    }
}

/// A finalized, classified statement span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub start: Pos,
    pub end: Pos,
    pub statement_type: StatementType,
    pub execution_type: ExecutionType,
    pub end_marker: Option<char>,
    pub parameters: Vec<String>,
    pub tables: Vec<String>,
    pub is_cte: bool,
}

impl Statement {
    /// A statement that covers an unfinished `WITH` header cut short by `;`.
    pub fn truncated_cte(start: Pos, end: Pos) -> Self {
        Self {
            start,
            end,
            statement_type: StatementType::Unknown,
            execution_type: ExecutionType::Unknown,
            end_marker: Some(';'),
            parameters: Vec::new(),
            tables: Vec::new(),
            is_cte: true,
        }
    }
}
