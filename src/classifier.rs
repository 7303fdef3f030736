use compact_str::CompactString;
use smallvec::SmallVec;

use crate::dialect::Dialect;
use crate::error::{IdentifyError, Result};
use crate::parser::ParseOptions;
use crate::statement::{ExecutionType, PendingStatement, Statement, StatementType};
use crate::token::{Pos, Token, TokenType};

/// Statement-initiating verbs, picked from the first token of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Truncate,
    Create,
    Drop,
    Alter,
    Show,
    AnonBlock,
    Unknown,
}

impl StatementKind {
    /// Choose the classifier for a statement's leading token. `None` means no
    /// verb/dialect combination matched.
    pub fn select(token: &Token, next: Option<&Token>, dialect: Dialect) -> Option<Self> {
        if !token.is(TokenType::Keyword) {
            return None;
        }
        let kind = match token.upper().as_str() {
            "SELECT" => Self::Select,
            "INSERT" => Self::Insert,
            "UPDATE" => Self::Update,
            "DELETE" => Self::Delete,
            "TRUNCATE" => Self::Truncate,
            "CREATE" => Self::Create,
            "DROP" => Self::Drop,
            "ALTER" => Self::Alter,
            "SHOW" if matches!(dialect, Dialect::MySql | Dialect::Generic) => Self::Show,
            "BEGIN"
                if matches!(dialect, Dialect::BigQuery | Dialect::Oracle)
                    && next.map(Token::upper).as_deref() != Some("TRANSACTION") =>
            {
                Self::AnonBlock
            }
            "DECLARE" if dialect == Dialect::Oracle => Self::AnonBlock,
            _ => return None,
        };
        Some(kind)
    }

    fn steps(self, dialect: Dialect) -> Vec<Step> {
        match self {
            Self::Select => vec![Step::lead("SELECT", Some(StatementType::Select))],
            Self::Insert => vec![Step::lead("INSERT", Some(StatementType::Insert))],
            Self::Update => vec![Step::lead("UPDATE", Some(StatementType::Update))],
            Self::Delete => vec![Step::lead("DELETE", Some(StatementType::Delete))],
            Self::Truncate => vec![Step::lead("TRUNCATE", Some(StatementType::Truncate))],
            Self::Create => vec![
                Step::lead("CREATE", None),
                Step::object("CREATE", create_drop_objects(dialect)),
            ],
            Self::Drop => vec![
                Step::lead("DROP", None),
                Step::object("DROP", create_drop_objects(dialect)),
            ],
            Self::Alter => vec![
                Step::lead("ALTER", None),
                Step::object("ALTER", alter_objects(dialect)),
            ],
            Self::Show => vec![Step::lead("SHOW", None), Step::object("SHOW", SHOW_OBJECTS)],
            Self::AnonBlock => {
                let mut accept = SmallVec::new();
                if dialect == Dialect::Oracle {
                    accept.push(Accept::keyword("DECLARE"));
                }
                accept.push(Accept::keyword("BEGIN"));
                vec![Step {
                    require_before: None,
                    accept: Some(accept),
                    effect: StepEffect::Start,
                }]
            }
            Self::Unknown => vec![Step {
                require_before: None,
                accept: None,
                effect: StepEffect::StartAs(StatementType::Unknown),
            }],
        }
    }
}

const SHOW_OBJECTS: &[&str] = &[
    "DATABASES", "DATABASE", "KEYS", "INDEX", "COLUMNS", "TABLES", "TABLE", "BINARY", "BINLOG",
    "CHARACTER", "COLLATION", "CREATE", "ENGINE", "ENGINES", "ERRORS", "EVENTS", "FUNCTION",
    "GRANTS", "MASTER", "OPEN", "PLUGINS", "PRIVILEGES", "PROCEDURE", "PROCESSLIST", "PROFILE",
    "PROFILES", "RELAYLOG", "REPLICAS", "REPLICA", "SLAVE", "STATUS", "TRIGGERS", "VARIABLES",
    "WARNINGS",
];

fn create_drop_objects(dialect: Dialect) -> &'static [&'static str] {
    match dialect {
        Dialect::Sqlite => &["TABLE", "VIEW", "TRIGGER", "FUNCTION", "INDEX"],
        _ => &[
            "DATABASE", "SCHEMA", "PROCEDURE", "TABLE", "VIEW", "TRIGGER", "FUNCTION", "INDEX",
        ],
    }
}

fn alter_objects(dialect: Dialect) -> &'static [&'static str] {
    match dialect {
        Dialect::Sqlite => &["TABLE", "VIEW"],
        Dialect::BigQuery => &[
            "DATABASE", "SCHEMA", "TRIGGER", "FUNCTION", "INDEX", "TABLE", "VIEW",
        ],
        _ => &[
            "DATABASE", "SCHEMA", "TRIGGER", "FUNCTION", "INDEX", "PROCEDURE", "TABLE", "VIEW",
        ],
    }
}

/// One accepted `(kind, value)` pair. An empty value accepts any text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Accept {
    token_type: TokenType,
    value: &'static str,
}

impl Accept {
    fn keyword(value: &'static str) -> Self {
        Self {
            token_type: TokenType::Keyword,
            value,
        }
    }

    fn matches(&self, token: &Token, upper: &str) -> bool {
        token.token_type == self.token_type && (self.value.is_empty() || upper == self.value)
    }
}

#[derive(Debug, Clone)]
enum StepEffect {
    /// Record the statement start.
    Start,
    /// Record the start and fix the type.
    StartAs(StatementType),
    /// Name the type `<VERB>_<OBJECT>` after the matched token.
    Object(&'static str),
}

#[derive(Debug, Clone)]
struct Step {
    require_before: Option<TokenType>,
    /// `None` accepts every token.
    accept: Option<SmallVec<[Accept; 8]>>,
    effect: StepEffect,
}

impl Step {
    fn lead(verb: &'static str, statement_type: Option<StatementType>) -> Self {
        let effect = match statement_type {
            Some(t) => StepEffect::StartAs(t),
            None => StepEffect::Start,
        };
        Self {
            require_before: None,
            accept: Some(SmallVec::from_iter([Accept::keyword(verb)])),
            effect,
        }
    }

    fn object(verb: &'static str, objects: &[&'static str]) -> Self {
        Self {
            require_before: Some(TokenType::Whitespace),
            accept: Some(objects.iter().copied().map(Accept::keyword).collect()),
            effect: StepEffect::Object(verb),
        }
    }

    fn accepts(&self, token: &Token, upper: &str) -> bool {
        match &self.accept {
            None => true,
            Some(accept) => accept.iter().any(|a| a.matches(token, upper)),
        }
    }

    fn describe_expected(&self) -> String {
        self.accept
            .iter()
            .flatten()
            .map(|a| format!("(type=\"{}\" value=\"{}\")", a.token_type, a.value))
            .collect::<Vec<_>>()
            .join(" or ")
    }
}

/// `DEFINER = <value>` (MySQL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DefinerClause {
    #[default]
    Idle,
    Keyword,
    Equals,
    Value,
}

/// `ALGORITHM = {UNDEFINED|MERGE|TEMPTABLE}` (MySQL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum AlgorithmClause {
    #[default]
    Idle,
    Keyword,
    Equals,
    Value,
}

/// `SQL SECURITY {DEFINER|INVOKER}` (MySQL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SqlSecurityClause {
    #[default]
    Idle,
    Sql,
    Security,
    Done,
}

const ALGORITHMS: &[&str] = &["UNDEFINED", "MERGE", "TEMPTABLE"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Continue,
    Terminated,
}

/// Per-statement state machine. Consumes tokens until the statement's
/// terminating semicolon, tracking procedural block depth so semicolons
/// nested inside `BEGIN ... END` bodies do not end the statement.
#[derive(Debug)]
pub struct Classifier {
    dialect: Dialect,
    strict: bool,
    identify_tables: bool,
    kind: StatementKind,
    steps: Vec<Step>,
    step_index: usize,
    statement: PendingStatement,
    first_start: Option<Pos>,
    prev: Option<Token>,
    prev_significant: Option<Token>,
    last_block_opener: Option<CompactString>,
    anon_block_started: bool,
    open_blocks: usize,
    definer: DefinerClause,
    algorithm: AlgorithmClause,
    sql_security: SqlSecurityClause,
}

impl Classifier {
    pub fn new(kind: StatementKind, options: &ParseOptions) -> Self {
        let mut statement = PendingStatement::default();
        if kind == StatementKind::AnonBlock {
            statement.set_type(StatementType::AnonBlock);
        }
        Self {
            dialect: options.dialect,
            strict: options.strict,
            identify_tables: options.identify_tables,
            kind,
            steps: kind.steps(options.dialect),
            step_index: 0,
            statement,
            first_start: None,
            prev: None,
            prev_significant: None,
            last_block_opener: None,
            anon_block_started: false,
            open_blocks: 0,
            definer: DefinerClause::Idle,
            algorithm: AlgorithmClause::Idle,
            sql_security: SqlSecurityClause::Idle,
        }
    }

    /// Build the classifier for a statement starting at `token`. Unmatched
    /// leading tokens fail in strict mode and classify as `UNKNOWN` otherwise.
    pub fn for_token(token: &Token, next: Option<&Token>, options: &ParseOptions) -> Result<Self> {
        let kind = match StatementKind::select(token, next, options.dialect) {
            Some(kind) => kind,
            None if options.strict => {
                return Err(IdentifyError::UnrecognizedStatementStart(token.text.to_string()))
            }
            None => StatementKind::Unknown,
        };
        Ok(Self::new(kind, options))
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn open_blocks(&self) -> usize {
        self.open_blocks
    }

    /// Fold a preceding `WITH` header into this statement.
    pub fn attach_cte(&mut self, start: Pos, parameters: Vec<String>) {
        self.statement.start = Some(start);
        self.statement.is_cte = true;
        for parameter in &parameters {
            self.statement.add_parameter(parameter);
        }
    }

    /// Feed the next token. `next` is the following non-whitespace token.
    pub fn feed(&mut self, token: &Token, next: Option<&Token>) -> Result<Progress> {
        if self.statement.end_marker.is_some() {
            return Err(IdentifyError::DoubleTermination);
        }
        self.first_start.get_or_insert(token.start);

        if token.is(TokenType::Semicolon) && self.semicolon_ends() {
            self.statement.end_marker = Some(token.end);
            return Ok(Progress::Terminated);
        }

        let upper = token.upper();

        if self.open_blocks > 0 && upper == "END" {
            self.open_blocks -= 1;
            if self.open_blocks == 0 {
                self.statement.can_end_on_semicolon = true;
            }
            self.remember(token);
            return Ok(Progress::Continue);
        }

        if token.is(TokenType::Whitespace) {
            self.remember(token);
            return Ok(Progress::Continue);
        }

        if token.is(TokenType::Keyword) && self.track_block_open(token, &upper, next) {
            return Ok(Progress::Continue);
        }

        if self.identify_tables && self.captures_tables() && matches!(upper.as_str(), "FROM" | "JOIN" | "INTO") {
            if let Some(next) = next {
                self.statement.add_table(&next.text);
            }
        }

        if token.is(TokenType::Parameter) {
            self.statement.add_parameter(&token.text);
        }

        // once named, the rest of the statement is opaque
        if self.statement.statement_type.is_some() && self.statement.start.is_some() {
            self.remember(token);
            return Ok(Progress::Continue);
        }

        if self.consume_modifier(token, &upper) {
            self.remember(token);
            return Ok(Progress::Continue);
        }

        self.validate_step(token, &upper)?;
        self.remember(token);
        Ok(Progress::Continue)
    }

    /// Finalize. `end` is used when no terminating semicolon was seen.
    pub fn finish(self, end: Pos) -> Statement {
        let end = self.statement.end_marker.unwrap_or(end);
        let fallback_start = self.first_start.unwrap_or(end);
        self.statement.finalize(end, fallback_start)
    }

    fn semicolon_ends(&self) -> bool {
        match &self.statement.statement_type {
            Some(t) if t.requires_block_closure() => {
                self.open_blocks == 0
                    && (*t == StatementType::Unknown || self.statement.can_end_on_semicolon)
            }
            _ => true,
        }
    }

    fn captures_tables(&self) -> bool {
        !self.statement.is_cte
            && (self.statement.is_type(&StatementType::Select)
                || self.statement.is_type(&StatementType::Insert))
    }

    /// Returns true when the token is fully handled as a block opener.
    fn track_block_open(&mut self, token: &Token, upper: &str, next: Option<&Token>) -> bool {
        let after_end = self
            .prev_significant
            .as_ref()
            .is_some_and(|p| p.upper() == "END");
        if !self.dialect.is_block_opener(upper) || after_end || !self.opens_block(upper, next) {
            return false;
        }

        // Oracle `DECLARE ... BEGIN` is a single block
        if self.dialect == Dialect::Oracle
            && upper == "BEGIN"
            && self.last_block_opener.as_deref() == Some("DECLARE")
        {
            self.last_block_opener = Some(upper.into());
            self.remember(token);
            return true;
        }

        self.open_blocks += 1;
        self.last_block_opener = Some(upper.into());
        self.remember(token);

        match self.statement.statement_type {
            Some(StatementType::AnonBlock) if !self.anon_block_started => {
                self.anon_block_started = true;
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    fn opens_block(&self, upper: &str, next: Option<&Token>) -> bool {
        if upper != "BEGIN" {
            return true;
        }
        let next_upper = next.map(Token::upper);
        match next_upper.as_deref() {
            Some("TRANSACTION") => false,
            Some("DEFERRED" | "IMMEDIATE" | "EXCLUSIVE") => self.dialect != Dialect::Sqlite,
            _ => true,
        }
    }

    /// Skip modifier words that sit between the verb and the object keyword.
    /// Checked in a fixed order before step validation.
    fn consume_modifier(&mut self, token: &Token, upper: &str) -> bool {
        let dialect = self.dialect;

        if upper == "UNIQUE"
            || (dialect == Dialect::MySql && matches!(upper, "FULLTEXT" | "SPATIAL"))
            || (dialect == Dialect::MsSql && matches!(upper, "CLUSTERED" | "NONCLUSTERED"))
        {
            return true;
        }

        if matches!(dialect, Dialect::Psql | Dialect::MsSql | Dialect::BigQuery)
            && upper == "MATERIALIZED"
        {
            return true;
        }

        if dialect != Dialect::Sqlite {
            let prev_is_or = self
                .prev_significant
                .as_ref()
                .is_some_and(|p| p.upper() == "OR");
            let replacement = if dialect == Dialect::MsSql { "ALTER" } else { "REPLACE" };
            if upper == "OR" || (prev_is_or && upper == replacement) {
                return true;
            }
        }

        if (dialect == Dialect::Psql && matches!(upper, "TEMP" | "TEMPORARY"))
            || (dialect == Dialect::Sqlite && matches!(upper, "TEMP" | "TEMPORARY" | "VIRTUAL"))
        {
            return true;
        }

        self.definer_clause(token, upper)
            || self.algorithm_clause(token, upper)
            || self.sql_security_clause(upper)
    }

    fn definer_clause(&mut self, token: &Token, upper: &str) -> bool {
        if self.dialect == Dialect::MySql && upper == "DEFINER" {
            self.definer = DefinerClause::Keyword;
            return true;
        }
        match self.definer {
            DefinerClause::Keyword if token.text == "=" => {
                self.definer = DefinerClause::Equals;
                true
            }
            DefinerClause::Equals if self.prev_is_whitespace() => {
                self.definer = DefinerClause::Value;
                true
            }
            // the value runs until the next whitespace: 'admin'@'localhost'
            DefinerClause::Value if self.prev_is_significant() => true,
            DefinerClause::Equals | DefinerClause::Value => {
                self.definer = DefinerClause::Idle;
                false
            }
            _ => false,
        }
    }

    fn algorithm_clause(&mut self, token: &Token, upper: &str) -> bool {
        if self.dialect == Dialect::MySql && upper == "ALGORITHM" {
            self.algorithm = AlgorithmClause::Keyword;
            return true;
        }
        match self.algorithm {
            AlgorithmClause::Keyword if token.text == "=" => {
                self.algorithm = AlgorithmClause::Equals;
                true
            }
            AlgorithmClause::Equals if self.prev_is_whitespace() => {
                self.algorithm = AlgorithmClause::Value;
                true
            }
            AlgorithmClause::Value
                if self
                    .prev
                    .as_ref()
                    .is_some_and(|p| ALGORITHMS.contains(&p.upper().as_str())) =>
            {
                true
            }
            AlgorithmClause::Equals | AlgorithmClause::Value => {
                self.algorithm = AlgorithmClause::Idle;
                false
            }
            _ => false,
        }
    }

    fn sql_security_clause(&mut self, upper: &str) -> bool {
        if self.dialect == Dialect::MySql && upper == "SQL" {
            self.sql_security = SqlSecurityClause::Sql;
            return true;
        }
        match (self.sql_security, upper) {
            (SqlSecurityClause::Sql, "SECURITY") => {
                self.sql_security = SqlSecurityClause::Security;
                true
            }
            (SqlSecurityClause::Security, "DEFINER" | "INVOKER") => {
                self.sql_security = SqlSecurityClause::Done;
                true
            }
            (SqlSecurityClause::Done, _) => {
                self.sql_security = SqlSecurityClause::Idle;
                false
            }
            _ => false,
        }
    }

    fn validate_step(&mut self, token: &Token, upper: &str) -> Result<()> {
        let index = self.step_index;
        let Some(step) = self.steps.get(index) else {
            return Ok(());
        };

        if let (Some(required), Some(prev)) = (step.require_before, self.prev.as_ref()) {
            if prev.token_type != required && self.strict {
                return Err(IdentifyError::MissingPredecessor {
                    required: required.as_str(),
                    value: token.text.to_string(),
                    step: index,
                });
            }
        }

        if self.strict && !step.accepts(token, upper) {
            return Err(IdentifyError::StepValidation {
                expected: step.describe_expected(),
                kind: token.token_type.as_str(),
                value: token.text.to_string(),
                step: index,
            });
        }

        let effect = step.effect.clone();
        match effect {
            StepEffect::Start => {
                self.statement.start.get_or_insert(token.start);
            }
            StepEffect::StartAs(statement_type) => {
                self.statement.set_type(statement_type);
                self.statement.start.get_or_insert(token.start);
            }
            StepEffect::Object(verb) => {
                let name = format!("{}_{}", verb, upper.replace(' ', "_"));
                self.statement.set_type(StatementType::from_name(&name));
            }
        }

        self.statement.execution_type = Some(
            self.statement
                .statement_type
                .as_ref()
                .map_or(ExecutionType::Unknown, ExecutionType::of),
        );
        self.step_index += 1;
        Ok(())
    }

    fn prev_is_whitespace(&self) -> bool {
        self.prev
            .as_ref()
            .is_some_and(|p| p.is(TokenType::Whitespace))
    }

    fn prev_is_significant(&self) -> bool {
        self.prev
            .as_ref()
            .is_some_and(|p| !p.is(TokenType::Whitespace))
    }

    fn remember(&mut self, token: &Token) {
        if !token.is(TokenType::Whitespace) {
            self.prev_significant = Some(token.clone());
        }
        self.prev = Some(token.clone());
    }
}
