use std::mem;

use tracing::{debug, trace};

use crate::classifier::{Classifier, Progress};
use crate::dialect::Dialect;
use crate::error::Result;
use crate::lexer::Lexer;
use crate::params::{ParamMatcher, ParamTypes};
use crate::statement::Statement;
use crate::token::{Pos, Token, TokenType};

/// Resolved settings for one parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub dialect: Dialect,
    pub strict: bool,
    pub identify_tables: bool,
    pub param_types: ParamTypes,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::Generic,
            strict: true,
            identify_tables: false,
            param_types: Dialect::Generic.default_param_types(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    pub statements: Vec<Statement>,
    /// Every token of the input, in order.
    pub tokens: Vec<Token>,
    /// Input length in characters.
    pub len: usize,
}

/// Tracks a `WITH name AS (...) [, name AS (...)]*` header that has not yet
/// reached its main statement.
#[derive(Debug, Default)]
struct CteHeader {
    active: bool,
    start: Pos,
    as_seen: bool,
    /// Set when the current definition's parentheses balance.
    definition_closed: bool,
    depth: isize,
    parameters: Vec<String>,
}

impl CteHeader {
    fn open(&mut self, start: Pos) {
        *self = Self {
            active: true,
            start,
            ..Self::default()
        };
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    /// Follow the body of the current definition until its parentheses close.
    fn track(&mut self, token: &Token) {
        if self.as_seen {
            match token.text.as_str() {
                "(" => self.depth += 1,
                ")" => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        self.definition_closed = true;
                    }
                }
                _ => {}
            }
        } else if token.upper() == "AS" {
            self.as_seen = true;
        }
    }
}

/// Split `source` into classified statements.
///
/// Trivia between statements is skipped. A `WITH` header is folded into the
/// statement that follows it; a semicolon inside an unfinished header yields
/// an `UNKNOWN` statement covering the header.
pub fn parse(source: &str, options: &ParseOptions) -> Result<ParseResult> {
    debug!(
        dialect = %options.dialect,
        strict = options.strict,
        identify_tables = options.identify_tables,
        "parsing {} bytes",
        source.len()
    );

    let matcher = ParamMatcher::new(&options.param_types)?;
    let mut lexer = Lexer::new(source, options.dialect, &matcher);
    let mut tokens = Vec::new();
    let mut statements = Vec::new();
    let mut active: Option<Classifier> = None;
    let mut cte = CteHeader::default();

    while let Some(token) = lexer.next_token() {
        let next = lexer.peek_significant();

        if let Some(classifier) = active.as_mut() {
            if classifier.feed(&token, next.as_ref())? == Progress::Terminated {
                if let Some(classifier) = active.take() {
                    statements.push(emit(classifier, token.end));
                }
            }
            tokens.push(token);
            continue;
        }

        if !cte.active {
            if token.token_type.is_trivial() {
                tokens.push(token);
                continue;
            }
            if token.is(TokenType::Keyword) && token.upper() == "WITH" {
                trace!(start = token.start, "entering WITH header");
                cte.open(token.start);
                tokens.push(token);
                continue;
            }
        } else {
            if token.is(TokenType::Semicolon) {
                debug!(start = cte.start, end = token.end, "WITH header ended early");
                statements.push(Statement::truncated_cte(cte.start, token.end));
                cte.reset();
                tokens.push(token);
                continue;
            }
            if !cte.definition_closed {
                cte.track(&token);
                if token.is(TokenType::Parameter) {
                    cte.parameters.push(token.text.to_string());
                }
                tokens.push(token);
                continue;
            }
            if token.text == "," {
                cte.as_seen = false;
                cte.definition_closed = false;
                tokens.push(token);
                continue;
            }
            if token.token_type.is_trivial() {
                tokens.push(token);
                continue;
            }
        }

        let mut classifier = Classifier::for_token(&token, next.as_ref(), options)?;
        trace!(kind = ?classifier.kind(), start = token.start, "statement started");
        if cte.active {
            classifier.attach_cte(cte.start, mem::take(&mut cte.parameters));
            cte.reset();
        }
        if classifier.feed(&token, next.as_ref())? == Progress::Terminated {
            statements.push(emit(classifier, token.end));
        } else {
            active = Some(classifier);
        }
        tokens.push(token);
    }

    let len = lexer.cursor().pos;
    if let Some(classifier) = active {
        statements.push(emit(classifier, len.saturating_sub(1)));
    }

    debug!(statements = statements.len(), tokens = tokens.len(), "parse finished");
    Ok(ParseResult {
        statements,
        tokens,
        len,
    })
}

fn emit(classifier: Classifier, end: Pos) -> Statement {
    let statement = classifier.finish(end);
    trace!(
        start = statement.start,
        end = statement.end,
        statement_type = %statement.statement_type,
        "statement identified"
    );
    statement
}
