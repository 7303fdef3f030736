use compact_str::CompactString;

/// Position in source string (character offset, inclusive on both ends).
pub type Pos = usize;

/// All token types recognized by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Whitespace,
    CommentInline,
    CommentBlock,
    String,
    /// Reserved keyword or quoted identifier.
    Keyword,
    Parameter,
    Semicolon,
    Unknown,
}

impl TokenType {
    /// Name used in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Whitespace => "whitespace",
            Self::CommentInline => "comment-inline",
            Self::CommentBlock => "comment-block",
            Self::String => "string",
            Self::Keyword => "keyword",
            Self::Parameter => "parameter",
            Self::Semicolon => "semicolon",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_comment(self) -> bool {
        matches!(self, Self::CommentInline | Self::CommentBlock)
    }

    /// Tokens ignored while no statement is in progress.
    pub fn is_trivial(self) -> bool {
        self.is_comment() || matches!(self, Self::Whitespace | Self::Semicolon)
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub token_type: TokenType,
    pub text: CompactString,
    pub start: Pos,
    pub end: Pos,
}

impl Token {
    pub fn new(token_type: TokenType, text: &str, start: Pos, end: Pos) -> Self {
        Self {
            token_type,
            text: CompactString::new(text),
            start,
            end,
        }
    }

    /// ASCII-uppercased token text, used for all keyword comparisons.
    pub fn upper(&self) -> CompactString {
        self.text.to_ascii_uppercase().into()
    }

    pub fn is(&self, token_type: TokenType) -> bool {
        self.token_type == token_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivial_classification() {
        assert!(TokenType::Whitespace.is_trivial());
        assert!(TokenType::CommentInline.is_trivial());
        assert!(TokenType::CommentBlock.is_trivial());
        assert!(TokenType::Semicolon.is_trivial());
        assert!(!TokenType::Keyword.is_trivial());
        assert!(!TokenType::Parameter.is_trivial());
    }

    #[test]
    fn test_comment_classification() {
        assert!(TokenType::CommentInline.is_comment());
        assert!(TokenType::CommentBlock.is_comment());
        assert!(!TokenType::String.is_comment());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(TokenType::CommentInline.as_str(), "comment-inline");
        assert_eq!(TokenType::Keyword.to_string(), "keyword");
    }

    #[test]
    fn test_token_creation() {
        let tok = Token::new(TokenType::Keyword, "select", 5, 10);
        assert_eq!(tok.token_type, TokenType::Keyword);
        assert_eq!(tok.text, "select");
        assert_eq!(tok.upper(), "SELECT");
        assert_eq!(tok.start, 5);
        assert_eq!(tok.end, 10);
    }
}
