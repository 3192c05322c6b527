use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Identifier,
    Number,
    String,
    Operator,
    Delimiter,

    // Structural
    Newline,
    Indent,
    Dedent,

    /// A character no other class accepts. Kept in the stream so callers can
    /// report every offending character in one pass.
    Error,
    EOF,
}

impl TokenKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Keyword => "KEYWORD",
            Self::Identifier => "IDENTIFIER",
            Self::Number => "NUMBER",
            Self::String => "STRING",
            Self::Operator => "OPERATOR",
            Self::Delimiter => "DELIMITER",
            Self::Newline => "NEWLINE",
            Self::Indent => "INDENT",
            Self::Dedent => "DEDENT",
            Self::Error => "ERROR",
            Self::EOF => "EOF",
        }
    }
}

pub const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Span,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, text: &'a str, span: Span) -> Self {
        Self { kind, text, span }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn record(&self) -> TokenRecord {
        TokenRecord {
            kind: self.kind.label(),
            value: self.text.to_string(),
            line: self.span.line,
            position: self.span.column,
        }
    }
}

/// Wire shape of a token for the `tokens` command and the `/tokenize` route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenRecord {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: String,
    pub line: usize,
    pub position: usize,
}
