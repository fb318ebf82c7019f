use logos::Logos;
use thiserror::Error;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token {
    // Keywords
    #[token("print")]
    Print,
    #[token("if")]
    If,
    #[token("then")]
    Then,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // Identifiers and literals
    #[regex(r"[a-zA-Z][a-zA-Z0-9]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    IConst(i64),

    #[regex(r#""[^"\n]*""#, |lex| {
        let s = lex.slice();
        s[1..s.len()-1].to_string()
    })]
    SConst(String),

    // Operators
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("=")]
    Assign,

    // Comparison
    #[token("==")]
    Eq,
    #[token("!=")]
    NEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GEq,

    // Logical
    #[token("&&")]
    And,
    #[token("||")]
    Or,

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(";")]
    Semicolon,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Print => write!(f, "print"),
            Token::If => write!(f, "if"),
            Token::Then => write!(f, "then"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Ident(s) => write!(f, "{}", s),
            Token::IConst(n) => write!(f, "{}", n),
            Token::SConst(s) => write!(f, "\"{}\"", s),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Assign => write!(f, "="),
            Token::Eq => write!(f, "=="),
            Token::NEq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::LEq => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::GEq => write!(f, ">="),
            Token::And => write!(f, "&&"),
            Token::Or => write!(f, "||"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Semicolon => write!(f, ";"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    #[error("{line}: Unrecognized input '{text}'")]
    Unrecognized { line: usize, text: String },
    #[error("{line}: Integer constant out of range '{text}'")]
    IntegerRange { line: usize, text: String },
}

/// A token together with its source text and the line it starts on.
///
/// For string constants `text` is the contents between the quotes.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub token: Token,
    pub text: String,
    pub line: usize,
}

impl Lexeme {
    pub fn new(token: Token, text: impl Into<String>, line: usize) -> Self {
        Lexeme {
            token,
            text: text.into(),
            line,
        }
    }
}

/// Split `source` into lexemes. Lines are numbered from 1.
pub fn tokenize(source: &str) -> Result<Vec<Lexeme>, LexError> {
    let mut lex = Token::lexer(source);
    let mut lexemes = Vec::new();
    let mut line = 1;
    let mut counted = 0;

    while let Some(result) = lex.next() {
        let span = lex.span();
        line += source[counted..span.start].matches('\n').count();
        counted = span.start;

        let slice = lex.slice();
        match result {
            Ok(token) => {
                let text = match &token {
                    Token::SConst(s) => s.clone(),
                    _ => slice.to_string(),
                };
                lexemes.push(Lexeme::new(token, text, line));
            }
            Err(()) if slice.bytes().all(|b| b.is_ascii_digit()) => {
                return Err(LexError::IntegerRange {
                    line,
                    text: slice.to_string(),
                });
            }
            Err(()) => {
                return Err(LexError::Unrecognized {
                    line,
                    text: slice.to_string(),
                });
            }
        }
    }

    tracing::debug!(tokens = lexemes.len(), lines = line, "tokenized source");
    Ok(lexemes)
}
