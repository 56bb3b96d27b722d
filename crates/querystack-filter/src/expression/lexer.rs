//! Tokenizer for filter expressions.

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::{QueryError, QueryResult};

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// Category of a lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Identifier or dotted field path.
    Field,
    /// Quoted string literal.
    String,
    /// Integer or decimal literal.
    Number,
    /// `null`
    Null,
    /// `and`
    And,
    /// `or`
    Or,
    /// `not`
    Not,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `~`
    Match,
    /// `!~`
    NotMatch,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Every comparison operator.
    pub const COMPARISONS: [Self; 8] = [
        Self::Eq,
        Self::Ne,
        Self::Match,
        Self::NotMatch,
        Self::Lt,
        Self::Le,
        Self::Gt,
        Self::Ge,
    ];

    /// Whether this kind is a comparison operator.
    #[must_use]
    pub fn is_comparison(self) -> bool {
        Self::COMPARISONS.contains(&self)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Field => "field",
            Self::String => "string",
            Self::Number => "number",
            Self::Null => "'null'",
            Self::And => "'and'",
            Self::Or => "'or'",
            Self::Not => "'not'",
            Self::Eq => "'=='",
            Self::Ne => "'!='",
            Self::Match => "'~'",
            Self::NotMatch => "'!~'",
            Self::Lt => "'<'",
            Self::Le => "'<='",
            Self::Gt => "'>'",
            Self::Ge => "'>='",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::Eof => "end of input",
        };
        f.write_str(s)
    }
}

/// A lexed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token category.
    pub kind: TokenKind,
    /// Source text; string literals exclude their quotes.
    pub text: String,
    /// Byte offset of the token's first character.
    pub position: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Field => write!(f, "field '{}'", self.text),
            TokenKind::String => write!(f, "string '{}'", self.text),
            TokenKind::Number => write!(f, "number {}", self.text),
            kind => write!(f, "{kind}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

/// Produces tokens from a filter expression one at a time.
///
/// Once the input is exhausted every further call yields [`TokenKind::Eof`].
///
/// ```
/// use querystack_filter::{Lexer, TokenKind};
///
/// let mut lexer = Lexer::new("age >= 18");
/// assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Field);
/// assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Ge);
/// assert_eq!(lexer.next_token().unwrap().text, "18");
/// assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
/// ```
#[derive(Debug)]
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over `input`.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    /// Lex the next token.
    pub fn next_token(&mut self) -> QueryResult<Token> {
        self.skip_whitespace();

        let Some(&(start, ch)) = self.chars.peek() else {
            return Ok(Token::new(TokenKind::Eof, "", self.input.len()));
        };

        match ch {
            '(' => Ok(self.single(TokenKind::LParen, start)),
            ')' => Ok(self.single(TokenKind::RParen, start)),
            '~' => Ok(self.single(TokenKind::Match, start)),
            '=' => self.read_equals(start),
            '!' => self.read_bang(start),
            '<' => Ok(self.read_angle(TokenKind::Lt, TokenKind::Le, start)),
            '>' => Ok(self.read_angle(TokenKind::Gt, TokenKind::Ge, start)),
            '\'' | '"' => self.read_string(ch, start),
            '-' if self.digit_follows(start) => self.read_number(start),
            c if c.is_ascii_digit() => self.read_number(start),
            c if is_ident_start(c) => Ok(self.read_identifier_or_keyword(start)),
            c => Err(unexpected_symbol(c, start)),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.chars.peek().is_some_and(|(_, c)| c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn single(&mut self, kind: TokenKind, start: usize) -> Token {
        self.chars.next();
        Token::new(kind, &self.input[start..=start], start)
    }

    /// Consume the next char if it is `expected`.
    fn eat(&mut self, expected: char) -> bool {
        self.chars.next_if(|&(_, c)| c == expected).is_some()
    }

    /// Byte offset just past the last consumed char.
    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.input.len(), |&(i, _)| i)
    }

    fn read_equals(&mut self, start: usize) -> QueryResult<Token> {
        self.chars.next(); // consume '='
        if self.eat('=') {
            Ok(Token::new(TokenKind::Eq, "==", start))
        } else {
            Err(unexpected_symbol('=', start))
        }
    }

    fn read_bang(&mut self, start: usize) -> QueryResult<Token> {
        self.chars.next(); // consume '!'
        if self.eat('=') {
            Ok(Token::new(TokenKind::Ne, "!=", start))
        } else if self.eat('~') {
            Ok(Token::new(TokenKind::NotMatch, "!~", start))
        } else {
            Err(unexpected_symbol('!', start))
        }
    }

    fn read_angle(&mut self, strict: TokenKind, inclusive: TokenKind, start: usize) -> Token {
        self.chars.next(); // consume '<' or '>'
        let kind = if self.eat('=') { inclusive } else { strict };
        let end = self.offset();
        Token::new(kind, &self.input[start..end], start)
    }

    fn read_string(&mut self, quote: char, start: usize) -> QueryResult<Token> {
        self.chars.next(); // consume opening quote
        let content_start = start + quote.len_utf8();
        for (i, c) in self.chars.by_ref() {
            if c == quote {
                return Ok(Token::new(
                    TokenKind::String,
                    &self.input[content_start..i],
                    start,
                ));
            }
        }
        Err(unexpected_symbol(quote, start))
    }

    fn digit_follows(&self, start: usize) -> bool {
        self.input[start + 1..].starts_with(|c: char| c.is_ascii_digit())
    }

    fn read_number(&mut self, start: usize) -> QueryResult<Token> {
        self.eat('-');
        let mut seen_dot = false;
        while let Some(&(i, c)) = self.chars.peek() {
            if c.is_ascii_digit() {
                self.chars.next();
            } else if c == '.' {
                if seen_dot {
                    return Err(unexpected_symbol('.', i));
                }
                seen_dot = true;
                self.chars.next();
            } else {
                break;
            }
        }
        let end = self.offset();
        Ok(Token::new(TokenKind::Number, &self.input[start..end], start))
    }

    fn read_identifier_or_keyword(&mut self, start: usize) -> Token {
        while self.chars.next_if(|&(_, c)| is_ident_continue(c)).is_some() {}
        let end = self.offset();
        let text = &self.input[start..end];
        let kind = match text {
            "null" => TokenKind::Null,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            _ => TokenKind::Field,
        };
        Token::new(kind, text, start)
    }
}

/// Returns `true` if `c` can start an identifier.
fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Returns `true` if `c` can continue an identifier or dotted path.
fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

fn unexpected_symbol(symbol: char, position: usize) -> QueryError {
    QueryError::UnexpectedSymbol {
        symbol: symbol.to_string(),
        position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> QueryResult<Vec<Token>> {
        let mut lexer = Lexer::new(input);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            if token.kind == TokenKind::Eof {
                return Ok(tokens);
            }
            tokens.push(token);
        }
    }

    fn kinds(input: &str) -> Vec<TokenKind> {
        lex(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_should_lex_condition_with_positions() {
        let tokens = lex("user.name == 'Jan'").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::new(TokenKind::Field, "user.name", 0),
                Token::new(TokenKind::Eq, "==", 10),
                Token::new(TokenKind::String, "Jan", 13),
            ]
        );
    }

    #[test]
    fn test_should_lex_all_operators_longest_first() {
        use TokenKind::{Eq, Ge, Gt, LParen, Le, Lt, Match, Ne, NotMatch, RParen};
        assert_eq!(
            kinds("== != ~ !~ < <= > >= ( )"),
            vec![Eq, Ne, Match, NotMatch, Lt, Le, Gt, Ge, LParen, RParen]
        );
        assert_eq!(kinds("a<=1"), vec![TokenKind::Field, Le, TokenKind::Number]);
    }

    #[test]
    fn test_should_match_keywords_case_sensitively() {
        use TokenKind::{And, Field, Not, Null, Or};
        assert_eq!(kinds("null and or not"), vec![Null, And, Or, Not]);
        assert_eq!(kinds("NULL AND Or"), vec![Field, Field, Field]);
        assert_eq!(kinds("android"), vec![Field]);
    }

    #[test]
    fn test_should_lex_numbers() {
        let tokens = lex("1 2.5 -3 -0.25").unwrap();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["1", "2.5", "-3", "-0.25"]);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Number));
    }

    #[test]
    fn test_should_reject_second_decimal_point() {
        let err = lex("a == 1.2.3").unwrap_err();
        assert!(matches!(
            err,
            QueryError::UnexpectedSymbol { ref symbol, position: 8 } if symbol == "."
        ));
    }

    #[test]
    fn test_should_lex_both_quote_styles_without_escapes() {
        let tokens = lex(r#"'it"s' "it's" 'a\'"#).unwrap();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["it\"s", "it's", "a\\"]);
    }

    #[test]
    fn test_should_report_unterminated_string_at_opening_quote() {
        let err = lex("name == 'Jan").unwrap_err();
        assert!(matches!(
            err,
            QueryError::UnexpectedSymbol { ref symbol, position: 8 } if symbol == "'"
        ));
    }

    #[test]
    fn test_should_reject_bare_equals_and_bang() {
        for (input, symbol, position) in [("a = 1", "=", 2), ("a ! 1", "!", 2), ("!", "!", 0)] {
            let err = lex(input).unwrap_err();
            assert!(
                matches!(err, QueryError::UnexpectedSymbol { symbol: ref s, position: p } if s == symbol && p == position),
                "{input}: {err}"
            );
        }
    }

    #[test]
    fn test_should_reject_unknown_characters() {
        let err = lex("a == 1 & b == 2").unwrap_err();
        assert!(matches!(
            err,
            QueryError::UnexpectedSymbol { ref symbol, position: 7 } if symbol == "&"
        ));
        assert!(lex("-a").is_err());
    }

    #[test]
    fn test_should_keep_returning_eof() {
        let mut lexer = Lexer::new("  ");
        assert_eq!(lexer.next_token().unwrap(), Token::new(TokenKind::Eof, "", 2));
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
    }
}
