use crate::common::{BinaryOperator, Span};
use logos::{Logos, SpannedIter};
use std::fmt;
use std::iter::Peekable;

pub type Lexer<'a> = Peekable<SpannedIter<'a, TokenKind>>;

pub fn lexer(s: &str) -> Lexer<'_> {
    TokenKind::lexer(s).spanned().peekable()
}

#[derive(Logos, Debug, Copy, Clone, Eq, PartialEq)]
pub enum TokenKind {
    #[regex(r"[0-9]+")]
    Integer,
    #[regex(r"([0-9]+\.[0-9]*)|(\.[0-9]+)")]
    Decimal,

    #[token("d")]
    #[token("D")]
    Dice,

    #[token("(")]
    #[token("[")]
    #[token("{")]
    Open,
    #[token(")")]
    #[token("]")]
    #[token("}")]
    Close,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    #[regex(r"[0-9]*\.[0-9]*\.[0-9.]*")]
    #[token(".")]
    ErrBadNumber,

    #[regex(r"[ \t\r\n\f]+", logos::skip)]
    #[error]
    Error,
}

impl TokenKind {
    pub const OPERATORS: &'static [Self] = &[
        Self::Plus,
        Self::Minus,
        Self::Star,
        Self::Slash,
        Self::Percent,
        Self::Dice,
    ];

    pub fn as_str(&self) -> &'static str {
        use TokenKind::*;

        match self {
            Integer => "<integer>",
            Decimal => "<decimal>",
            Dice => "'d'",
            Open => "<opening bracket>",
            Close => "<closing bracket>",
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            Slash => "'/'",
            Percent => "'%'",
            ErrBadNumber | Error => "<error>",
        }
    }

    pub fn as_sum_op(&self) -> Option<BinaryOperator> {
        Some(match self {
            Self::Plus => BinaryOperator::Add,
            Self::Minus => BinaryOperator::Sub,
            _ => return None,
        })
    }

    pub fn as_product_op(&self) -> Option<BinaryOperator> {
        Some(match self {
            Self::Star => BinaryOperator::Mul,
            Self::Slash => BinaryOperator::Div,
            Self::Percent => BinaryOperator::Rem,
            _ => return None,
        })
    }

    /// Whether a number or group can begin with this token. A factor may
    /// also begin with a minus sign.
    pub fn starts_factor(&self) -> bool {
        matches!(
            self,
            Self::Integer | Self::Decimal | Self::Open | Self::ErrBadNumber
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scanned token with the byte range it covers.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(s: &str) -> Vec<TokenKind> {
        lexer(s).map(|(kind, _)| kind).collect()
    }

    #[test]
    fn test_lex_numbers() {
        use TokenKind::*;
        assert_eq!(kinds("12"), vec![Integer]);
        assert_eq!(kinds("1.5 .5 3."), vec![Decimal, Decimal, Decimal]);
        assert_eq!(kinds("1.2.3"), vec![ErrBadNumber]);
        assert_eq!(kinds("."), vec![ErrBadNumber]);
    }

    #[test]
    fn test_lex_dice_and_groups() {
        use TokenKind::*;
        assert_eq!(kinds("2d6"), vec![Integer, Dice, Integer]);
        assert_eq!(kinds("D20"), vec![Dice, Integer]);
        assert_eq!(
            kinds("([{}])"),
            vec![Open, Open, Open, Close, Close, Close]
        );
    }

    #[test]
    fn test_lex_operators_and_whitespace() {
        use TokenKind::*;
        assert_eq!(
            kinds(" 1 +\t2 -3*4 / 5 % 6 "),
            vec![
                Integer, Plus, Integer, Minus, Integer, Star, Integer, Slash, Integer, Percent,
                Integer
            ]
        );
    }

    #[test]
    fn test_lex_spans() {
        let tokens: Vec<_> = lexer("10 + d4").collect();
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Integer, 0..2),
                (TokenKind::Plus, 3..4),
                (TokenKind::Dice, 5..6),
                (TokenKind::Integer, 6..7),
            ]
        );
    }

    #[test]
    fn test_lex_unknown_character() {
        use TokenKind::*;
        assert_eq!(kinds("2x3"), vec![Integer, Error, Integer]);
        assert_eq!(kinds("1 & 1"), vec![Integer, Error, Integer]);
    }
}
