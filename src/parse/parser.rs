use super::ast::{Binary, Dice, Neg, Node, NodeId, Number, Tree, TreeBuilder};
use super::error::{Diagnostic, DiagnosticKind, Diagnostics, ParseError};
use super::lexer::{lexer, Lexer, Token, TokenKind};
use crate::common::{BinaryOperator, Span};

/// How many groups and prefix negations may enclose one another.
pub const MAX_NESTING: usize = 256;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum DiceOperand {
    Reps,
    Sides,
}

impl DiceOperand {
    fn zero(self) -> DiagnosticKind {
        match self {
            Self::Reps => DiagnosticKind::ZeroReps,
            Self::Sides => DiagnosticKind::ZeroSides,
        }
    }

    fn invalid(self) -> DiagnosticKind {
        match self {
            Self::Reps => DiagnosticKind::InvalidReps,
            Self::Sides => DiagnosticKind::InvalidSides,
        }
    }
}

/// Recursive-descent parser that keeps going after a fault.
///
/// Wherever an operand is missing or broken a placeholder number (NaN) is
/// substituted and a diagnostic recorded; the tree is thrown away at the end
/// if anything was recorded.
pub struct Parser<'a> {
    source: &'a str,
    lexer: Lexer<'a>,
    tree: TreeBuilder,
    diagnostics: Vec<Diagnostic>,
    previous: Option<Token>,
    depth: usize,
    halted: bool,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            lexer: lexer(source),
            tree: TreeBuilder::default(),
            diagnostics: Vec::new(),
            previous: None,
            depth: 0,
            halted: false,
        }
    }

    pub fn parse(mut self) -> Result<Tree, ParseError> {
        if self.at_end() {
            let empty = Diagnostic::new(DiagnosticKind::EmptyExpression, 0..0);
            return Err(ParseError::Invalid(vec1::vec1![empty]));
        }
        let root = self.parse_expression();
        self.finish(root)
    }

    fn finish(self, root: NodeId) -> Result<Tree, ParseError> {
        let Self {
            tree,
            mut diagnostics,
            ..
        } = self;
        let tree = tree.finish(root).map_err(ParseError::OutOfMemory)?;

        // Faults are found depth-first; report them left to right.
        diagnostics.sort_by_key(|d| d.span.start);
        match Diagnostics::try_from_vec(diagnostics) {
            Ok(diagnostics) => {
                tracing::debug!(count = diagnostics.len(), "rejected dice expression");
                Err(ParseError::Invalid(diagnostics))
            }
            Err(_) => {
                tracing::debug!(nodes = tree.len(), "parsed dice expression");
                Ok(tree)
            }
        }
    }

    fn peek(&mut self) -> Option<TokenKind> {
        self.lexer.peek().map(|(kind, _)| *kind)
    }

    fn peek_span(&mut self) -> Span {
        match self.lexer.peek() {
            Some((_, span)) => span.clone(),
            None => self.end(),
        }
    }

    fn end(&self) -> Span {
        self.source.len()..self.source.len()
    }

    fn at_end(&mut self) -> bool {
        self.peek().is_none()
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        self.peek() == Some(kind)
    }

    fn starts_operand(&mut self) -> bool {
        self.peek()
            .map_or(false, |kind| kind.starts_factor() || kind == TokenKind::Dice)
    }

    fn starts_factor(&mut self) -> bool {
        self.peek()
            .map_or(false, |kind| kind.starts_factor() || kind == TokenKind::Minus)
    }

    /// Consumes one token. Error tokens record their diagnostic here, so
    /// every one of them is reported exactly once whatever path skips it.
    fn advance(&mut self) -> Option<Token> {
        let (kind, span) = self.lexer.next()?;
        match kind {
            TokenKind::Error => self.report_stray(span.clone()),
            TokenKind::ErrBadNumber => self.report(DiagnosticKind::InvalidNum, span.clone()),
            _ => {}
        }
        let token = Token { kind, span };
        self.previous = Some(token.clone());
        Some(token)
    }

    fn advance_span(&mut self) -> Span {
        match self.advance() {
            Some(token) => token.span,
            None => self.end(),
        }
    }

    fn consume(&mut self, kind: TokenKind) -> Option<Span> {
        if self.matches(kind) {
            self.advance().map(|token| token.span)
        } else {
            None
        }
    }

    fn report(&mut self, kind: DiagnosticKind, span: Span) {
        if self.halted {
            return;
        }
        tracing::trace!(?kind, ?span, "diagnostic");
        self.diagnostics.push(Diagnostic::new(kind, span));
    }

    fn report_stray(&mut self, span: Span) {
        // A multi-byte character may come out of the lexer as several error
        // tokens; report it once, covering the whole character.
        if !self.source.is_char_boundary(span.start) {
            return;
        }
        let mut end = span.end;
        while !self.source.is_char_boundary(end) {
            end += 1;
        }
        self.report(DiagnosticKind::InvalidOperator, span.start..end);
    }

    fn enter(&mut self, span: &Span) -> bool {
        if self.depth >= MAX_NESTING {
            self.report(DiagnosticKind::NestingTooDeep, span.clone());
            self.halted = true;
            self.lexer.by_ref().for_each(drop);
            return false;
        }
        self.depth += 1;
        true
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn number(&mut self, value: f64, span: Span) -> NodeId {
        self.tree.push(Node::Number(Number { value }), span)
    }

    fn placeholder(&mut self, span: Span) -> NodeId {
        self.number(f64::NAN, span)
    }

    fn binary(&mut self, op: BinaryOperator, left: NodeId, right: NodeId) -> NodeId {
        let span = self.tree.span(left).start..self.tree.span(right).end;
        self.tree
            .push(Node::Binary(Binary { op, left, right }), span)
    }

    /// Negation of a literal folds into the literal.
    fn negate(&mut self, start: usize, operand: NodeId) -> NodeId {
        let span = start..self.tree.span(operand).end;
        if let Some(Node::Number(n)) = self.tree.node_mut(operand) {
            n.value = -n.value;
        } else {
            return self.tree.push(Node::Neg(Neg { operand }), span);
        }
        self.tree.set_span(operand, span);
        operand
    }

    fn parse_expression(&mut self) -> NodeId {
        let lhs = self.parse_term();
        self.parse_sum_tail(lhs)
    }

    /// Returns at the end of input, or at a closing bracket inside a group.
    fn parse_sum_tail(&mut self, mut lhs: NodeId) -> NodeId {
        while let Some(kind) = self.peek() {
            lhs = if let Some(op) = kind.as_sum_op() {
                self.advance();
                let rhs = self.parse_term();
                self.binary(op, lhs, rhs)
            } else if kind.as_product_op().is_some() {
                // Only reachable after a skipped closer or stray character.
                self.parse_product_tail(lhs)
            } else {
                match kind {
                    TokenKind::Close if self.depth > 0 => break,
                    TokenKind::Close => {
                        let span = self.advance_span();
                        self.report(DiagnosticKind::InvalidParenthesis, span);
                        lhs
                    }
                    TokenKind::Error => {
                        // A stray character where an operator belongs stands in for one.
                        self.advance();
                        if self.starts_operand() {
                            let rhs = self.parse_term();
                            self.binary(BinaryOperator::Add, lhs, rhs)
                        } else {
                            lhs
                        }
                    }
                    _ => {
                        let span = self.peek_span();
                        self.report(DiagnosticKind::InvalidOperator, span);
                        let rhs = self.parse_term();
                        self.binary(BinaryOperator::Add, lhs, rhs)
                    }
                }
            };
        }
        lhs
    }

    fn parse_term(&mut self) -> NodeId {
        let lhs = self.parse_dice();
        self.parse_product_tail(lhs)
    }

    fn parse_product_tail(&mut self, mut lhs: NodeId) -> NodeId {
        while let Some(op) = self.peek().and_then(|kind| kind.as_product_op()) {
            self.advance();
            let rhs = self.parse_dice();
            lhs = self.binary(op, lhs, rhs);
        }
        lhs
    }

    fn parse_dice(&mut self) -> NodeId {
        let reps = if self.matches(TokenKind::Dice) {
            None
        } else {
            let factor = self.parse_factor();
            if !self.matches(TokenKind::Dice) {
                return factor;
            }
            Some(factor)
        };

        let marker = self.advance_span();
        let reps = match reps {
            Some(reps) => {
                self.check_dice_operand(reps, DiceOperand::Reps);
                reps
            }
            None => self.number(1.0, marker.start..marker.start),
        };
        let sides = if self.starts_factor() {
            let sides = self.parse_factor();
            self.check_dice_operand(sides, DiceOperand::Sides);
            sides
        } else {
            self.report(DiagnosticKind::NonExistantSides, marker.end..marker.end);
            self.placeholder(marker.end..marker.end)
        };

        let start = self.tree.span(reps).start.min(marker.start);
        let end = self.tree.span(sides).end.max(marker.end);
        self.tree.push(Node::Dice(Dice { reps, sides }), start..end)
    }

    /// Literal dice operands can be judged before anything is rolled.
    fn check_dice_operand(&mut self, id: NodeId, operand: DiceOperand) {
        let Some(value) = self.tree.node(id).and_then(Node::literal) else {
            return;
        };
        let kind = if value.is_nan() {
            // placeholder, already reported
            return;
        } else if value == 0.0 {
            operand.zero()
        } else if value < 0.0 || value.fract() != 0.0 {
            operand.invalid()
        } else {
            return;
        };
        let span = self.tree.span(id);
        self.report(kind, span);
    }

    fn parse_factor(&mut self) -> NodeId {
        loop {
            let Some(kind) = self.peek() else {
                return self.missing_number();
            };
            match kind {
                TokenKind::Integer | TokenKind::Decimal => return self.parse_number(),
                TokenKind::Open => return self.parse_group(),
                TokenKind::Minus => return self.parse_negation(),
                TokenKind::ErrBadNumber => {
                    let span = self.advance_span();
                    return self.placeholder(span);
                }
                TokenKind::Error => {
                    let span = self.advance_span();
                    if !self.peek().map_or(false, |kind| kind.starts_factor()) {
                        return self.placeholder(span);
                    }
                }
                TokenKind::Close if self.depth == 0 => {
                    let operator = self.previous_operator();
                    let span = self.advance_span();
                    self.report(DiagnosticKind::InvalidParenthesis, span.clone());
                    if self.at_end() {
                        // nothing left to stand in for the operand
                        let Some(operator) = operator else {
                            return self.placeholder(span);
                        };
                        self.report(DiagnosticKind::MissingNum, operator.clone());
                        return self.placeholder(operator);
                    }
                }
                _ => return self.missing_number(),
            }
        }
    }

    fn parse_negation(&mut self) -> NodeId {
        let minus = self.advance_span();
        if !self.enter(&minus) {
            return self.placeholder(minus);
        }
        let operand = self.parse_factor();
        self.leave();
        self.negate(minus.start, operand)
    }

    fn previous_operator(&self) -> Option<Span> {
        self.previous
            .as_ref()
            .filter(|token| TokenKind::OPERATORS.contains(&token.kind))
            .map(|token| token.span.clone())
    }

    /// Blames the operator left without an operand.
    fn missing_number(&mut self) -> NodeId {
        let span = match self.previous_operator() {
            Some(span) => span,
            None => self.peek_span(),
        };
        self.report(DiagnosticKind::MissingNum, span.clone());
        self.placeholder(span)
    }

    fn parse_number(&mut self) -> NodeId {
        let span = self.advance_span();
        let value = self
            .source
            .get(span.clone())
            .and_then(|s| s.parse::<f64>().ok());
        match value {
            Some(value) => self.number(value, span),
            None => {
                self.report(DiagnosticKind::InvalidNum, span.clone());
                self.placeholder(span)
            }
        }
    }

    fn parse_group(&mut self) -> NodeId {
        let open = self.advance_span();
        if let Some(close) = self.consume(TokenKind::Close) {
            let span = open.start..close.end;
            self.report(DiagnosticKind::EmptyExpression, span.clone());
            return self.placeholder(span);
        }
        if self.at_end() {
            let span = open.start..self.source.len();
            self.report(DiagnosticKind::UnclosedParenthesis, span.clone());
            return self.placeholder(span);
        }
        if !self.enter(&open) {
            return self.placeholder(open);
        }
        let inner = self.parse_expression();
        self.leave();

        let end = match self.consume(TokenKind::Close) {
            Some(close) => close.end,
            None => {
                let span = open.start..self.source.len();
                self.report(DiagnosticKind::UnclosedParenthesis, span);
                self.source.len()
            }
        };
        self.tree.set_span(inner, open.start..end);
        inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roll::fmt_number;
    use DiagnosticKind::*;

    fn parse(s: &str) -> Result<Tree, ParseError> {
        Parser::new(s).parse()
    }

    fn sexpr(tree: &Tree, id: NodeId) -> String {
        match tree.node(id) {
            Node::Number(n) => fmt_number(n.value),
            Node::Neg(n) => format!("(- {})", sexpr(tree, n.operand)),
            Node::Binary(b) => format!(
                "({} {} {})",
                b.op,
                sexpr(tree, b.left),
                sexpr(tree, b.right)
            ),
            Node::Dice(d) => format!("(d {} {})", sexpr(tree, d.reps), sexpr(tree, d.sides)),
        }
    }

    fn check(s: &str, expected: &str) {
        let tree = parse(s).unwrap();
        assert_eq!(sexpr(&tree, tree.root()), expected, "parsing {:?}", s);
    }

    fn check_err(s: &str, expected: &[(DiagnosticKind, Span)]) {
        let err = parse(s).unwrap_err();
        let actual: Vec<_> = err
            .diagnostics()
            .unwrap()
            .iter()
            .map(|d| (d.kind, d.span.clone()))
            .collect();
        assert_eq!(actual, expected, "parsing {:?}", s);
    }

    #[test]
    fn test_parse_nums() {
        check("32", "32");
        check("3.25", "3.25");
        check(".5", "0.5");
        check("7.", "7");
    }

    #[test]
    fn test_parse_binary() {
        check("2+3*4", "(+ 2 (* 3 4))");
        check("(2+3)*4", "(* (+ 2 3) 4)");
        check("1 - 2 - 3", "(- (- 1 2) 3)");
        check("8 / 4 % 3", "(% (/ 8 4) 3)");
        check("[1+2]*{3}", "(* (+ 1 2) 3)");
        check("(1 + 2]", "(+ 1 2)");
    }

    #[test]
    fn test_parse_unary() {
        check("-3", "-3");
        check("--3", "3");
        check("-(2+1)", "(- (+ 2 1))");
        check("2*-3", "(* 2 -3)");
        check("2 - -(4)", "(- 2 -4)");
    }

    #[test]
    fn test_parse_dice() {
        check("d20", "(d 1 20)");
        check("4D6", "(d 4 6)");
        check("(1+1)d(2*3)", "(d (+ 1 1) (* 2 3))");
        check("2d6 + 3", "(+ (d 2 6) 3)");
        check("-(2d6)", "(- (d 2 6))");
        check("2*-(d4)", "(* 2 (- (d 1 4)))");
        check("d-(-3)", "(d 1 3)");
        check("(d4)d(d6)", "(d (d 1 4) (d 1 6))");
    }

    #[test]
    fn test_err_empty() {
        check_err("", &[(EmptyExpression, 0..0)]);
        check_err("  \t", &[(EmptyExpression, 0..0)]);
        check_err("()", &[(EmptyExpression, 0..2)]);
        check_err("2 * [ ]", &[(EmptyExpression, 4..7)]);
    }

    #[test]
    fn test_err_dice_operands() {
        check_err("2d0", &[(ZeroSides, 2..3)]);
        check_err("0d6", &[(ZeroReps, 0..1)]);
        check_err("d", &[(NonExistantSides, 1..1)]);
        check_err("3d + 1", &[(NonExistantSides, 2..2)]);
        check_err("(-2)d6", &[(InvalidReps, 0..4)]);
        check_err("1.5d6", &[(InvalidReps, 0..3)]);
        check_err("2d1.5", &[(InvalidSides, 2..5)]);
        check_err("d-3", &[(InvalidSides, 1..3)]);
        check_err("(0)d(0)", &[(ZeroReps, 0..3), (ZeroSides, 4..7)]);
    }

    #[test]
    fn test_err_negated_dice() {
        // a minus sign belongs to the factor before `d`
        check_err("-2d6", &[(InvalidReps, 0..2)]);
        check_err("-d4", &[(MissingNum, 0..1)]);
        check_err("2*-d4", &[(MissingNum, 2..3)]);
        check_err("1 + -d6", &[(MissingNum, 4..5)]);
    }

    #[test]
    fn test_err_operators() {
        check_err("2++3", &[(MissingNum, 1..2)]);
        check_err("2*", &[(MissingNum, 1..2)]);
        check_err("*2", &[(MissingNum, 0..1)]);
        check_err("(2+)", &[(MissingNum, 2..3)]);
        check_err("2 3", &[(InvalidOperator, 2..3)]);
        check_err("2 x 3", &[(InvalidOperator, 2..3)]);
        check_err("2 + x", &[(InvalidOperator, 4..5)]);
        check_err("2 \u{e9} 3", &[(InvalidOperator, 2..4)]);
        check_err("1.2.3 + 1", &[(InvalidNum, 0..5)]);
    }

    #[test]
    fn test_err_parentheses() {
        check_err("(2+3", &[(UnclosedParenthesis, 0..4)]);
        check_err("(", &[(UnclosedParenthesis, 0..1)]);
        check_err("2)", &[(InvalidParenthesis, 1..2)]);
        check_err(")2", &[(InvalidParenthesis, 0..1)]);
        check_err("2) + 3", &[(InvalidParenthesis, 1..2)]);
        check_err(")", &[(InvalidParenthesis, 0..1)]);
        check_err(") )", &[(InvalidParenthesis, 0..1), (InvalidParenthesis, 2..3)]);
        check_err("2*)", &[(MissingNum, 1..2), (InvalidParenthesis, 2..3)]);
    }

    #[test]
    fn test_err_many() {
        check_err("2d0 + d", &[(ZeroSides, 2..3), (NonExistantSides, 7..7)]);
        check_err(
            "(2x + 0d4) * d0 + (",
            &[
                (InvalidOperator, 2..3),
                (ZeroReps, 6..7),
                (ZeroSides, 14..15),
                (UnclosedParenthesis, 18..19),
            ],
        );
    }

    #[test]
    fn test_err_source_order() {
        // the unclosed group is only found after its contents
        check_err("(2d0", &[(UnclosedParenthesis, 0..4), (ZeroSides, 3..4)]);
        check_err(
            "((1) + d0",
            &[(UnclosedParenthesis, 0..9), (ZeroSides, 8..9)],
        );
    }

    #[test]
    fn test_err_nesting() {
        let deep = format!("{}1{}", "(".repeat(300), ")".repeat(300));
        check_err(&deep, &[(NestingTooDeep, 256..257)]);
        let negations = format!("{}1", "-".repeat(300));
        check_err(&negations, &[(NestingTooDeep, 256..257)]);

        let allowed = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        check(&allowed, "1");
    }

    #[test]
    fn test_long_chain() {
        let chain = format!("{}1", "1+".repeat(50_000));
        let tree = parse(&chain).unwrap();
        assert_eq!(tree.len(), 100_001);
    }
}
