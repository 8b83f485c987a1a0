// src/expression.rs
//! Expression syntax shared by the three backends.
//!
//! There is one recursive-descent parser; a [`Grammar`] switches the
//! constructs each backend accepts on or off. Whether an operand has the
//! right kind (length where a length is due, integer where an integer is due)
//! is decided later by the evaluator, which knows its target.

use crate::dimen::Numeral;
use crate::parser::{ParseError, Parser};
use crate::units::UnitSpec;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// `12`, `0.5`
    Number(Numeral),
    /// `12pt`, or `2fil` inside a glue component
    Dimen(Numeral, UnitSpec),
    /// `1pt plus 2fil minus 1pt`
    Glue {
        natural: Box<Node>,
        stretch: Option<Box<Node>>,
        shrink: Option<Box<Node>>,
    },
    /// `\textwidth`
    Length(String),
    /// `\value{page}`
    Counter(String),
    /// `0.5\textwidth`
    Coefficient(Numeral, String),
    /// `\real{1.6}`
    Real(Numeral),
    /// `\ratio{\textwidth}{\textheight}`
    Ratio(Box<Node>, Box<Node>),
    Neg(Box<Node>),
    Binary(BinOp, Box<Node>, Box<Node>),
    /// `sin(30)`; constants such as `pi` are calls without arguments
    Call { name: String, args: Vec<Node> },
    Conditional(Box<Node>, Box<Node>, Box<Node>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
}

/// Constructs a backend accepts beyond `+ - * /`, parentheses, numerals,
/// units and register references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grammar {
    pub name: &'static str,
    /// `plus`/`minus` stretch and shrink components
    pub glue: bool,
    /// `\real{..}` and `\ratio{..}{..}`
    pub calc_macros: bool,
    /// function calls, constants, `^`, comparisons and `?:`
    pub functions: bool,
}

impl Grammar {
    pub const NATIVE: Grammar = Grammar {
        name: "native",
        glue: true,
        calc_macros: false,
        functions: false,
    };
    pub const COMPAT: Grammar = Grammar {
        name: "compat",
        glue: false,
        calc_macros: true,
        functions: false,
    };
    pub const PARSER: Grammar = Grammar {
        name: "parser",
        glue: false,
        calc_macros: false,
        functions: true,
    };
}

pub type EParseErr = ParseError;

pub fn parse_expr(input: &str, grammar: Grammar) -> Result<Node, EParseErr> {
    let mut p = EParser::new(input, grammar);
    let node = p.parse_conditional()?;
    p.finish()?;
    Ok(node)
}

/// A single operand as the host's own assignment accepts it: an optionally
/// signed glue literal, coefficient, integer or register reference. No
/// operators, no parentheses.
pub fn parse_literal(input: &str) -> Result<Node, EParseErr> {
    let mut p = EParser::new(input, Grammar::NATIVE);
    let mut negative = false;
    loop {
        p.parser.skip_ws();
        if p.parser.consume_char('-') {
            negative = !negative;
        } else if !p.parser.consume_char('+') {
            break;
        }
    }
    if p.parser.peek_char() == Some('(') {
        return Err(EParseErr::InvalidSyntax(
            "parentheses need an expression-capable assignment".into(),
        ));
    }
    let node = p.parse_primary()?;
    p.finish()?;
    Ok(if negative { Node::Neg(Box::new(node)) } else { node })
}

struct EParser<'a> {
    parser: Parser<'a>,
    grammar: Grammar,
}

impl<'a> EParser<'a> {
    fn new(s: &'a str, grammar: Grammar) -> Self {
        Self {
            parser: Parser::new(s),
            grammar,
        }
    }

    fn finish(&mut self) -> Result<(), EParseErr> {
        self.parser.skip_ws();
        if !self.parser.eof() {
            return Err(EParseErr::InvalidSyntax(format!(
                "unexpected `{}`",
                self.parser.rest()
            )));
        }
        Ok(())
    }

    fn parse_conditional(&mut self) -> Result<Node, EParseErr> {
        let cond = self.parse_comparison()?;
        if !self.grammar.functions {
            return Ok(cond);
        }
        self.parser.skip_ws();
        if !self.parser.consume_char('?') {
            return Ok(cond);
        }
        let then = self.parse_conditional()?;
        self.parser.skip_ws();
        self.parser.expect(':')?;
        let otherwise = self.parse_conditional()?;
        Ok(Node::Conditional(
            Box::new(cond),
            Box::new(then),
            Box::new(otherwise),
        ))
    }

    fn parse_comparison(&mut self) -> Result<Node, EParseErr> {
        let left = self.parse_additive()?;
        if !self.grammar.functions {
            return Ok(left);
        }
        self.parser.skip_ws();
        let op = [
            ("<=", BinOp::Le),
            (">=", BinOp::Ge),
            ("==", BinOp::Eq),
            ("!=", BinOp::Ne),
            ("<", BinOp::Lt),
            (">", BinOp::Gt),
        ]
        .into_iter()
        .find(|(lit, _)| self.parser.consume_str(lit));
        match op {
            Some((_, op)) => {
                let right = self.parse_additive()?;
                Ok(Node::Binary(op, Box::new(left), Box::new(right)))
            }
            None => Ok(left),
        }
    }

    fn parse_additive(&mut self) -> Result<Node, EParseErr> {
        let mut left = self.parse_term()?;
        loop {
            self.parser.skip_ws();
            let op = if self.parser.consume_char('+') {
                BinOp::Add
            } else if self.parser.consume_char('-') {
                BinOp::Sub
            } else {
                break;
            };
            let right = self.parse_term()?;
            left = Node::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Node, EParseErr> {
        let mut left = self.parse_unary()?;
        loop {
            self.parser.skip_ws();
            let op = if self.parser.consume_char('*') {
                BinOp::Mul
            } else if self.parser.consume_char('/') {
                BinOp::Div
            } else {
                break;
            };
            let right = self.parse_unary()?;
            left = Node::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Node, EParseErr> {
        self.parser.skip_ws();
        if self.parser.consume_char('-') {
            return Ok(Node::Neg(Box::new(self.parse_unary()?)));
        }
        if self.parser.consume_char('+') {
            return self.parse_unary();
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Node, EParseErr> {
        let base = self.parse_primary()?;
        if !self.grammar.functions {
            return Ok(base);
        }
        self.parser.skip_ws();
        if self.parser.consume_char('^') {
            let exponent = self.parse_unary()?;
            return Ok(Node::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Node, EParseErr> {
        self.parser.skip_ws();
        match self.parser.peek_char() {
            Some('(') => {
                self.parser.consume_char('(');
                let inner = self.parse_conditional()?;
                self.parser.skip_ws();
                self.parser.expect(')')?;
                Ok(inner)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => {
                let numeral = self.parse_numeral()?;
                self.parse_quantity(numeral)
            }
            Some('\\') => self.parse_reference(),
            Some(c) if self.grammar.functions && c.is_ascii_alphabetic() => self.parse_call(),
            Some(_) => Err(EParseErr::InvalidSyntax(format!(
                "unexpected `{}`",
                self.parser.rest()
            ))),
            None => Err(EParseErr::InvalidSyntax("unexpected end of expression".into())),
        }
    }

    fn parse_numeral(&mut self) -> Result<Numeral, EParseErr> {
        let text = self.parser.parse_decimal()?;
        Numeral::parse(text).ok_or_else(|| EParseErr::InvalidSyntax(format!("bad number `{text}`")))
    }

    /// What follows a numeral: a unit, a register (coefficient), or nothing.
    fn parse_quantity(&mut self, numeral: Numeral) -> Result<Node, EParseErr> {
        self.parser.skip_ws();
        let word = self.parser.peek_word();
        if let Some(spec) = UnitSpec::lookup(word) {
            self.parser.consume_keyword(word);
            let node = Node::Dimen(numeral, spec);
            return self.parse_glue_tail(node);
        }
        if self.parser.peek_char() == Some('\\') {
            let name = self.parser.parse_control_sequence()?;
            if is_macro(&name) {
                return Err(EParseErr::InvalidSyntax(format!(
                    "`\\{name}` cannot follow the number `{numeral}`"
                )));
            }
            return self.parse_glue_tail(Node::Coefficient(numeral, name));
        }
        Ok(Node::Number(numeral))
    }

    fn parse_glue_tail(&mut self, natural: Node) -> Result<Node, EParseErr> {
        self.parser.skip_ws();
        let word = self.parser.peek_word();
        let is_glue_keyword =
            word.eq_ignore_ascii_case("plus") || word.eq_ignore_ascii_case("minus");
        if !is_glue_keyword {
            return Ok(natural);
        }
        if !self.grammar.glue {
            return Err(EParseErr::InvalidSyntax(format!(
                "stretch and shrink components are not supported by the {} backend",
                self.grammar.name
            )));
        }
        let mut stretch = None;
        if self.parser.consume_keyword("plus") {
            stretch = Some(Box::new(self.parse_glue_component()?));
            self.parser.skip_ws();
        }
        let mut shrink = None;
        if self.parser.consume_keyword("minus") {
            shrink = Some(Box::new(self.parse_glue_component()?));
        }
        Ok(Node::Glue {
            natural: Box::new(natural),
            stretch,
            shrink,
        })
    }

    fn parse_glue_component(&mut self) -> Result<Node, EParseErr> {
        let mut negative = false;
        loop {
            self.parser.skip_ws();
            if self.parser.consume_char('-') {
                negative = !negative;
            } else if !self.parser.consume_char('+') {
                break;
            }
        }
        let node = if self.parser.peek_char() == Some('\\') {
            Node::Length(self.parser.parse_control_sequence()?)
        } else {
            let numeral = self.parse_numeral()?;
            self.parser.skip_ws();
            let word = self.parser.peek_word();
            if let Some(spec) = UnitSpec::lookup(word) {
                self.parser.consume_keyword(word);
                Node::Dimen(numeral, spec)
            } else if self.parser.peek_char() == Some('\\') {
                Node::Coefficient(numeral, self.parser.parse_control_sequence()?)
            } else {
                return Err(EParseErr::InvalidSyntax(format!(
                    "missing unit after `{numeral}` in a stretch or shrink component"
                )));
            }
        };
        Ok(if negative { Node::Neg(Box::new(node)) } else { node })
    }

    fn parse_reference(&mut self) -> Result<Node, EParseErr> {
        let name = self.parser.parse_control_sequence()?;
        match name.as_str() {
            "value" => {
                let counter = self.parser.parse_braced()?.trim();
                if counter.is_empty() {
                    return Err(EParseErr::InvalidSyntax("`\\value` needs a counter name".into()));
                }
                Ok(Node::Counter(counter.to_string()))
            }
            "real" if self.grammar.calc_macros => {
                let text = self.parser.parse_braced()?.trim();
                let numeral = Numeral::parse(text).ok_or_else(|| {
                    EParseErr::InvalidSyntax(format!("`\\real` expects a decimal, found `{text}`"))
                })?;
                Ok(Node::Real(numeral))
            }
            "ratio" if self.grammar.calc_macros => {
                let num = parse_expr(self.parser.parse_braced()?, self.grammar)?;
                let den = parse_expr(self.parser.parse_braced()?, self.grammar)?;
                Ok(Node::Ratio(Box::new(num), Box::new(den)))
            }
            _ => Ok(Node::Length(name)),
        }
    }

    fn parse_call(&mut self) -> Result<Node, EParseErr> {
        let name = self.parser.parse_identifier()?;
        self.parser.skip_ws();
        let mut args = Vec::new();
        if !self.parser.consume_char('(') {
            return Ok(Node::Call { name, args });
        }
        self.parser.skip_ws();
        if self.parser.consume_char(')') {
            return Ok(Node::Call { name, args });
        }
        loop {
            args.push(self.parse_conditional()?);
            self.parser.skip_ws();
            if self.parser.consume_char(',') {
                continue;
            }
            break;
        }
        self.parser.expect(')')?;
        Ok(Node::Call { name, args })
    }
}

fn is_macro(name: &str) -> bool {
    matches!(name, "value" | "real" | "ratio")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{Order, Unit};
    use pretty_assertions::assert_eq;

    fn n(s: &str) -> Numeral {
        Numeral::parse(s).unwrap()
    }

    #[test]
    fn unit_may_follow_whitespace() {
        let node = parse_expr("12 pt", Grammar::NATIVE).unwrap();
        assert_eq!(node, Node::Dimen(n("12"), UnitSpec::Finite(Unit::Pt)));
    }

    #[test]
    fn precedence_and_references() {
        let node = parse_expr("\\textwidth - 2cm*3", Grammar::NATIVE).unwrap();
        assert_eq!(
            node,
            Node::Binary(
                BinOp::Sub,
                Box::new(Node::Length("textwidth".into())),
                Box::new(Node::Binary(
                    BinOp::Mul,
                    Box::new(Node::Dimen(n("2"), UnitSpec::Finite(Unit::Cm))),
                    Box::new(Node::Number(n("3"))),
                )),
            )
        );
    }

    #[test]
    fn glue_literal() {
        let node = parse_expr("1pt plus 2fil minus -1pt", Grammar::NATIVE).unwrap();
        assert_eq!(
            node,
            Node::Glue {
                natural: Box::new(Node::Dimen(n("1"), UnitSpec::Finite(Unit::Pt))),
                stretch: Some(Box::new(Node::Dimen(n("2"), UnitSpec::Infinite(Order::Fil)))),
                shrink: Some(Box::new(Node::Neg(Box::new(Node::Dimen(
                    n("1"),
                    UnitSpec::Finite(Unit::Pt)
                ))))),
            }
        );
    }

    #[test]
    fn glue_rejected_outside_native() {
        let err = parse_expr("1pt plus 1pt", Grammar::COMPAT).unwrap_err();
        let ParseError::InvalidSyntax(msg) = err;
        assert!(msg.contains("compat"), "{msg}");
    }

    #[test]
    fn calc_macros_only_in_compat() {
        assert_eq!(
            parse_expr("\\real{1.5}", Grammar::COMPAT).unwrap(),
            Node::Real(n("1.5"))
        );
        assert_eq!(
            parse_expr("\\real", Grammar::NATIVE).unwrap(),
            Node::Length("real".into())
        );
    }

    #[test]
    fn functions_and_conditionals() {
        let node = parse_expr("max(1, 2) > 1 ? 2^-1 : pi", Grammar::PARSER).unwrap();
        match node {
            Node::Conditional(cond, then, otherwise) => {
                assert!(matches!(*cond, Node::Binary(BinOp::Gt, _, _)));
                assert!(matches!(*then, Node::Binary(BinOp::Pow, _, _)));
                assert_eq!(*otherwise, Node::Call { name: "pi".into(), args: vec![] });
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(parse_expr("sin(30)", Grammar::NATIVE).is_err());
    }

    #[test]
    fn unknown_unit_is_trailing_input() {
        assert!(parse_expr("12xyz", Grammar::NATIVE).is_err());
        assert!(parse_expr("12ptx", Grammar::NATIVE).is_err());
    }

    #[test]
    fn literal_rejects_operators() {
        assert!(parse_literal("-0.5\\parindent").is_ok());
        assert!(parse_literal("2pt+3pt").is_err());
        assert!(parse_literal("(2pt)").is_err());
    }
}
