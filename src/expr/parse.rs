use crate::error::Error;
use std::fmt;

/// Raw syntax tree produced by the parser.
///
/// This is a closed set of node kinds: anything the tokenizer or parser does
/// not recognise fails with [`Error::UnsupportedSyntax`] before a tree
/// exists, so nothing outside these variants is representable.
#[derive(Debug, Clone)]
pub(super) enum Ast {
    Num(f64),
    Var(String),
    Neg(Box<Ast>),
    Bin(BinOp, Box<Ast>, Box<Ast>),
    Call { name: String, args: Vec<Ast> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinOp {
    pub(super) fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Pow => "^",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Open,
    Close,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Num(v) => write!(f, "'{v}'"),
            Token::Ident(s) => write!(f, "'{s}'"),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::Star => write!(f, "'*'"),
            Token::Slash => write!(f, "'/'"),
            Token::Caret => write!(f, "'^'"),
            Token::Open => write!(f, "'('"),
            Token::Close => write!(f, "')'"),
            Token::Comma => write!(f, "','"),
        }
    }
}

fn tokenize(src: &str) -> Result<Vec<Token>, Error> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b' ' | b'\t' | b'\r' | b'\n' => i += 1,
            b'+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            b'-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            b'*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            b'/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            b'^' => {
                tokens.push(Token::Caret);
                i += 1;
            }
            b'(' => {
                tokens.push(Token::Open);
                i += 1;
            }
            b')' => {
                tokens.push(Token::Close);
                i += 1;
            }
            b',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            b'0'..=b'9' | b'.' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                // optional exponent, only when it is actually a well-formed one
                // ('2*e' must stay a constant reference)
                if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
                    let mut j = i + 1;
                    if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                        j += 1;
                    }
                    if j < bytes.len() && bytes[j].is_ascii_digit() {
                        i = j;
                        while i < bytes.len() && bytes[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text = &src[start..i];
                let value = text.parse::<f64>().map_err(|_| Error::UnsupportedSyntax {
                    found: format!("'{text}'"),
                })?;
                // f64::from_str returns Ok(inf) for overflowing literals;
                // a non-finite value must not enter the tree
                if !value.is_finite() {
                    return Err(Error::UnsupportedSyntax {
                        found: format!("'{text}'"),
                    });
                }
                tokens.push(Token::Num(value));
            }
            b'_' | b'a'..=b'z' | b'A'..=b'Z' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                tokens.push(Token::Ident(src[start..i].to_string()));
            }
            _ => {
                // the match arms above consume whole ASCII chars, so i is
                // always on a char boundary here
                let found = src[i..]
                    .chars()
                    .next()
                    .map(|c| format!("'{c}'"))
                    .unwrap_or_default();
                return Err(Error::UnsupportedSyntax { found });
            }
        }
    }

    Ok(tokens)
}

/// Parse `src` into a raw [`Ast`].
///
/// Grammar, loosest binding first:
///
/// ```text
/// sum     := product (('+' | '-') product)*
/// product := unary (('*' | '/') unary)*
/// unary   := '-' unary | power
/// power   := atom ('^' unary)?          // right-associative
/// atom    := number | ident | ident '(' args ')' | '(' sum ')'
/// ```
pub(super) fn parse(src: &str) -> Result<Ast, Error> {
    let tokens = tokenize(src)?;
    let mut parser = Parser { tokens, pos: 0 };
    let ast = parser.sum()?;

    if parser.pos < parser.tokens.len() {
        return Err(parser.unexpected());
    }

    Ok(ast)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, t: &Token) -> bool {
        if self.peek() == Some(t) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn unexpected(&self) -> Error {
        let found = match self.peek() {
            Some(t) => t.to_string(),
            None => "end of expression".to_string(),
        };
        Error::UnsupportedSyntax { found }
    }

    fn sum(&mut self) -> Result<Ast, Error> {
        let mut lhs = self.product()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.product()?;
            lhs = Ast::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn product(&mut self) -> Result<Ast, Error> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Ast::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Ast, Error> {
        if self.eat(&Token::Minus) {
            Ok(Ast::Neg(Box::new(self.unary()?)))
        } else {
            self.power()
        }
    }

    fn power(&mut self) -> Result<Ast, Error> {
        let base = self.atom()?;
        if self.eat(&Token::Caret) {
            // the exponent re-enters unary, giving right-associativity and
            // allowing '2^-3'
            let exponent = self.unary()?;
            Ok(Ast::Bin(BinOp::Pow, Box::new(base), Box::new(exponent)))
        } else {
            Ok(base)
        }
    }

    fn atom(&mut self) -> Result<Ast, Error> {
        match self.peek().cloned() {
            Some(Token::Num(v)) => {
                self.pos += 1;
                Ok(Ast::Num(v))
            }
            Some(Token::Ident(name)) => {
                self.pos += 1;
                if self.eat(&Token::Open) {
                    let mut args = Vec::new();
                    if !self.eat(&Token::Close) {
                        loop {
                            args.push(self.sum()?);
                            if !self.eat(&Token::Comma) {
                                break;
                            }
                        }
                        if !self.eat(&Token::Close) {
                            return Err(self.unexpected());
                        }
                    }
                    Ok(Ast::Call { name, args })
                } else {
                    Ok(Ast::Var(name))
                }
            }
            Some(Token::Open) => {
                self.pos += 1;
                let inner = self.sum()?;
                if !self.eat(&Token::Close) {
                    return Err(self.unexpected());
                }
                Ok(inner)
            }
            _ => Err(self.unexpected()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Ast {
        parse(src).unwrap()
    }

    #[test]
    fn literals_and_names() {
        assert!(matches!(parse_ok("1.5"), Ast::Num(v) if v == 1.5));
        assert!(matches!(parse_ok("2e-3"), Ast::Num(v) if v == 2e-3));
        assert!(matches!(parse_ok("x"), Ast::Var(n) if n == "x"));
        assert!(matches!(parse_ok("tau_0"), Ast::Var(n) if n == "tau_0"));
    }

    #[test]
    fn exponent_suffix_does_not_swallow_the_e_constant() {
        // '2*e' and '2e' are different things; the latter is '2' followed by
        // a variable reference, which fails as a trailing token
        assert!(matches!(parse_ok("2 * e"), Ast::Bin(BinOp::Mul, _, _)));
        assert!(parse("2e").is_err());
    }

    #[test]
    fn precedence_shapes() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        let Ast::Bin(BinOp::Add, _, rhs) = parse_ok("1 + 2 * 3") else {
            panic!("expected addition at the root");
        };
        assert!(matches!(*rhs, Ast::Bin(BinOp::Mul, _, _)));

        // -x^2 parses as -(x^2)
        let Ast::Neg(inner) = parse_ok("-x^2") else {
            panic!("expected negation at the root");
        };
        assert!(matches!(*inner, Ast::Bin(BinOp::Pow, _, _)));

        // 2^3^2 is right-associative
        let Ast::Bin(BinOp::Pow, _, rhs) = parse_ok("2^3^2") else {
            panic!("expected power at the root");
        };
        assert!(matches!(*rhs, Ast::Bin(BinOp::Pow, _, _)));
    }

    #[test]
    fn calls() {
        let Ast::Call { name, args } = parse_ok("sin(x + 1)") else {
            panic!("expected a call");
        };
        assert_eq!(name, "sin");
        assert_eq!(args.len(), 1);

        // arity is checked later; the parser just collects arguments
        let Ast::Call { args, .. } = parse_ok("f(1, 2, 3)") else {
            panic!("expected a call");
        };
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn disallowed_constructs_are_rejected() {
        for src in [
            "x < y",
            "a = 1",
            "x.abs()",
            "xs[0]",
            "\"str\"",
            "a and b",
            "1 +",
            "()",
            "(1 + 2",
            "1.2.3",
            "x @ y",
        ] {
            let err = parse(src).unwrap_err();
            assert!(
                matches!(err, Error::UnsupportedSyntax { .. }),
                "{src}: {err:?}"
            );
        }
    }

    #[test]
    fn overflowing_literals_are_rejected() {
        for src in ["1e999", "-1e999", "123456789e308"] {
            let err = parse(src).unwrap_err();
            assert!(
                matches!(err, Error::UnsupportedSyntax { .. }),
                "{src}: {err:?}"
            );
        }
    }

    #[test]
    fn unexpected_trailing_tokens_are_rejected() {
        assert!(matches!(
            parse("1 2").unwrap_err(),
            Error::UnsupportedSyntax { found } if found == "'2'"
        ));
    }
}
