//! Tokenizer and precedence parser for the `filter` query parameter.
//!
//! `firstName:Kalle* AND (lastName~and OR nickName!NULL)` parses into an
//! [`Expr`] tree; AND binds tighter than OR and adjacent criteria are AND-ed.

use crate::errors::ServiceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    Like,
}

impl Op {
    fn from_char(c: char) -> Option<Self> {
        match c {
            ':' => Some(Op::Equal),
            '!' => Some(Op::NotEqual),
            '>' => Some(Op::GreaterThan),
            '<' => Some(Op::LessThan),
            '~' => Some(Op::Like),
            _ => None,
        }
    }
}

/// One `key op value` token. `leading`/`trailing` mark a `*` wildcard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Criteria {
    pub key: String,
    pub op: Op,
    pub value: String,
    pub leading: bool,
    pub trailing: bool,
}

impl Criteria {
    pub fn is_null(&self) -> bool {
        !self.leading && !self.trailing && self.value.eq_ignore_ascii_case("NULL")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Criteria(Criteria),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Criteria(Criteria),
    And,
    Or,
    Open,
    Close,
}

fn invalid(msg: impl Into<String>) -> ServiceError {
    ServiceError::Validation(format!("filter: {}", msg.into()))
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn parse_criteria(raw: &str) -> Result<Criteria, ServiceError> {
    let split = raw
        .char_indices()
        .find(|(_, c)| !is_word(*c))
        .ok_or_else(|| invalid(format!("missing operator in '{raw}'")))?;
    let (idx, op_char) = split;
    if idx == 0 {
        return Err(invalid(format!("missing key in '{raw}'")));
    }
    let op = Op::from_char(op_char).ok_or_else(|| invalid(format!("unknown operator '{op_char}' in '{raw}'")))?;
    let key = &raw[..idx];
    let mut value = &raw[idx + op_char.len_utf8()..];

    let leading = value.starts_with('*');
    if leading {
        value = &value[1..];
    }
    let trailing = value.ends_with('*');
    if trailing {
        value = &value[..value.len() - 1];
    }
    if value.is_empty() || !value.chars().all(is_word) {
        return Err(invalid(format!("malformed value in '{raw}'")));
    }
    Ok(Criteria { key: key.to_string(), op, value: value.to_string(), leading, trailing })
}

fn tokenize(input: &str) -> Result<Vec<Token>, ServiceError> {
    let mut tokens = Vec::new();
    for word in input.split_whitespace() {
        let mut rest = word;
        while let Some(stripped) = rest.strip_prefix('(') {
            tokens.push(Token::Open);
            rest = stripped;
        }
        let mut closes = 0;
        while let Some(stripped) = rest.strip_suffix(')') {
            closes += 1;
            rest = stripped;
        }
        if !rest.is_empty() {
            let token = if rest.eq_ignore_ascii_case("AND") {
                Token::And
            } else if rest.eq_ignore_ascii_case("OR") {
                Token::Or
            } else {
                Token::Criteria(parse_criteria(rest)?)
            };
            tokens.push(token);
        }
        tokens.extend(std::iter::repeat(Token::Close).take(closes));
    }
    Ok(tokens)
}

fn precedence(t: &Token) -> u8 {
    match t {
        Token::And => 2,
        Token::Or => 1,
        _ => 0,
    }
}

fn reduce(output: &mut Vec<Expr>, op: Token) -> Result<(), ServiceError> {
    let (Some(rhs), Some(lhs)) = (output.pop(), output.pop()) else {
        return Err(invalid("operator is missing an operand"));
    };
    let node = match op {
        Token::And => Expr::And(Box::new(lhs), Box::new(rhs)),
        Token::Or => Expr::Or(Box::new(lhs), Box::new(rhs)),
        _ => return Err(invalid("unbalanced parentheses")),
    };
    output.push(node);
    Ok(())
}

fn push_operator(output: &mut Vec<Expr>, ops: &mut Vec<Token>, op: Token) -> Result<(), ServiceError> {
    while let Some(top) = ops.last() {
        if *top == Token::Open || precedence(top) < precedence(&op) {
            break;
        }
        if let Some(top) = ops.pop() {
            reduce(output, top)?;
        }
    }
    ops.push(op);
    Ok(())
}

/// Parse a filter string. Blank input yields `None`.
pub fn parse(input: &str) -> Result<Option<Expr>, ServiceError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Ok(None);
    }

    let mut output: Vec<Expr> = Vec::new();
    let mut ops: Vec<Token> = Vec::new();
    // true when the previous token ended an operand
    let mut after_operand = false;

    for token in tokens {
        match token {
            Token::Criteria(c) => {
                if after_operand {
                    push_operator(&mut output, &mut ops, Token::And)?;
                }
                output.push(Expr::Criteria(c));
                after_operand = true;
            }
            Token::Open => {
                if after_operand {
                    push_operator(&mut output, &mut ops, Token::And)?;
                }
                ops.push(Token::Open);
                after_operand = false;
            }
            Token::Close => {
                loop {
                    match ops.pop() {
                        Some(Token::Open) => break,
                        Some(op) => reduce(&mut output, op)?,
                        None => return Err(invalid("unbalanced parentheses")),
                    }
                }
                after_operand = true;
            }
            op @ (Token::And | Token::Or) => {
                if !after_operand {
                    return Err(invalid("operator is missing an operand"));
                }
                push_operator(&mut output, &mut ops, op)?;
                after_operand = false;
            }
        }
    }

    while let Some(op) = ops.pop() {
        if op == Token::Open {
            return Err(invalid("unbalanced parentheses"));
        }
        reduce(&mut output, op)?;
    }

    match (output.pop(), output.is_empty()) {
        (Some(expr), true) => Ok(Some(expr)),
        _ => Err(invalid("incomplete expression")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crit(key: &str, op: Op, value: &str) -> Expr {
        Expr::Criteria(Criteria { key: key.into(), op, value: value.into(), leading: false, trailing: false })
    }

    #[test]
    fn blank_filter_is_none() {
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn single_criteria_with_wildcards() {
        let Some(Expr::Criteria(c)) = parse("firstName:*all*").unwrap() else { panic!("expected criteria") };
        assert_eq!(c.key, "firstName");
        assert_eq!(c.op, Op::Equal);
        assert_eq!(c.value, "all");
        assert!(c.leading && c.trailing);
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let e = parse("a:1 OR b:2 and c:3").unwrap().unwrap();
        let expected = Expr::Or(
            Box::new(crit("a", Op::Equal, "1")),
            Box::new(Expr::And(Box::new(crit("b", Op::Equal, "2")), Box::new(crit("c", Op::Equal, "3")))),
        );
        assert_eq!(e, expected);
    }

    #[test]
    fn parentheses_override_precedence() {
        let e = parse("( a:1 OR b:2 ) AND c<3").unwrap().unwrap();
        let expected = Expr::And(
            Box::new(Expr::Or(Box::new(crit("a", Op::Equal, "1")), Box::new(crit("b", Op::Equal, "2")))),
            Box::new(crit("c", Op::LessThan, "3")),
        );
        assert_eq!(e, expected);
        // attached parentheses parse the same
        assert_eq!(parse("(a:1 OR b:2) AND c<3").unwrap().unwrap(), expected);
    }

    #[test]
    fn adjacent_criteria_are_and_ed() {
        let e = parse("a:1 b!2").unwrap().unwrap();
        assert_eq!(e, Expr::And(Box::new(crit("a", Op::Equal, "1")), Box::new(crit("b", Op::NotEqual, "2"))));
    }

    #[test]
    fn null_value_is_recognized() {
        let Some(Expr::Criteria(c)) = parse("parent:null").unwrap() else { panic!("expected criteria") };
        assert!(c.is_null());
    }

    #[test]
    fn malformed_input_is_rejected() {
        for bad in ["a:1 AND", "OR a:1", "(a:1", "a:1)", "a=1", ":1", "a:", "a:x y:z*z", "a:1 AND AND b:2"] {
            assert!(parse(bad).is_err(), "expected error for {bad}");
        }
    }
}
