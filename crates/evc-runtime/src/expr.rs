//! Sandboxed evaluator for designer-authored expressions.
//!
//! Script operands in conditional branches and variable controls are not a
//! host-language escape hatch; they evaluate over a fixed grammar of
//! arithmetic, comparisons, boolean connectives, and read-only game
//! accessors (`v[n]`, `s[n]`, `gold`, `actor[n].hp`, ...). Anything else
//! is a parse error, which the caller absorbs into a default value.

use evc_core::InterpreterError;

use crate::host::Host;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExprValue {
    Number(f64),
    Bool(bool),
}

impl ExprValue {
    pub fn is_truthy(self) -> bool {
        match self {
            Self::Number(value) => value != 0.0,
            Self::Bool(value) => value,
        }
    }

    fn as_number(self) -> Result<f64, InterpreterError> {
        match self {
            Self::Number(value) => Ok(value),
            Self::Bool(_) => Err(InterpreterError::new(
                "EXPR_TYPE",
                "Expected a number, found a boolean.",
            )),
        }
    }
}

/// Evaluates `source` as a condition.
pub fn eval_flag(source: &str, host: &mut dyn Host) -> Result<bool, InterpreterError> {
    Ok(eval(source, host)?.is_truthy())
}

/// Evaluates `source` as an integer amount (fractions are floored, the way
/// the variable store itself rounds).
pub fn eval_amount(source: &str, host: &mut dyn Host) -> Result<i64, InterpreterError> {
    Ok(eval(source, host)?.as_number()?.floor() as i64)
}

pub fn eval(source: &str, host: &mut dyn Host) -> Result<ExprValue, InterpreterError> {
    let tokens = tokenize(source)?;
    if tokens.len() > MAX_TOKENS {
        return Err(InterpreterError::new(
            "EXPR_PARSE",
            format!("Expression exceeds {} tokens.", MAX_TOKENS),
        ));
    }
    let mut parser = Parser {
        tokens,
        cursor: 0,
        depth: 0,
    };
    let expr = parser.parse_or()?;
    if parser.cursor != parser.tokens.len() {
        return Err(InterpreterError::new(
            "EXPR_PARSE",
            format!("Unexpected trailing input in \"{}\".", source),
        ));
    }
    evaluate(&expr, host)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    LBracket,
    RBracket,
    LParen,
    RParen,
    Dot,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    EqEq,
    NotEq,
    Ge,
    Le,
    Gt,
    Lt,
    AndAnd,
    OrOr,
}

fn tokenize(source: &str) -> Result<Vec<Token>, InterpreterError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut index = 0;
    while index < chars.len() {
        let ch = chars[index];
        match ch {
            ' ' | '\t' | '\r' | '\n' => index += 1,
            '[' => {
                tokens.push(Token::LBracket);
                index += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                index += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                index += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                index += 1;
            }
            '.' => {
                tokens.push(Token::Dot);
                index += 1;
            }
            '+' => {
                tokens.push(Token::Plus);
                index += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                index += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                index += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                index += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                index += 1;
            }
            '=' if chars.get(index + 1) == Some(&'=') => {
                tokens.push(Token::EqEq);
                index += 2;
            }
            '!' if chars.get(index + 1) == Some(&'=') => {
                tokens.push(Token::NotEq);
                index += 2;
            }
            '!' => {
                tokens.push(Token::Bang);
                index += 1;
            }
            '>' if chars.get(index + 1) == Some(&'=') => {
                tokens.push(Token::Ge);
                index += 2;
            }
            '<' if chars.get(index + 1) == Some(&'=') => {
                tokens.push(Token::Le);
                index += 2;
            }
            '>' => {
                tokens.push(Token::Gt);
                index += 1;
            }
            '<' => {
                tokens.push(Token::Lt);
                index += 1;
            }
            '&' if chars.get(index + 1) == Some(&'&') => {
                tokens.push(Token::AndAnd);
                index += 2;
            }
            '|' if chars.get(index + 1) == Some(&'|') => {
                tokens.push(Token::OrOr);
                index += 2;
            }
            '0'..='9' => {
                let start = index;
                while index < chars.len() && (chars[index].is_ascii_digit() || chars[index] == '.')
                {
                    index += 1;
                }
                let text: String = chars[start..index].iter().collect();
                let value = text.parse::<f64>().map_err(|_| {
                    InterpreterError::new(
                        "EXPR_PARSE",
                        format!("Malformed number literal \"{}\".", text),
                    )
                })?;
                tokens.push(Token::Number(value));
            }
            _ if ch.is_ascii_alphabetic() || ch == '_' => {
                let start = index;
                while index < chars.len()
                    && (chars[index].is_ascii_alphanumeric() || chars[index] == '_')
                {
                    index += 1;
                }
                tokens.push(Token::Ident(chars[start..index].iter().collect()));
            }
            _ => {
                return Err(InterpreterError::new(
                    "EXPR_PARSE",
                    format!("Unexpected character '{}' in expression.", ch),
                ));
            }
        }
    }
    Ok(tokens)
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Bool(bool),
    Variable(Box<Expr>),
    Switch(Box<Expr>),
    ActorField(Box<Expr>, String),
    EnemyField(Box<Expr>, String),
    GameValue(String),
    Unary(Token, Box<Expr>),
    Binary(Token, Box<Expr>, Box<Expr>),
}

/// Hostile inputs can nest parentheses, index brackets, or unary chains
/// arbitrarily deep; the parser and the evaluator both recurse per nesting
/// level, so the depth is capped and everything past it is a parse error.
const MAX_NESTING: usize = 64;

/// A long flat operator chain builds a left-deep tree without ever nesting,
/// and the evaluator recurses per tree level. The token cap keeps that tree
/// shallow enough for the stack.
const MAX_TOKENS: usize = 1024;

struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).cloned();
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token) -> Result<(), InterpreterError> {
        match self.bump() {
            Some(token) if token == *expected => Ok(()),
            other => Err(InterpreterError::new(
                "EXPR_PARSE",
                format!("Expected {:?}, found {:?}.", expected, other),
            )),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, InterpreterError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::OrOr) {
            self.bump();
            let right = self.parse_and()?;
            left = Expr::Binary(Token::OrOr, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, InterpreterError> {
        let mut left = self.parse_comparison()?;
        while self.peek() == Some(&Token::AndAnd) {
            self.bump();
            let right = self.parse_comparison()?;
            left = Expr::Binary(Token::AndAnd, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, InterpreterError> {
        let left = self.parse_additive()?;
        let operator = match self.peek() {
            Some(Token::EqEq) => Token::EqEq,
            Some(Token::NotEq) => Token::NotEq,
            Some(Token::Ge) => Token::Ge,
            Some(Token::Le) => Token::Le,
            Some(Token::Gt) => Token::Gt,
            Some(Token::Lt) => Token::Lt,
            _ => return Ok(left),
        };
        self.bump();
        let right = self.parse_additive()?;
        Ok(Expr::Binary(operator, Box::new(left), Box::new(right)))
    }

    fn parse_additive(&mut self) -> Result<Expr, InterpreterError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let operator = match self.peek() {
                Some(Token::Plus) => Token::Plus,
                Some(Token::Minus) => Token::Minus,
                _ => return Ok(left),
            };
            self.bump();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary(operator, Box::new(left), Box::new(right));
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, InterpreterError> {
        let mut left = self.parse_unary()?;
        loop {
            let operator = match self.peek() {
                Some(Token::Star) => Token::Star,
                Some(Token::Slash) => Token::Slash,
                Some(Token::Percent) => Token::Percent,
                _ => return Ok(left),
            };
            self.bump();
            let right = self.parse_unary()?;
            left = Expr::Binary(operator, Box::new(left), Box::new(right));
        }
    }

    // Every nesting construct (parentheses, index brackets, unary chains)
    // re-enters through here, so this is the one place the depth is counted.
    fn parse_unary(&mut self) -> Result<Expr, InterpreterError> {
        if self.depth >= MAX_NESTING {
            return Err(InterpreterError::new(
                "EXPR_PARSE",
                "Expression nests too deeply.",
            ));
        }
        self.depth += 1;
        let result = match self.peek() {
            Some(Token::Minus) => {
                self.bump();
                self.parse_unary()
                    .map(|inner| Expr::Unary(Token::Minus, Box::new(inner)))
            }
            Some(Token::Bang) => {
                self.bump();
                self.parse_unary()
                    .map(|inner| Expr::Unary(Token::Bang, Box::new(inner)))
            }
            _ => self.parse_primary(),
        };
        self.depth -= 1;
        result
    }

    fn parse_primary(&mut self) -> Result<Expr, InterpreterError> {
        match self.bump() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => self.parse_accessor(name),
            other => Err(InterpreterError::new(
                "EXPR_PARSE",
                format!("Unexpected token {:?}.", other),
            )),
        }
    }

    fn parse_accessor(&mut self, name: String) -> Result<Expr, InterpreterError> {
        match name.as_str() {
            "true" => Ok(Expr::Bool(true)),
            "false" => Ok(Expr::Bool(false)),
            "v" => Ok(Expr::Variable(Box::new(self.parse_index()?))),
            "s" => Ok(Expr::Switch(Box::new(self.parse_index()?))),
            "actor" => {
                let index = self.parse_index()?;
                let field = self.parse_field()?;
                Ok(Expr::ActorField(Box::new(index), field))
            }
            "enemy" => {
                let index = self.parse_index()?;
                let field = self.parse_field()?;
                Ok(Expr::EnemyField(Box::new(index), field))
            }
            "gold" | "steps" | "partySize" | "mapId" | "timerSeconds" | "playtime"
            | "saveCount" | "battleCount" | "winCount" | "escapeCount" => {
                Ok(Expr::GameValue(name))
            }
            _ => Err(InterpreterError::new(
                "EXPR_UNKNOWN_NAME",
                format!("Unknown accessor \"{}\".", name),
            )),
        }
    }

    fn parse_index(&mut self) -> Result<Expr, InterpreterError> {
        self.expect(&Token::LBracket)?;
        let index = self.parse_or()?;
        self.expect(&Token::RBracket)?;
        Ok(index)
    }

    fn parse_field(&mut self) -> Result<String, InterpreterError> {
        self.expect(&Token::Dot)?;
        match self.bump() {
            Some(Token::Ident(field)) => Ok(field),
            other => Err(InterpreterError::new(
                "EXPR_PARSE",
                format!("Expected a field name, found {:?}.", other),
            )),
        }
    }
}

fn evaluate(expr: &Expr, host: &mut dyn Host) -> Result<ExprValue, InterpreterError> {
    match expr {
        Expr::Number(value) => Ok(ExprValue::Number(*value)),
        Expr::Bool(value) => Ok(ExprValue::Bool(*value)),
        Expr::Variable(index) => {
            let id = evaluate(index, host)?.as_number()? as i64;
            Ok(ExprValue::Number(host.variables().value(id) as f64))
        }
        Expr::Switch(index) => {
            let id = evaluate(index, host)?.as_number()? as i64;
            Ok(ExprValue::Bool(host.switches().value(id)))
        }
        Expr::ActorField(index, field) => {
            let id = evaluate(index, host)?.as_number()? as i64;
            let Some(actor) = host.actors().actor(id) else {
                return Err(InterpreterError::new(
                    "EXPR_UNKNOWN_NAME",
                    format!("Actor {} does not exist.", id),
                ));
            };
            let value = match field.as_str() {
                "hp" => actor.hp(),
                "mp" => actor.mp(),
                "tp" => actor.tp(),
                "level" => actor.level(),
                "exp" => actor.current_exp(),
                _ => {
                    return Err(InterpreterError::new(
                        "EXPR_UNKNOWN_NAME",
                        format!("Unknown actor field \"{}\".", field),
                    ));
                }
            };
            Ok(ExprValue::Number(value as f64))
        }
        Expr::EnemyField(index, field) => {
            let position = evaluate(index, host)?.as_number()? as usize;
            let Some(enemy) = host.troop().enemy(position) else {
                return Err(InterpreterError::new(
                    "EXPR_UNKNOWN_NAME",
                    format!("No enemy at troop position {}.", position),
                ));
            };
            let value = match field.as_str() {
                "hp" => enemy.hp(),
                "mp" => enemy.mp(),
                "tp" => enemy.tp(),
                _ => {
                    return Err(InterpreterError::new(
                        "EXPR_UNKNOWN_NAME",
                        format!("Unknown enemy field \"{}\".", field),
                    ));
                }
            };
            Ok(ExprValue::Number(value as f64))
        }
        Expr::GameValue(name) => {
            let value = match name.as_str() {
                "gold" => host.party().gold(),
                "steps" => host.party().steps(),
                "partySize" => host.party().size() as i64,
                "mapId" => host.map_id(),
                "timerSeconds" => host.timer().frames() / 60,
                "playtime" => host.system().playtime_seconds(),
                "saveCount" => host.system().save_count(),
                "battleCount" => host.system().battle_count(),
                "winCount" => host.system().win_count(),
                "escapeCount" => host.system().escape_count(),
                _ => unreachable!("accessor names are validated at parse time"),
            };
            Ok(ExprValue::Number(value as f64))
        }
        Expr::Unary(operator, inner) => {
            let value = evaluate(inner, host)?;
            match operator {
                Token::Minus => Ok(ExprValue::Number(-value.as_number()?)),
                Token::Bang => Ok(ExprValue::Bool(!value.is_truthy())),
                _ => unreachable!("parser only emits minus and bang"),
            }
        }
        Expr::Binary(operator, left, right) => {
            match operator {
                Token::AndAnd => {
                    let left = evaluate(left, host)?;
                    if !left.is_truthy() {
                        return Ok(ExprValue::Bool(false));
                    }
                    return Ok(ExprValue::Bool(evaluate(right, host)?.is_truthy()));
                }
                Token::OrOr => {
                    let left = evaluate(left, host)?;
                    if left.is_truthy() {
                        return Ok(ExprValue::Bool(true));
                    }
                    return Ok(ExprValue::Bool(evaluate(right, host)?.is_truthy()));
                }
                _ => {}
            }
            let left = evaluate(left, host)?.as_number()?;
            let right = evaluate(right, host)?.as_number()?;
            let result = match operator {
                Token::Plus => ExprValue::Number(left + right),
                Token::Minus => ExprValue::Number(left - right),
                Token::Star => ExprValue::Number(left * right),
                Token::Slash => {
                    if right == 0.0 {
                        return Err(InterpreterError::new("EXPR_DIV_ZERO", "Division by zero."));
                    }
                    ExprValue::Number(left / right)
                }
                Token::Percent => {
                    if right == 0.0 {
                        return Err(InterpreterError::new("EXPR_DIV_ZERO", "Modulo by zero."));
                    }
                    ExprValue::Number(left % right)
                }
                Token::EqEq => ExprValue::Bool(left == right),
                Token::NotEq => ExprValue::Bool(left != right),
                Token::Ge => ExprValue::Bool(left >= right),
                Token::Le => ExprValue::Bool(left <= right),
                Token::Gt => ExprValue::Bool(left > right),
                Token::Lt => ExprValue::Bool(left < right),
                _ => unreachable!("binary operators are exhaustive"),
            };
            Ok(result)
        }
    }
}

#[cfg(test)]
mod expr_tests {
    use super::*;
    use crate::host::{SwitchStore, VariableStore};
    use crate::memory::MemoryHost;

    #[test]
    fn arithmetic_and_precedence() {
        let mut host = MemoryHost::new();
        assert_eq!(
            eval_amount("1 + 2 * 3", &mut host).expect("eval should pass"),
            7
        );
        assert_eq!(
            eval_amount("(1 + 2) * 3", &mut host).expect("eval should pass"),
            9
        );
        assert_eq!(
            eval_amount("-4 + 10 % 3", &mut host).expect("eval should pass"),
            -3
        );
    }

    #[test]
    fn reads_variables_and_switches() {
        let mut host = MemoryHost::new();
        host.variables.set_value(3, 42);
        host.switches.set_value(2, true);
        assert_eq!(
            eval_amount("v[3] / 2", &mut host).expect("eval should pass"),
            21
        );
        assert!(eval_flag("s[2] && v[3] > 40", &mut host).expect("eval should pass"));
        assert!(!eval_flag("!s[2]", &mut host).expect("eval should pass"));
    }

    #[test]
    fn nested_index_expressions() {
        let mut host = MemoryHost::new();
        host.variables.set_value(1, 5);
        host.variables.set_value(5, 99);
        assert_eq!(
            eval_amount("v[v[1]]", &mut host).expect("eval should pass"),
            99
        );
    }

    #[test]
    fn reads_actor_fields() {
        let mut host = MemoryHost::new();
        host.actors.insert_test_actor(1, "Alice", 50, 20);
        assert!(eval_flag("actor[1].hp >= 50", &mut host).expect("eval should pass"));
        assert_eq!(
            eval_amount("actor[1].mp", &mut host).expect("eval should pass"),
            20
        );
    }

    #[test]
    fn rejects_unknown_names_and_garbage() {
        let mut host = MemoryHost::new();
        let error = eval_flag("window.close()", &mut host).expect_err("should reject");
        assert_eq!(error.code, "EXPR_UNKNOWN_NAME");
        let error = eval_flag("1 + ;", &mut host).expect_err("should reject");
        assert_eq!(error.code, "EXPR_PARSE");
        let error = eval_flag("1 2", &mut host).expect_err("should reject trailing input");
        assert_eq!(error.code, "EXPR_PARSE");
    }

    #[test]
    fn runaway_nesting_is_rejected_instead_of_exhausting_the_stack() {
        let mut host = MemoryHost::new();
        let parens = format!("{}1{}", "(".repeat(500), ")".repeat(500));
        let error = eval_flag(&parens, &mut host).expect_err("should reject");
        assert_eq!(error.code, "EXPR_PARSE");
        let bangs = format!("{}true", "!".repeat(500));
        let error = eval_flag(&bangs, &mut host).expect_err("should reject");
        assert_eq!(error.code, "EXPR_PARSE");
        let chain = vec!["0"; 100_000].join("+");
        let error = eval_amount(&chain, &mut host).expect_err("should reject");
        assert_eq!(error.code, "EXPR_PARSE");
        // Ordinary nesting stays well inside the limit.
        assert!(eval_flag("!(!(v[v[1]] == 0))", &mut host).expect("eval should pass"));
    }

    #[test]
    fn division_by_zero_is_an_error_not_a_panic() {
        let mut host = MemoryHost::new();
        let error = eval_amount("1 / 0", &mut host).expect_err("should reject");
        assert_eq!(error.code, "EXPR_DIV_ZERO");
    }

    #[test]
    fn short_circuit_skips_right_side_evaluation() {
        let mut host = MemoryHost::new();
        // actor 999 does not exist; && must not reach it
        assert!(!eval_flag("false && actor[999].hp > 0", &mut host).expect("eval should pass"));
        assert!(eval_flag("true || actor[999].hp > 0", &mut host).expect("eval should pass"));
    }
}
