//! Spoken arithmetic
//!
//! Understands digits and the operator words people actually say
//! ("plus", "minus", "times", "divided by", ...). Words that are neither
//! numbers nor operators are ignored, so "what is 12 times 4" evaluates.

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f64),
    Op(char),
}

/// Replace spoken operators with symbols, longest phrases first
const OPERATOR_WORDS: &[(&str, &str)] = &[
    ("to the power of", "^"),
    ("multiplied by", "*"),
    ("divided by", "/"),
    ("plus", "+"),
    ("minus", "-"),
    ("times", "*"),
    ("over", "/"),
    ("x", "*"),
    ("mod", "%"),
    ("modulo", "%"),
];

fn lex(utterance: &str) -> Vec<Token> {
    let mut text = format!(" {} ", utterance.to_lowercase());
    for (word, symbol) in OPERATOR_WORDS {
        text = text.replace(&format!(" {word} "), &format!(" {symbol} "));
    }

    let mut spaced = String::with_capacity(text.len());
    for c in text.chars() {
        if "+-*/^%".contains(c) {
            spaced.push(' ');
            spaced.push(c);
            spaced.push(' ');
        } else {
            spaced.push(c);
        }
    }

    spaced
        .split_whitespace()
        .filter_map(|t| {
            let t = t.trim_end_matches(['?', '!', '.', ',']);
            match t {
                "+" | "-" | "*" | "/" | "^" | "%" => t.chars().next().map(Token::Op),
                _ if t.starts_with(|c: char| c.is_ascii_digit() || c == '.') => {
                    t.replace(',', "").parse().ok().map(Token::Num)
                }
                _ => None,
            }
        })
        .collect()
}

/// Turn a token stream into `n (op n)*`, folding a leading minus into the number
fn shape(tokens: &[Token]) -> Option<(Vec<f64>, Vec<char>)> {
    let mut nums = Vec::new();
    let mut ops = Vec::new();
    let mut negate = false;
    let mut expect_num = true;

    for token in tokens {
        match (*token, expect_num) {
            (Token::Num(n), true) => {
                nums.push(if negate { -n } else { n });
                negate = false;
                expect_num = false;
            }
            (Token::Op('-'), true) if !negate => negate = true,
            (Token::Op(op), false) => {
                ops.push(op);
                expect_num = true;
            }
            _ => return None,
        }
    }

    (!expect_num && !ops.is_empty()).then_some((nums, ops))
}

const fn precedence(op: char) -> u8 {
    match op {
        '^' => 3,
        '*' | '/' | '%' => 2,
        _ => 1,
    }
}

fn apply(lhs: f64, op: char, rhs: f64) -> Result<f64> {
    match op {
        '+' => Ok(lhs + rhs),
        '-' => Ok(lhs - rhs),
        '*' => Ok(lhs * rhs),
        '/' | '%' if rhs == 0.0 => Err(Error::Skill("division by zero".to_string())),
        '/' => Ok(lhs / rhs),
        '%' => Ok(lhs % rhs),
        '^' => Ok(lhs.powf(rhs)),
        _ => Err(Error::Skill(format!("unknown operator {op}"))),
    }
}

/// Evaluate the arithmetic in an utterance
///
/// Returns `Ok(None)` when the utterance holds no complete expression.
///
/// # Errors
///
/// Returns error on division by zero
pub fn evaluate(utterance: &str) -> Result<Option<f64>> {
    let Some((nums, ops)) = shape(&lex(utterance)) else {
        return Ok(None);
    };

    // operator-precedence reduction over two stacks
    let mut values = vec![nums[0]];
    let mut pending: Vec<char> = Vec::new();
    for (op, rhs) in ops.into_iter().zip(nums.into_iter().skip(1)) {
        while let Some(&top) = pending.last() {
            let right_assoc = op == '^' && top == '^';
            if precedence(top) < precedence(op) || right_assoc {
                break;
            }
            pending.pop();
            reduce(&mut values, top)?;
        }
        pending.push(op);
        values.push(rhs);
    }
    while let Some(op) = pending.pop() {
        reduce(&mut values, op)?;
    }

    Ok(values.pop())
}

fn reduce(values: &mut Vec<f64>, op: char) -> Result<()> {
    let (Some(rhs), Some(lhs)) = (values.pop(), values.pop()) else {
        return Err(Error::Skill("malformed expression".to_string()));
    };
    values.push(apply(lhs, op, rhs)?);
    Ok(())
}

/// Render a result the way it should be spoken
#[must_use]
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        let s = format!("{value:.4}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
