//! Instruction script parser.
//!
//! One instruction per line:
//!
//! ```text
//! create <amount>
//! deposit <amount>
//! withdraw <amount>
//! buy <SYMBOL> <quantity>
//! sell <SYMBOL> <quantity>
//! show
//! ```
//!
//! Keywords are case-insensitive and symbols are upper-cased. `#` starts a
//! comment. Numbers are only converted here; their sign is checked by the
//! ledger.

use std::fmt;

use crate::domain::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Create { opening_balance: f64 },
    Deposit { amount: f64 },
    Withdraw { amount: f64 },
    Buy { symbol: String, quantity: i64 },
    Sell { symbol: String, quantity: i64 },
    Show,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Create { opening_balance } => write!(f, "create {opening_balance}"),
            Instruction::Deposit { amount } => write!(f, "deposit {amount}"),
            Instruction::Withdraw { amount } => write!(f, "withdraw {amount}"),
            Instruction::Buy { symbol, quantity } => write!(f, "buy {symbol} {quantity}"),
            Instruction::Sell { symbol, quantity } => write!(f, "sell {symbol} {quantity}"),
            Instruction::Show => write!(f, "show"),
        }
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.remaining().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    /// Next whitespace-delimited word and its byte offset.
    fn next_word(&mut self) -> Option<(usize, &'a str)> {
        self.skip_whitespace();
        let rest = self.remaining();
        if rest.is_empty() {
            return None;
        }
        let len = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let start = self.pos;
        self.pos += len;
        Some((start, &rest[..len]))
    }

    fn expect_word(&mut self, what: &str) -> Result<(usize, &'a str), ParseError> {
        self.next_word().ok_or_else(|| ParseError {
            message: format!("expected {what}, found end of input"),
            position: self.input.len(),
        })
    }

    fn parse_amount(&mut self) -> Result<f64, ParseError> {
        let (position, word) = self.expect_word("amount")?;
        word.parse::<f64>().map_err(|_| ParseError {
            message: format!("expected amount, found '{word}'"),
            position,
        })
    }

    fn parse_quantity(&mut self) -> Result<i64, ParseError> {
        let (position, word) = self.expect_word("quantity")?;
        word.parse::<i64>().map_err(|_| ParseError {
            message: format!("expected whole share quantity, found '{word}'"),
            position,
        })
    }

    fn parse_symbol(&mut self) -> Result<String, ParseError> {
        let (position, word) = self.expect_word("symbol")?;
        if !word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return Err(ParseError {
                message: format!("invalid symbol '{word}'"),
                position,
            });
        }
        Ok(word.to_ascii_uppercase())
    }

    fn expect_end(&mut self) -> Result<(), ParseError> {
        match self.next_word() {
            None => Ok(()),
            Some((position, word)) => Err(ParseError {
                message: format!("unexpected '{word}' after instruction"),
                position,
            }),
        }
    }

    fn parse_instruction(&mut self) -> Result<Option<Instruction>, ParseError> {
        let Some((position, keyword)) = self.next_word() else {
            return Ok(None);
        };
        let instruction = match keyword.to_ascii_lowercase().as_str() {
            "create" => Instruction::Create {
                opening_balance: self.parse_amount()?,
            },
            "deposit" => Instruction::Deposit {
                amount: self.parse_amount()?,
            },
            "withdraw" => Instruction::Withdraw {
                amount: self.parse_amount()?,
            },
            "buy" => Instruction::Buy {
                symbol: self.parse_symbol()?,
                quantity: self.parse_quantity()?,
            },
            "sell" => Instruction::Sell {
                symbol: self.parse_symbol()?,
                quantity: self.parse_quantity()?,
            },
            "show" => Instruction::Show,
            _ => {
                return Err(ParseError {
                    message: format!("unknown instruction '{keyword}'"),
                    position,
                });
            }
        };
        self.expect_end()?;
        Ok(Some(instruction))
    }
}

/// Strip a trailing `#` comment.
fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Parse one script line. Blank and comment-only lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Instruction>, ParseError> {
    Parser::new(strip_comment(line)).parse_instruction()
}

/// Parse a whole script, returning each instruction with its 1-based line
/// number. Stops at the first bad line.
pub fn parse_script(script: &str) -> Result<Vec<(usize, Instruction)>, (usize, ParseError)> {
    let mut instructions = Vec::new();
    for (idx, line) in script.lines().enumerate() {
        match parse_line(line) {
            Ok(Some(instruction)) => instructions.push((idx + 1, instruction)),
            Ok(None) => {}
            Err(e) => return Err((idx + 1, e)),
        }
    }
    Ok(instructions)
}
