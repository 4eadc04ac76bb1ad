//! Exact-precision comparison of JSON numbers.
//!
//! `multipleOf`, `maximum`, and friends are specified against the
//! mathematical value of a JSON number, not its floating point
//! representation. `0.1` divided by `0.1` must be exactly `1`, which `f64`
//! cannot guarantee. Every numeric literal is parsed into a
//! [`num_rational::BigRational`] instead, via a decimal-string parser that
//! builds the numerator/denominator directly rather than round-tripping
//! through `f64`.

pub use num::BigRational;
use num::{pow, BigInt, One, Zero};
use std::str::FromStr;

use crate::error::NumberError;

lazy_static::lazy_static! {
    static ref TEN: BigInt = BigInt::from(10u8);
}

fn ten() -> BigInt {
    TEN.clone()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Head,
    Negative,
    Integer,
    Fraction,
    E,
    Exponent,
    Error,
}

impl State {
    fn next(self, c: char) -> State {
        use State::*;
        match self {
            Head => match c {
                ' ' => Head,
                '-' => Negative,
                '0'..='9' => Integer,
                '.' => Fraction,
                _ => Error,
            },
            Negative => match c {
                '0'..='9' => Integer,
                '.' => Fraction,
                _ => Error,
            },
            Integer => match c {
                '0'..='9' => Integer,
                '.' => Fraction,
                'e' | 'E' => E,
                _ => Error,
            },
            Fraction => match c {
                '0'..='9' => Fraction,
                'e' | 'E' => E,
                _ => Error,
            },
            E => match c {
                '-' | '+' | '0'..='9' => Exponent,
                _ => Error,
            },
            Exponent => match c {
                '0'..='9' => Exponent,
                _ => Error,
            },
            Error => unreachable!("Error is terminal and never re-entered"),
        }
    }
}

struct Parser<'a> {
    value: &'a str,
    state: State,
    negative: bool,
    integer_index: Option<usize>,
    fraction_index: Option<usize>,
    exponent_index: Option<usize>,
}

impl<'a> Parser<'a> {
    fn step(&mut self, i: usize, c: char) -> Result<(), NumberError> {
        use State::*;
        self.state = self.state.next(c);
        match self.state {
            Negative => self.negative = true,
            Integer if self.integer_index.is_none() => self.integer_index = Some(i),
            Fraction if self.fraction_index.is_none() => self.fraction_index = Some(i),
            E => self.exponent_index = Some(i),
            Error => {
                return Err(NumberError::UnexpectedChar {
                    value: self.value.to_owned(),
                    character: c,
                    index: i,
                })
            }
            _ => {}
        }
        Ok(())
    }

    fn integer(&self) -> &str {
        let Some(start) = self.integer_index else {
            return "0";
        };
        let end = self.fraction_index.or(self.exponent_index).unwrap_or(self.value.len());
        &self.value[start..end]
    }

    fn fraction(&self) -> Option<&str> {
        let start = self.fraction_index?;
        let end = self.exponent_index.unwrap_or(self.value.len());
        Some(&self.value[start + 1..end])
    }

    fn exponent(&self) -> Option<&str> {
        let e = &self.value[self.exponent_index? + 1..];
        if e.is_empty() {
            None
        } else {
            Some(e)
        }
    }

    fn parse(value: &'a str) -> Result<BigRational, NumberError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(NumberError::Empty(value.to_owned()));
        }
        let mut parser = Parser {
            value,
            state: State::Head,
            negative: false,
            integer_index: None,
            fraction_index: None,
            exponent_index: None,
        };
        for (i, c) in value.char_indices() {
            parser.step(i, c)?;
        }

        let integer = BigInt::from_str(parser.integer()).unwrap_or_else(|_| BigInt::zero());
        let fraction_digits = parser.fraction();
        let fraction = fraction_digits.map_or(BigInt::zero(), |f| BigInt::from_str(f).unwrap_or_else(|_| BigInt::zero()));
        let denom = fraction_digits.map_or(BigInt::one(), |f| pow(ten(), f.len()));

        let mut result = BigRational::new(fraction, denom) + integer;
        if parser.negative {
            result = -result;
        }

        if let Some(exp) = parser.exponent() {
            let exp: i64 = exp
                .parse()
                .map_err(|source| NumberError::Exponent { value: value.to_owned(), source })?;
            if exp >= 0 {
                result *= pow(ten(), exp as usize);
            } else {
                result /= pow(ten(), (-exp) as usize);
            }
        }
        Ok(result)
    }
}

/// Parses a JSON number literal (as it appears in source text) into an
/// exact [`BigRational`].
pub fn parse(value: &str) -> Result<BigRational, NumberError> {
    Parser::parse(value)
}

/// Parses a [`serde_json::Number`] into an exact [`BigRational`], going
/// through its canonical decimal string form.
pub fn from_json_number(number: &serde_json::Number) -> Result<BigRational, NumberError> {
    parse(&number.to_string())
}

/// `true` if `value` is an exact integer multiple of `of`, per the
/// `multipleOf` keyword: the result of
/// `value / of` must be an integer, computed exactly, not within floating
/// point tolerance.
pub fn is_multiple_of(value: &BigRational, of: &BigRational) -> bool {
    if of.is_zero() {
        return false;
    }
    (value / of).is_integer()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_integer() {
        assert_eq!(parse("42").unwrap(), BigRational::from_integer(42.into()));
    }

    #[test]
    fn parses_negative_decimal() {
        let value = parse("-1.5").unwrap();
        assert_eq!(value, BigRational::new((-3).into(), 2.into()));
    }

    #[test]
    fn parses_exponent_forms() {
        assert_eq!(parse("1e2").unwrap(), BigRational::from_integer(100.into()));
        assert_eq!(parse("1.5e-1").unwrap(), BigRational::new(15.into(), 100.into()));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse("1.2.3").is_err());
        assert!(parse("--1").is_err());
    }

    #[test]
    fn multiple_of_is_exact_for_decimal_fractions() {
        let value = parse("0.3").unwrap();
        let of = parse("0.1").unwrap();
        assert!(is_multiple_of(&value, &of));
    }

    #[test]
    fn multiple_of_rejects_zero_divisor() {
        let value = parse("1").unwrap();
        let of = parse("0").unwrap();
        assert!(!is_multiple_of(&value, &of));
    }

    #[test]
    fn multiple_of_rejects_non_multiple() {
        let value = parse("1.1").unwrap();
        let of = parse("0.5").unwrap();
        assert!(!is_multiple_of(&value, &of));
    }
}
