use super::{args_text, quote};
use crate::registry::Converter;
use crate::value::{JsonView, Kind};
use crate::{Error, Result};

/// Numeric operand pair for the arithmetic converters. Int stays int
/// until a float enters the computation.
enum Num {
    Int(i64),
    Float(f64),
}

fn number_value(view: &JsonView) -> Result<Num> {
    match view.kind() {
        Kind::Int => Ok(Num::Int(view.as_int().ok_or_else(int_range_err)?)),
        Kind::Float => Ok(Num::Float(view.as_float().expect("float kind"))),
        _ => Err(Error::parse("value must be a number")),
    }
}

fn int_range_err() -> Error {
    Error::parse("integer out of range")
}

/// Parses the argument text as a number, tolerating a leading dot
/// (`.5` reads as `0.5`).
fn number_arg(args: &[u8]) -> Result<Num> {
    let mut text = args_text(args)?;
    if text.starts_with('.') {
        text.insert(0, '0');
    }
    let view = JsonView::new(text.as_bytes())?;
    number_value(&view).map_err(|_| Error::parse("converter arguments must be a number"))
}

fn render(num: Num) -> Vec<u8> {
    match num {
        Num::Int(i) => i.to_string().into_bytes(),
        Num::Float(f) => {
            let mut out = f.to_string();
            // keep the float kind observable on round numbers
            if !out.contains(['.', 'e', 'E']) {
                out.push_str(".0");
            }
            out.into_bytes()
        }
    }
}

fn arith(value: &[u8], args: &[u8], op: fn(f64, f64) -> f64, int_op: fn(i64, i64) -> Option<i64>) -> Result<Vec<u8>> {
    let left = number_value(&JsonView::new(value)?)?;
    let right = number_arg(args)?;

    let out = match (left, right) {
        (Num::Int(l), Num::Int(r)) => match int_op(l, r) {
            Some(i) => Num::Int(i),
            None => Num::Float(op(l as f64, r as f64)),
        },
        (Num::Int(l), Num::Float(r)) => Num::Float(op(l as f64, r)),
        (Num::Float(l), Num::Int(r)) => Num::Float(op(l, r as f64)),
        (Num::Float(l), Num::Float(r)) => Num::Float(op(l, r)),
    };

    Ok(render(out))
}

pub struct Add;

impl Converter for Add {
    fn convert(&self, _doc: &[u8], value: &[u8], args: &[u8]) -> Result<Vec<u8>> {
        arith(value, args, |l, r| l + r, |l, r| l.checked_add(r))
    }
}

pub struct Mul;

impl Converter for Mul {
    fn convert(&self, _doc: &[u8], value: &[u8], args: &[u8]) -> Result<Vec<u8>> {
        arith(value, args, |l, r| l * r, |l, r| l.checked_mul(r))
    }
}

pub struct Div;

impl Converter for Div {
    fn convert(&self, _doc: &[u8], value: &[u8], args: &[u8]) -> Result<Vec<u8>> {
        let right = number_arg(args)?;
        let zero = match right {
            Num::Int(i) => i == 0,
            Num::Float(f) => f == 0.0,
        };
        if zero {
            return Err(Error::parse("division by zero"));
        }
        // integer result only when the division is exact
        arith(
            value,
            args,
            |l, r| l / r,
            |l, r| if l % r == 0 { Some(l / r) } else { None },
        )
    }
}

fn float_to_int(value: &[u8], f: fn(f64) -> f64) -> Result<Vec<u8>> {
    let view = JsonView::new(value)?;
    match view.kind() {
        Kind::Int => Ok(value.to_vec()),
        Kind::Float => {
            let rounded = f(view.as_float().expect("float kind"));
            Ok((rounded as i64).to_string().into_bytes())
        }
        _ => Err(Error::parse("value must be a number")),
    }
}

pub struct Ceil;

impl Converter for Ceil {
    fn convert(&self, _doc: &[u8], value: &[u8], _args: &[u8]) -> Result<Vec<u8>> {
        float_to_int(value, f64::ceil)
    }
}

pub struct Floor;

impl Converter for Floor {
    fn convert(&self, _doc: &[u8], value: &[u8], _args: &[u8]) -> Result<Vec<u8>> {
        float_to_int(value, f64::floor)
    }
}

pub struct Round;

impl Converter for Round {
    fn convert(&self, _doc: &[u8], value: &[u8], _args: &[u8]) -> Result<Vec<u8>> {
        float_to_int(value, f64::round)
    }
}

/// Renders a number with a fixed digit count after the decimal point.
pub struct Float;

impl Converter for Float {
    fn convert(&self, _doc: &[u8], value: &[u8], args: &[u8]) -> Result<Vec<u8>> {
        let view = JsonView::new(value)?;
        if !view.is_number() {
            return Err(Error::parse("value must be a number"));
        }
        let precision = match number_arg(args)? {
            Num::Int(i) if i >= 0 => i as usize,
            _ => return Err(Error::parse("precision must be a non-negative integer")),
        };
        let val = view.as_float().expect("number kind");
        Ok(format!("{val:.precision$}").into_bytes())
    }
}

/// String to number; numbers pass through untouched.
pub struct Ston;

impl Converter for Ston {
    fn convert(&self, _doc: &[u8], value: &[u8], _args: &[u8]) -> Result<Vec<u8>> {
        let view = JsonView::new(value)?;
        if view.is_number() {
            return Ok(value.to_vec());
        }
        let text = view
            .as_str()
            .ok_or_else(|| Error::parse("value must be a number or numeric string"))?;
        let inner = JsonView::new(text.as_bytes())
            .map_err(|_| Error::parse("string doesn't parse to a number"))?;
        if !inner.is_number() {
            return Err(Error::parse("string doesn't parse to a number"));
        }
        Ok(inner.to_json_string().into_bytes())
    }
}

/// Number to string; strings pass through untouched. The original
/// digits are preserved inside the quotes.
pub struct Ntos;

impl Converter for Ntos {
    fn convert(&self, _doc: &[u8], value: &[u8], _args: &[u8]) -> Result<Vec<u8>> {
        let view = JsonView::new(value)?;
        if view.is_string() {
            return Ok(value.to_vec());
        }
        if !view.is_number() {
            return Err(Error::parse("value must be a number or string"));
        }
        Ok(quote(&view.to_json_string()))
    }
}
