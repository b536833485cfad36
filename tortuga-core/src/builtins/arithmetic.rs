//! Numeric operations, the PRNG surface, and bitwise operators.

use super::*;
use crate::eval::RunResult;

pub(crate) fn install(it: &mut Interpreter) {
    it.prim(&["sum"], 2, builtin_sum);
    it.prim(&["difference"], 2, builtin_difference);
    it.prim(&["minus"], 1, builtin_minus);
    it.prim(&["product"], 2, builtin_product);
    it.prim(&["quotient"], 2, builtin_quotient);
    it.prim(&["remainder"], 2, builtin_remainder);
    it.prim(&["modulo"], 2, builtin_modulo);
    it.prim(&["int"], 1, builtin_int);
    it.prim(&["round"], 1, builtin_round);
    it.prim(&["sqrt"], 1, builtin_sqrt);
    it.prim(&["power"], 2, builtin_power);
    it.prim(&["exp"], 1, builtin_exp);
    it.prim(&["log10"], 1, builtin_log10);
    it.prim(&["ln"], 1, builtin_ln);
    it.prim(&["sin"], 1, builtin_sin);
    it.prim(&["cos"], 1, builtin_cos);
    it.prim(&["tan"], 1, builtin_tan);
    it.prim(&["radsin"], 1, builtin_radsin);
    it.prim(&["radcos"], 1, builtin_radcos);
    it.prim(&["radtan"], 1, builtin_radtan);
    it.prim(&["arctan"], 1, builtin_arctan);
    it.prim(&["radarctan"], 1, builtin_radarctan);
    it.prim(&["iseq"], 2, builtin_iseq);
    it.prim(&["rseq"], 3, builtin_rseq);
    it.prim(&["random"], 1, builtin_random);
    it.prim(&["rerandom"], 0, builtin_rerandom);
    it.prim(&["form"], 3, builtin_form);
    it.prim(&["bitand"], 2, builtin_bitand);
    it.prim(&["bitor"], 2, builtin_bitor);
    it.prim(&["bitxor"], 2, builtin_bitxor);
    it.prim(&["bitnot"], 1, builtin_bitnot);
    it.prim(&["ashift"], 2, builtin_ashift);
    it.prim(&["lshift"], 2, builtin_lshift);
    it.prim(&["numberwang"], 1, builtin_numberwang);
}

fn fold_numbers(
    it: &Interpreter,
    args: &[Value],
    init: f64,
    f: impl Fn(f64, f64) -> f64,
) -> Result<f64, Flow> {
    let mut acc = init;
    for value in args {
        acc = f(acc, expect_number(it, value)?);
    }
    Ok(acc)
}

pub(crate) fn builtin_sum(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    Ok(Some(Value::num(fold_numbers(it, &args, 0.0, |a, b| a + b)?)))
}

pub(crate) fn builtin_product(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    Ok(Some(Value::num(fold_numbers(it, &args, 1.0, |a, b| a * b)?)))
}

pub(crate) fn builtin_difference(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let a = expect_number(it, arg(it, &args, 0)?)?;
    let b = expect_number(it, arg(it, &args, 1)?)?;
    Ok(Some(Value::num(a - b)))
}

pub(crate) fn builtin_minus(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let n = expect_number(it, arg(it, &args, 0)?)?;
    Ok(Some(Value::num(-n)))
}

pub(crate) fn builtin_quotient(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let a = expect_number(it, arg(it, &args, 0)?)?;
    let b = expect_number(it, arg(it, &args, 1)?)?;
    if b == 0.0 {
        return Err(it.err("Division by zero", &[]));
    }
    Ok(Some(Value::num(a / b)))
}

/// Remainder takes the sign of the dividend.
pub(crate) fn builtin_remainder(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let a = expect_number(it, arg(it, &args, 0)?)?;
    let b = expect_number(it, arg(it, &args, 1)?)?;
    if b == 0.0 {
        return Err(it.err("Division by zero", &[]));
    }
    Ok(Some(Value::num(a % b)))
}

/// Modulo takes the sign of the divisor.
pub(crate) fn builtin_modulo(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let a = expect_number(it, arg(it, &args, 0)?)?;
    let b = expect_number(it, arg(it, &args, 1)?)?;
    if b == 0.0 {
        return Err(it.err("Division by zero", &[]));
    }
    let r = a % b;
    let r = if r != 0.0 && (r < 0.0) != (b < 0.0) {
        r + b
    } else {
        r
    };
    Ok(Some(Value::num(r)))
}

pub(crate) fn builtin_int(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let n = expect_number(it, arg(it, &args, 0)?)?;
    Ok(Some(Value::num(n.trunc())))
}

/// Round half away from zero toward positive infinity, like the host
/// language's `Math.round`.
pub(crate) fn builtin_round(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let n = expect_number(it, arg(it, &args, 0)?)?;
    Ok(Some(Value::num((n + 0.5).floor())))
}

pub(crate) fn builtin_sqrt(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let n = expect_number(it, arg(it, &args, 0)?)?;
    Ok(Some(Value::num(n.sqrt())))
}

pub(crate) fn builtin_power(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let a = expect_number(it, arg(it, &args, 0)?)?;
    let b = expect_number(it, arg(it, &args, 1)?)?;
    Ok(Some(Value::num(a.powf(b))))
}

pub(crate) fn builtin_exp(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let n = expect_number(it, arg(it, &args, 0)?)?;
    Ok(Some(Value::num(n.exp())))
}

pub(crate) fn builtin_log10(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let n = expect_number(it, arg(it, &args, 0)?)?;
    Ok(Some(Value::num(n.log10())))
}

pub(crate) fn builtin_ln(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let n = expect_number(it, arg(it, &args, 0)?)?;
    Ok(Some(Value::num(n.ln())))
}

pub(crate) fn builtin_sin(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let n = expect_number(it, arg(it, &args, 0)?)?;
    Ok(Some(Value::num(n.to_radians().sin())))
}

pub(crate) fn builtin_cos(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let n = expect_number(it, arg(it, &args, 0)?)?;
    Ok(Some(Value::num(n.to_radians().cos())))
}

pub(crate) fn builtin_tan(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let n = expect_number(it, arg(it, &args, 0)?)?;
    Ok(Some(Value::num(n.to_radians().tan())))
}

pub(crate) fn builtin_radsin(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let n = expect_number(it, arg(it, &args, 0)?)?;
    Ok(Some(Value::num(n.sin())))
}

pub(crate) fn builtin_radcos(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let n = expect_number(it, arg(it, &args, 0)?)?;
    Ok(Some(Value::num(n.cos())))
}

pub(crate) fn builtin_radtan(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let n = expect_number(it, arg(it, &args, 0)?)?;
    Ok(Some(Value::num(n.tan())))
}

/// One input: arctangent in degrees. Two (explicit call): `(arctan x y)`
/// is the angle of y/x, quadrant-correct.
pub(crate) fn builtin_arctan(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let x = expect_number(it, arg(it, &args, 0)?)?;
    if args.len() > 1 {
        let y = expect_number(it, &args[1])?;
        Ok(Some(Value::num(y.atan2(x).to_degrees())))
    } else {
        Ok(Some(Value::num(x.atan().to_degrees())))
    }
}

pub(crate) fn builtin_radarctan(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let x = expect_number(it, arg(it, &args, 0)?)?;
    if args.len() > 1 {
        let y = expect_number(it, &args[1])?;
        Ok(Some(Value::num(y.atan2(x))))
    } else {
        Ok(Some(Value::num(x.atan())))
    }
}

pub(crate) fn builtin_iseq(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let from = expect_int(it, arg(it, &args, 0)?)?;
    let to = expect_int(it, arg(it, &args, 1)?)?;
    let step = if from <= to { 1 } else { -1 };
    let mut items = Vec::new();
    let mut n = from;
    loop {
        items.push(Value::num(n as f64));
        if n == to {
            break;
        }
        n += step;
    }
    Ok(Some(Value::list(items)))
}

pub(crate) fn builtin_rseq(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let from = expect_number(it, arg(it, &args, 0)?)?;
    let to = expect_number(it, arg(it, &args, 1)?)?;
    let count = expect_int(it, arg(it, &args, 2)?)?.max(1);
    let mut items = Vec::with_capacity(count as usize);
    if count == 1 {
        items.push(Value::num(from));
    } else {
        let step = (to - from) / (count - 1) as f64;
        for i in 0..count {
            items.push(Value::num(from + step * i as f64));
        }
    }
    Ok(Some(Value::list(items)))
}

/// `random n` is an integer in `[0, n)`; `(random low high)` is inclusive
/// on both ends.
pub(crate) fn builtin_random(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    if args.len() > 1 {
        let low = expect_int(it, &args[0])?;
        let high = expect_int(it, &args[1])?;
        let n = it.prng.between(low, high);
        return Ok(Some(Value::num(n as f64)));
    }
    let max = expect_int(it, arg(it, &args, 0)?)?;
    Ok(Some(Value::num(it.prng.below(max) as f64)))
}

pub(crate) fn builtin_rerandom(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let seed = match args.first() {
        Some(v) => expect_int(it, v)?,
        None => 0,
    };
    it.prng.reseed(seed);
    Ok(None)
}

/// `form num width precision`: fixed-point with `precision` digits, space
/// padded on the left to at least `width` characters.
pub(crate) fn builtin_form(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let n = expect_number(it, arg(it, &args, 0)?)?;
    let width = expect_int(it, arg(it, &args, 1)?)?.max(0) as usize;
    let precision = expect_int(it, arg(it, &args, 2)?)?.max(0) as usize;
    Ok(Some(Value::word(format!("{n:>width$.precision$}"))))
}

fn as_int32(it: &Interpreter, value: &Value) -> Result<i32, Flow> {
    Ok(expect_number(it, value)? as i32)
}

pub(crate) fn builtin_bitand(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let mut acc: i32 = -1;
    for value in &args {
        acc &= as_int32(it, value)?;
    }
    Ok(Some(Value::num(acc as f64)))
}

pub(crate) fn builtin_bitor(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let mut acc: i32 = 0;
    for value in &args {
        acc |= as_int32(it, value)?;
    }
    Ok(Some(Value::num(acc as f64)))
}

pub(crate) fn builtin_bitxor(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let mut acc: i32 = 0;
    for value in &args {
        acc ^= as_int32(it, value)?;
    }
    Ok(Some(Value::num(acc as f64)))
}

pub(crate) fn builtin_bitnot(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let n = as_int32(it, arg(it, &args, 0)?)?;
    Ok(Some(Value::num(!n as f64)))
}

/// Arithmetic shift: positive counts shift left, negative shift right with
/// sign extension.
pub(crate) fn builtin_ashift(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let n = as_int32(it, arg(it, &args, 0)?)?;
    let count = as_int32(it, arg(it, &args, 1)?)?;
    let shifted = if count >= 0 {
        n.wrapping_shl(count as u32)
    } else {
        n.wrapping_shr((-count) as u32)
    };
    Ok(Some(Value::num(shifted as f64)))
}

/// Logical shift: right shifts bring in zero bits.
pub(crate) fn builtin_lshift(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let n = as_int32(it, arg(it, &args, 0)?)? as u32;
    let count = as_int32(it, arg(it, &args, 1)?)?;
    let shifted = if count >= 0 {
        n.wrapping_shl(count as u32)
    } else {
        n.wrapping_shr((-count) as u32)
    };
    Ok(Some(Value::num(shifted as i32 as f64)))
}

// That's numberwang!
pub(crate) fn builtin_numberwang(it: &mut Interpreter, args: Vec<Value>) -> RunResult {
    let _ = expect_number(it, arg(it, &args, 0)?)?;
    Ok(Some(Value::num(it.prng.below(2) as f64)))
}
