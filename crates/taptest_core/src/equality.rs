//! Identity and structural equality.
//!
//! [`is_equal`] is "same value" equality: primitives by value, references by allocation. Unlike IEEE comparison,
//! `NaN` equals `NaN` and `+0` differs from `-0`.
//!
//! [`is_deep_equal`] compares composites key by key:
//! 1. identical values are deep-equal;
//! 2. two dates compare their timestamps;
//! 3. if either side is not a composite, fall back to [`is_equal`];
//! 4. both sides must share a prototype (array, plain object, or the same class);
//! 5. own keys are sorted and must match exactly, and every value pair must be deep-equal.
//!
//! Arrays go through the same path with their indices as keys, so order and length both matter.

use std::sync::Arc;

use crate::value::Value;

/// Check whether two values are the same value.
pub fn is_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => same_number(*a, *b),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Symbol(a), Value::Symbol(b)) => Arc::ptr_eq(a, b),
        (Value::Date(a), Value::Date(b)) => Arc::ptr_eq(a, b),
        (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
        (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
        (Value::Host(a), Value::Host(b)) => a.ptr_eq(b),
        _ => false,
    }
}

/// `NaN` is equal to itself; the two zeroes are distinct.
#[inline]
fn same_number(a: f64, b: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return a.is_nan() && b.is_nan();
    }
    a.to_bits() == b.to_bits()
}

/// Check whether two values are structurally equal.
pub fn is_deep_equal(actual: &Value, expected: &Value) -> bool {
    if is_equal(actual, expected) {
        return true;
    }

    if let (Value::Date(a), Value::Date(b)) = (actual, expected) {
        return a.millis() == b.millis();
    }

    // Non-composites already failed the identity check above.
    if !actual.is_composite() || !expected.is_composite() {
        return false;
    }

    if actual.prototype() != expected.prototype() {
        return false;
    }

    let mut entries_actual = actual.own_entries();
    let mut entries_expected = expected.own_entries();
    entries_actual.sort_by(|a, b| a.0.cmp(&b.0));
    entries_expected.sort_by(|a, b| a.0.cmp(&b.0));

    if entries_actual.len() != entries_expected.len() {
        return false;
    }

    let pairs = || entries_actual.iter().zip(entries_expected.iter());

    pairs().all(|((ka, _), (ke, _))| ka == ke) && pairs().all(|((_, va), (_, ve))| is_deep_equal(va, ve))
}
