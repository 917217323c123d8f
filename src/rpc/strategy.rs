//! Registration-time choice between positional and keyed marshalling

use super::reflect::Reflect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    NoArgument,
    PositionalTuple,
    KeyedRecord,
}

/// Declared shape of one procedure argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgShape {
    /// `Some(n)` when the argument is a named-field record with `n` fields.
    pub record_fields: Option<usize>,
    pub by_reference: bool,
}

impl ArgShape {
    pub fn of<T: Reflect + ?Sized>() -> Self {
        Self {
            record_fields: T::FIELDS.map(<[&str]>::len),
            by_reference: T::BY_REFERENCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub arity: usize,
    /// Shape of the first argument, absent for zero-argument procedures.
    pub first: Option<ArgShape>,
}

impl Signature {
    pub fn new(arity: usize, first: Option<ArgShape>) -> Self {
        Self { arity, first }
    }
}

/// A fieldless record passed by value stays positional; only the by-reference
/// marker forces keyed treatment without fields.
pub fn select_strategy(signature: &Signature) -> Strategy {
    match (signature.arity, signature.first) {
        (0, _) => Strategy::NoArgument,
        (1, Some(shape))
            if shape.by_reference || shape.record_fields.is_some_and(|count| count > 0) =>
        {
            Strategy::KeyedRecord
        }
        _ => Strategy::PositionalTuple,
    }
}
