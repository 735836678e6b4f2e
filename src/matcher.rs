//! Matchers deciding whether a raised error is the expected one.
//!
//! A [`Matcher`] is a closed set of variants, chosen when the matcher is built. An error type descriptor is therefore
//! never mistaken for a predicate, whatever order the checks would have run in.

use std::any::type_name;
use std::error::Error;
use std::fmt;

use regex::Regex;

/// The error shape matchers inspect: any thread-safe error.
pub type RaisedError = dyn Error + Send + Sync + 'static;

/// Descriptor for a concrete Rust error type.
#[derive(Clone, Copy)]
pub struct ErrorType {
    name: &'static str,
    is_instance: fn(&RaisedError) -> bool,
}

impl ErrorType {
    pub fn of<E: Error + 'static>() -> Self {
        Self {
            name: type_name::<E>(),
            is_instance: |error: &RaisedError| error.is::<E>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether `error` is exactly of this type.
    pub fn is_instance(&self, error: &RaisedError) -> bool {
        (self.is_instance)(error)
    }
}

impl fmt::Debug for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ErrorType({})", self.name)
    }
}

type Predicate = Box<dyn Fn(&RaisedError) -> bool + Send + Sync>;

/// What qualifies a raised error as expected.
#[derive(Default)]
pub enum Matcher {
    /// Any error qualifies.
    #[default]
    Any,
    /// The error is an instance of the given type.
    Type(ErrorType),
    /// The error message matches the regular expression.
    Pattern(Regex),
    /// The error message equals the string exactly.
    Literal(String),
    /// The predicate returns `true` for the error.
    Predicate(Predicate),
}

impl Matcher {
    pub fn of_type<E: Error + 'static>() -> Self {
        Matcher::Type(ErrorType::of::<E>())
    }

    /// Compile `pattern` into a [`Matcher::Pattern`].
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Matcher::Pattern)
    }

    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&RaisedError) -> bool + Send + Sync + 'static,
    {
        Matcher::Predicate(Box::new(predicate))
    }

    pub fn matches(&self, error: &RaisedError) -> bool {
        match self {
            Matcher::Any => true,
            Matcher::Type(ty) => ty.is_instance(error),
            Matcher::Pattern(regex) => regex.is_match(&error.to_string()),
            Matcher::Literal(message) => error.to_string() == *message,
            Matcher::Predicate(predicate) => predicate(error),
        }
    }

    /// Short human-readable form, used as the `expected` side of a failed match.
    pub fn describe(&self) -> String {
        match self {
            Matcher::Any => "any error".to_string(),
            Matcher::Type(ty) => format!("instance of {}", ty.name()),
            Matcher::Pattern(regex) => format!("/{}/", regex.as_str()),
            Matcher::Literal(message) => message.clone(),
            Matcher::Predicate(_) => "error accepted by predicate".to_string(),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Any => f.write_str("Any"),
            Matcher::Type(ty) => f.debug_tuple("Type").field(ty).finish(),
            Matcher::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Matcher::Literal(message) => f.debug_tuple("Literal").field(message).finish(),
            Matcher::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<ErrorType> for Matcher {
    fn from(ty: ErrorType) -> Self {
        Matcher::Type(ty)
    }
}

impl From<Regex> for Matcher {
    fn from(regex: Regex) -> Self {
        Matcher::Pattern(regex)
    }
}

impl From<&str> for Matcher {
    fn from(message: &str) -> Self {
        Matcher::Literal(message.to_string())
    }
}

impl From<String> for Matcher {
    fn from(message: String) -> Self {
        Matcher::Literal(message)
    }
}
