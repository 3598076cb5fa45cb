use std::fmt::{Display, Formatter};

use thiserror::Error;

/// A failure reason carried by a rejected deferred value.
///
/// Rejections, and failures raised by fulfillment callbacks, travel down a
/// chain as a `Fault` wrapped in [`Payload::Fault`].
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{message}")]
pub struct Fault {
    message: String,
}

impl Fault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for Fault {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for Fault {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// The value a deferred value settles with.
///
/// The settled payload is dynamically typed; a chain may carry a different
/// kind of payload at every link. `Payload::None` is the empty payload; it
/// is what a reaction with no fulfillment callback settles with.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    #[default]
    None,
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    Fault(Fault),
}

impl Payload {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_fault(&self) -> Option<&Fault> {
        match self {
            Payload::Fault(fault) => Some(fault),
            _ => None,
        }
    }
}

impl Display for Payload {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::None => f.write_str("none"),
            Payload::Bool(value) => write!(f, "{}", value),
            Payload::Integer(value) => write!(f, "{}", value),
            Payload::Number(value) => write!(f, "{}", value),
            Payload::Text(value) => f.write_str(value),
            Payload::Fault(fault) => write!(f, "{}", fault),
        }
    }
}

impl From<()> for Payload {
    fn from(_: ()) -> Self {
        Payload::None
    }
}

impl From<bool> for Payload {
    fn from(value: bool) -> Self {
        Payload::Bool(value)
    }
}

impl From<i64> for Payload {
    fn from(value: i64) -> Self {
        Payload::Integer(value)
    }
}

impl From<f64> for Payload {
    fn from(value: f64) -> Self {
        Payload::Number(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Text(value.to_string())
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Text(value)
    }
}

impl From<Fault> for Payload {
    fn from(fault: Fault) -> Self {
        Payload::Fault(fault)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Payload::from(()), Payload::None)]
    #[case(Payload::from(true), Payload::Bool(true))]
    #[case(Payload::from(42_i64), Payload::Integer(42))]
    #[case(Payload::from(2.5_f64), Payload::Number(2.5))]
    #[case(Payload::from("value"), Payload::Text("value".to_string()))]
    #[case(Payload::from(Fault::new("reason")), Payload::Fault(Fault::new("reason")))]
    fn conversions(#[case] converted: Payload, #[case] expected: Payload) {
        assert_eq!(converted, expected);
    }

    #[test]
    fn fault_displays_its_message() {
        // given
        let fault = Fault::new("Something went wrong");

        // expect
        assert_eq!(fault.message(), "Something went wrong");
        assert_eq!(fault.to_string(), "Something went wrong");
        assert_eq!(
            Payload::from(fault).to_string(),
            "Something went wrong"
        );
    }

    #[test]
    fn text_accessor() {
        // expect
        assert_eq!(Payload::from("data").as_text(), Some("data"));
        assert_eq!(Payload::None.as_text(), None);
    }
}
