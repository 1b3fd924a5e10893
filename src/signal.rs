//! # Stop signals.
//!
//! [`Signal`] maps the symbolic names accepted by `Container::stop` to the
//! numbers forwarded to the container handle.
//!
//! | name      | number |
//! |-----------|--------|
//! | `SIGINT`  | 2      |
//! | `SIGKILL` | 9      |
//! | `SIGTERM` | 15     |
//!
//! Raw numbers are accepted in `1..=64`.

use std::fmt;
use std::str::FromStr;

use crate::error::ContainerError;

const MAX_SIGNAL: i32 = 64;

/// Signal to deliver to a running container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Signal {
    /// Interrupt (2).
    Int,
    /// Graceful termination (15). Default.
    #[default]
    Term,
    /// Forceful kill (9).
    Kill,
    /// Any other signal number.
    Number(i32),
}

impl Signal {
    /// Numeric value, validated to `1..=64`.
    ///
    /// # Example
    /// ```
    /// use containervisor::Signal;
    ///
    /// assert_eq!(Signal::Kill.number().unwrap(), 9);
    /// assert!(Signal::Number(0).number().is_err());
    /// ```
    pub fn number(self) -> Result<i32, ContainerError> {
        match self {
            Signal::Int => Ok(2),
            Signal::Term => Ok(15),
            Signal::Kill => Ok(9),
            Signal::Number(n) if (1..=MAX_SIGNAL).contains(&n) => Ok(n),
            Signal::Number(n) => Err(ContainerError::InvalidSignal {
                signal: n.to_string(),
            }),
        }
    }
}

impl From<i32> for Signal {
    fn from(n: i32) -> Self {
        match n {
            2 => Signal::Int,
            9 => Signal::Kill,
            15 => Signal::Term,
            other => Signal::Number(other),
        }
    }
}

impl FromStr for Signal {
    type Err = ContainerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SIGINT" => Ok(Signal::Int),
            "SIGTERM" => Ok(Signal::Term),
            "SIGKILL" => Ok(Signal::Kill),
            other => other
                .parse::<i32>()
                .map(Signal::from)
                .map_err(|_| ContainerError::InvalidSignal {
                    signal: other.to_string(),
                }),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Int => f.write_str("SIGINT"),
            Signal::Term => f.write_str("SIGTERM"),
            Signal::Kill => f.write_str("SIGKILL"),
            Signal::Number(n) => write!(f, "{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbolic_names() {
        assert_eq!("SIGINT".parse::<Signal>().unwrap().number().unwrap(), 2);
        assert_eq!("SIGTERM".parse::<Signal>().unwrap().number().unwrap(), 15);
        assert_eq!("SIGKILL".parse::<Signal>().unwrap().number().unwrap(), 9);
        assert_eq!(Signal::default(), Signal::Term);
    }

    #[test]
    fn test_numeric_input() {
        assert_eq!("9".parse::<Signal>().unwrap(), Signal::Kill);
        assert_eq!("10".parse::<Signal>().unwrap().number().unwrap(), 10);
        assert_eq!(Signal::from(64).number().unwrap(), 64);
    }

    #[test]
    fn test_rejects_unknown_and_out_of_range() {
        assert!("SIGFOO".parse::<Signal>().is_err());
        assert!("sigkill".parse::<Signal>().is_err());
        assert!(Signal::Number(65).number().is_err());
        assert!(Signal::from(-1).number().is_err());
    }
}
