use std::error::Error;
use std::fmt;

/// Boxed static error type
pub type Err = Box<dyn Error + 'static>;

/// Everything that can go wrong while reading, normalizing, or indexing a grammar.
/// A sentence that the grammar can't derive is *not* an error, see [`crate::cyk::parse`].
#[derive(Debug, Clone, PartialEq)]
pub enum GrammarError {
  /// A rule record that couldn't be read. `line` is 1-based.
  InputFormat { line: usize, message: String },
  /// The probabilities of every rule for `symbol` add up to zero (or aren't finite),
  /// so there's no distribution to renormalize to.
  Normalization { symbol: String },
  /// A rule with nothing on its right hand side.
  EmptyRhs { lhs: String },
  /// A rule with more than two right hand symbols was handed to the parser.
  NotCnf { rule: String },
}

impl GrammarError {
  pub fn input_format(line: usize, message: impl Into<String>) -> Self {
    Self::InputFormat {
      line,
      message: message.into(),
    }
  }
}

impl fmt::Display for GrammarError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::InputFormat { line, message } => write!(f, "line {}: {}", line, message),
      Self::Normalization { symbol } => write!(
        f,
        "can't renormalize rules for {}: probabilities don't sum to a positive finite number",
        symbol
      ),
      Self::EmptyRhs { lhs } => write!(f, "rule for {} has an empty right hand side", lhs),
      Self::NotCnf { rule } => write!(f, "rule is not in chomsky normal form: {}", rule),
    }
  }
}

impl Error for GrammarError {}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_messages() {
    assert_eq!(
      GrammarError::input_format(3, "bad probability x").to_string(),
      "line 3: bad probability x"
    );
    assert_eq!(
      GrammarError::Normalization {
        symbol: "NP".to_string()
      }
      .to_string(),
      "can't renormalize rules for NP: probabilities don't sum to a positive finite number"
    );
  }

  #[test]
  fn test_boxes_into_err() {
    let e: Err = GrammarError::EmptyRhs {
      lhs: "S".to_string(),
    }
    .into();
    assert_eq!(e.to_string(), "rule for S has an empty right hand side");
  }
}
