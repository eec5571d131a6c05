//! Probabilistic CYK parsing over grammars binarized into chomsky normal form.
//!
//! ```
//! use pcky::Grammar;
//!
//! let g: Grammar = r#"
//!   S  -> NP;
//!   NP -> DT NN;
//!   DT -> "a";
//!   NN -> "barrier";
//! "#
//! .parse()
//! .unwrap();
//!
//! let parse = g.parse(&["a", "barrier"]).unwrap();
//! assert_eq!(parse.tree.bracketed(), "(S (NP (DT a) (NN barrier)))");
//! assert_eq!(parse.prob, 1.0);
//! ```

#[macro_use]
extern crate lazy_static;

pub mod binarize;
pub mod cyk;
pub mod grammar;
pub mod parse_grammar;
pub mod rules;
pub mod syntree;
pub mod utils;

pub use crate::binarize::{binarize, Binarizer};
pub use crate::cyk::{best_parse, parse, parse_chart, Chart, Parse};
pub use crate::grammar::Grammar;
pub use crate::parse_grammar::{load_rules, read_rule_records};
pub use crate::rules::{Rule, RuleSet, Symbol};
pub use crate::syntree::SynTree;
pub use crate::utils::{Err, GrammarError};

#[cfg(test)]
fn toy_rules() -> Vec<Rule> {
  read_rule_records("1.0\tNN\tbarrier\n1.0\tDT\ta\n1.0\tNP\tDT\tNN\n1.0\tS\tNP\n")
    .unwrap()
    .into_rules()
}

#[test]
fn test_records_to_tree() {
  let g = Grammar::from_rules(toy_rules()).unwrap();

  let parse = g.parse(&["a", "barrier"]).unwrap();
  assert_eq!(parse.tree.bracketed(), "(S (NP (DT a) (NN barrier)))");
  assert!((parse.prob - 1.0).abs() < 1e-12);
  assert_eq!(parse.to_string(), "(S (NP (DT a) (NN barrier)))\nprobability: 1");

  assert!(g.parse(&["barrier", "a"]).is_none());
}

#[test]
fn test_parses_are_sound() {
  let g: Grammar = r#"
    S  -> NP VP : 0.8;
    S  -> VP : 0.2;
    NP -> DT NN : 0.5;
    NP -> DT JJ NN : 0.2;
    NP -> NP PP : 0.3;
    VP -> VB NP : 0.6;
    VP -> VB NP PP : 0.3;
    VP -> VB : 0.1;
    PP -> IN NP;
    DT -> "the" : 0.7;
    DT -> "a" : 0.3;
    JJ -> "old";
    NN -> "man" : 0.4;
    NN -> "telescope" : 0.3;
    NN -> "hill" : 0.3;
    VB -> "saw" : 0.5;
    VB -> "left" : 0.5;
    IN -> "with" : 0.5;
    IN -> "on" : 0.5;
  "#
  .parse()
  .unwrap();

  let sentences = [
    "the man saw a hill",
    "the old man saw the man with a telescope",
    "saw the man on the hill with the telescope",
    "the man left",
    "left",
  ];
  for sentence in sentences {
    let input = sentence.split(' ').collect::<Vec<_>>();
    let parse = g
      .parse(&input)
      .unwrap_or_else(|| panic!("no parse for {}", sentence));
    let words = parse.tree.words();
    assert_eq!(words.len(), input.len(), "{}", sentence);
    assert!(words.iter().zip(input.iter()).all(|(w, i)| w.as_str() == *i));
    assert!(parse.prob > 0.0 && parse.prob <= 1.0);
  }

  assert!(g.parse(&["the", "man", "saw", "a", "zebra"]).is_none());
}

#[test]
fn test_grammar_is_shareable() {
  fn assert_send_sync<T: Send + Sync>() {}
  assert_send_sync::<Grammar>();

  let g = Grammar::from_rules(toy_rules()).unwrap();
  std::thread::scope(|scope| {
    for _ in 0..4 {
      scope.spawn(|| assert!(g.parse(&["a", "barrier"]).is_some()));
    }
  });
}
