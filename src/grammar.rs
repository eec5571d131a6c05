use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::binarize::binarize;
use crate::cyk::{parse, Parse};
use crate::rules::{Rule, RuleSet, Symbol};
use crate::utils::{Err, GrammarError};

pub const DEFAULT_START: &str = "S";

/// `lhs -> left right`, with every symbol replaced by its nonterminal index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryRule {
  pub lhs: usize,
  pub left: usize,
  pub right: usize,
  pub prob: f64,
}

/// A unit production `lhs -> child` between two nonterminals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnaryRule {
  pub lhs: usize,
  pub child: usize,
  pub prob: f64,
}

/// A CNF rule set compiled for chart parsing. Every nonterminal gets a dense
/// index (in order of first appearance), so the chart can be a flat array.
///
/// Rule order is preserved within every index: it decides which of several
/// equally likely derivations the parser keeps.
#[derive(Debug, Clone)]
pub struct Grammar {
  start: Symbol,
  rules: Vec<Rule>,
  nonterminals: Vec<Symbol>,
  index: HashMap<Symbol, usize>,
  /// binary rules grouped by lhs index
  binary: Vec<Vec<BinaryRule>>,
  unary: Vec<UnaryRule>,
  /// token -> (nonterminal, prob), only the first rule for each pair
  lexical: HashMap<String, Vec<(usize, f64)>>,
}

impl fmt::Display for Grammar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "//** start: {}", self.start)?;
    write!(f, "//** nonterminals:")?;
    for nt in self.nonterminals.iter() {
      write!(f, " {}", nt)?;
    }
    writeln!(f)?;

    for rule in self.rules.iter() {
      writeln!(f, "{}", rule)?;
    }

    Ok(())
  }
}

impl Grammar {
  /// Indexes a rule set that is already in chomsky normal form (see
  /// [`crate::binarize`]). Rules with more than two right hand symbols are
  /// rejected, not rewritten.
  ///
  /// Every one-symbol rule is a lexical rule, matched against input words by
  /// name. If its symbol is the left hand side of some other rule and wasn't
  /// written as a word, it is also a unit production.
  pub fn new(rules: Vec<Rule>) -> Result<Self, GrammarError> {
    for rule in rules.iter() {
      if rule.is_empty() {
        return Err(GrammarError::EmptyRhs {
          lhs: rule.symbol_str().to_string(),
        });
      } else if !rule.is_cnf() {
        return Err(GrammarError::NotCnf {
          rule: rule.to_string(),
        });
      }
    }

    let heads = rules.iter().map(|r| &r.symbol).collect::<HashSet<_>>();
    let is_unit = |r: &Rule| {
      r.len() == 1
        && !r.word
        && r.productions[0] != r.symbol
        && heads.contains(&r.productions[0])
    };

    let mut nonterminals = Vec::new();
    let mut index = HashMap::new();
    let mut intern = |s: &Symbol| -> usize {
      *index.entry(s.clone()).or_insert_with(|| {
        nonterminals.push(s.clone());
        nonterminals.len() - 1
      })
    };

    let mut binary_flat = Vec::new();
    let mut unary = Vec::new();
    let mut lexical_flat = Vec::new();
    for rule in rules.iter() {
      let lhs = intern(&rule.symbol);
      if rule.is_binary() {
        let left = intern(&rule.productions[0]);
        let right = intern(&rule.productions[1]);
        binary_flat.push(BinaryRule {
          lhs,
          left,
          right,
          prob: rule.prob,
        });
      } else {
        lexical_flat.push((lhs, rule.productions[0].name.clone(), rule.prob));
        if is_unit(rule) {
          let child = intern(&rule.productions[0]);
          unary.push(UnaryRule {
            lhs,
            child,
            prob: rule.prob,
          });
        }
      }
    }

    let mut binary = vec![Vec::new(); nonterminals.len()];
    for rule in binary_flat {
      binary[rule.lhs].push(rule);
    }

    let mut lexical: HashMap<String, Vec<(usize, f64)>> = HashMap::new();
    for (lhs, token, prob) in lexical_flat {
      let entries = lexical.entry(token).or_default();
      if !entries.iter().any(|(nt, _)| *nt == lhs) {
        entries.push((lhs, prob));
      }
    }

    Ok(Self {
      start: Symbol::new(DEFAULT_START),
      rules,
      nonterminals,
      index,
      binary,
      unary,
      lexical,
    })
  }

  /// Binarizes and renormalizes `rules`, then indexes the result.
  pub fn from_rules(rules: Vec<Rule>) -> Result<Self, GrammarError> {
    Self::new(binarize(rules)?)
  }

  /// Use `start` instead of `S` as the symbol a whole sentence must derive from.
  pub fn with_start(mut self, start: impl Into<String>) -> Self {
    self.start = Symbol::new(start);
    self
  }

  pub fn start(&self) -> &Symbol {
    &self.start
  }

  pub fn start_index(&self) -> Option<usize> {
    self.index_of(self.start.as_str())
  }

  pub fn rules(&self) -> &[Rule] {
    &self.rules
  }

  pub fn nonterminals(&self) -> &[Symbol] {
    &self.nonterminals
  }

  pub fn index_of(&self, symbol: &str) -> Option<usize> {
    self.index.get(symbol).copied()
  }

  pub fn symbol(&self, idx: usize) -> &Symbol {
    &self.nonterminals[idx]
  }

  /// Binary rules headed by nonterminal `lhs`, in rule order
  pub fn binary_rules(&self, lhs: usize) -> &[BinaryRule] {
    &self.binary[lhs]
  }

  pub fn unary_rules(&self) -> &[UnaryRule] {
    &self.unary
  }

  /// Nonterminals that can produce `token`, with the probability of doing so
  pub fn lexical_rules(&self, token: &str) -> &[(usize, f64)] {
    self.lexical.get(token).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn lexical_prob(&self, lhs: usize, token: &str) -> f64 {
    self
      .lexical_rules(token)
      .iter()
      .find(|(nt, _)| *nt == lhs)
      .map_or(0.0, |(_, p)| *p)
  }

  pub fn parse(&self, input: &[&str]) -> Option<Parse> {
    parse(input, self)
  }
}

impl FromStr for Grammar {
  type Err = Err;

  /// Reads arrow notation (see [`RuleSet`]), binarizes it, and indexes it.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let rules: RuleSet = s.parse()?;
    if rules.is_empty() {
      Err("empty ruleset".into())
    } else {
      Ok(Self::from_rules(rules.into_rules())?)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn toy() -> Grammar {
    Grammar::new(vec![
      Rule::from_strs("NN", &["barrier"], 1.0),
      Rule::from_strs("DT", &["a"], 1.0),
      Rule::from_strs("NP", &["DT", "NN"], 1.0),
      Rule::from_strs("S", &["NP"], 1.0),
    ])
    .unwrap()
  }

  #[test]
  fn test_indexing() {
    let g = toy();
    let names = g
      .nonterminals()
      .iter()
      .map(Symbol::as_str)
      .collect::<Vec<_>>();
    assert_eq!(names, vec!["NN", "DT", "NP", "S"]);

    let np = g.index_of("NP").unwrap();
    assert_eq!(
      g.binary_rules(np),
      &[BinaryRule {
        lhs: np,
        left: g.index_of("DT").unwrap(),
        right: g.index_of("NN").unwrap(),
        prob: 1.0
      }]
    );
    assert_eq!(g.unary_rules().len(), 1);
    assert_eq!(g.lexical_prob(g.index_of("DT").unwrap(), "a"), 1.0);
    assert_eq!(g.lexical_prob(g.index_of("NN").unwrap(), "a"), 0.0);
    assert!(g.lexical_rules("zebra").is_empty());
  }

  #[test]
  fn test_first_lexical_rule_wins() {
    let g = Grammar::new(vec![
      Rule::from_strs("NN", &["run"], 0.2),
      Rule::from_strs("NN", &["run"], 0.7),
      Rule::from_strs("VB", &["run"], 0.1),
    ])
    .unwrap();
    assert_eq!(g.lexical_prob(g.index_of("NN").unwrap(), "run"), 0.2);
    assert_eq!(g.lexical_rules("run").len(), 2);
  }

  #[test]
  fn test_one_symbol_rules_are_lexical() {
    let g = Grammar::new(vec![
      Rule::from_strs(",", &[","], 1.0),
      Rule::from_strs("S", &["NP"], 1.0),
      Rule::from_strs("NP", &["dogs"], 1.0),
    ])
    .unwrap();
    let comma = g.index_of(",").unwrap();
    let s = g.index_of("S").unwrap();

    assert_eq!(g.lexical_prob(comma, ","), 1.0);
    // S -> NP still matches a literal "NP" word, as well as being a unit production
    assert_eq!(g.lexical_prob(s, "NP"), 1.0);
    assert_eq!(
      g.unary_rules(),
      &[UnaryRule {
        lhs: s,
        child: g.index_of("NP").unwrap(),
        prob: 1.0
      }]
    );
  }

  #[test]
  fn test_quoted_word_is_not_a_unit_production() {
    let g: Grammar = r#"
      S -> X Y;
      X -> "S";
      Y -> "y";
    "#
    .parse()
    .unwrap();
    assert!(g.unary_rules().is_empty());

    let parse = g.parse(&["S", "y"]).unwrap();
    assert_eq!(parse.tree.bracketed(), "(S (X S) (Y y))");

    let g: Grammar = "S -> X Y; X -> S; Y -> \"y\";".parse().unwrap();
    assert_eq!(g.unary_rules().len(), 1);
  }

  #[test]
  fn test_rejects_non_cnf() {
    let err = Grammar::new(vec![Rule::from_strs("A", &["B", "C", "D"], 1.0)]).unwrap_err();
    assert_eq!(
      err,
      GrammarError::NotCnf {
        rule: "A -> B C D : 1".to_string()
      }
    );
  }

  #[test]
  fn test_from_rules_binarizes() {
    let g = Grammar::from_rules(vec![Rule::from_strs("S", &["A", "B", "C"], 1.0)]).unwrap();
    assert!(g.index_of("A-B").is_some());
    assert!(g.rules().iter().all(Rule::is_cnf));
  }

  #[test]
  fn test_start_symbol() {
    let g = toy();
    assert_eq!(g.start().as_str(), "S");
    assert_eq!(g.start_index(), g.index_of("S"));

    let g = g.with_start("ROOT");
    assert_eq!(g.start_index(), None);
  }

  #[test]
  fn test_from_str() {
    let g: Grammar = r#"
      S -> NP VP;
      NP -> "dogs";
      VP -> "bark";
    "#
    .parse()
    .unwrap();
    assert_eq!(g.rules().len(), 3);
    assert!("   ".parse::<Grammar>().is_err());
  }
}
