//! Conversion of arbitrary weighted rules into chomsky normal form.
//!
//! Rules with more than two right hand symbols are folded from the left: all
//! but the last symbol collapse into a synthetic nonterminal whose name joins
//! the collapsed symbols, so `A -> B C D` becomes `A -> B-C D` plus
//! `B-C -> B C`. Afterwards every left hand side is renormalized so its rules
//! form a probability distribution again.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::rules::{Rule, Symbol};
use crate::utils::GrammarError;

pub const DEFAULT_SEPARATOR: &str = "-";

#[derive(Debug, Clone)]
pub struct Binarizer {
  separator: String,
}

impl Default for Binarizer {
  fn default() -> Self {
    Self::with_separator(DEFAULT_SEPARATOR)
  }
}

/// Binarize and renormalize `rules` with the default `-` separator.
pub fn binarize(rules: Vec<Rule>) -> Result<Vec<Rule>, GrammarError> {
  Binarizer::default().binarize(rules)
}

/// Bookkeeping for the synthetic symbols introduced during one binarization run.
struct Synthetics<'a> {
  separator: &'a str,
  /// every symbol seen so far, original or synthetic
  known: HashSet<Symbol>,
  /// every (lhs, rhs) pair that exists or has been queued
  registry: HashSet<(Symbol, Vec<Symbol>)>,
  /// collapsed sequence -> the synthetic symbol standing in for it
  names: HashMap<Vec<Symbol>, Symbol>,
  introduced: usize,
}

impl<'a> Synthetics<'a> {
  fn new(separator: &'a str, rules: &[Rule]) -> Self {
    let mut known = HashSet::new();
    let mut registry = HashSet::new();
    for rule in rules {
      known.insert(rule.symbol.clone());
      known.extend(rule.productions.iter().cloned());
      registry.insert((rule.symbol.clone(), rule.productions.clone()));
    }

    Self {
      separator,
      known,
      registry,
      names: HashMap::new(),
      introduced: 0,
    }
  }

  /// Name for the symbol standing in for `collapsed`. The joined name is used
  /// unless some other symbol already owns it, in which case a `~N` suffix is
  /// added until it's free.
  fn name_for(&mut self, collapsed: &[Symbol]) -> Symbol {
    if let Some(name) = self.names.get(collapsed) {
      return name.clone();
    }

    let base = collapsed
      .iter()
      .map(Symbol::as_str)
      .collect::<Vec<_>>()
      .join(self.separator);

    let mut candidate = Symbol::new(base.clone());
    let mut suffix = 0;
    // a source rule that already spells out this exact expansion can be shared
    while self.known.contains(&candidate)
      && !self
        .registry
        .contains(&(candidate.clone(), collapsed.to_vec()))
    {
      suffix += 1;
      candidate = Symbol::new(format!("{}~{}", base, suffix));
    }

    self.known.insert(candidate.clone());
    self.names.insert(collapsed.to_vec(), candidate.clone());
    candidate
  }

  /// Registers `lhs -> rhs`, returning false if it was already there.
  fn register(&mut self, lhs: &Symbol, rhs: &[Symbol]) -> bool {
    let fresh = self.registry.insert((lhs.clone(), rhs.to_vec()));
    if fresh {
      self.introduced += 1;
    }
    fresh
  }
}

impl Binarizer {
  /// `separator` joins the collapsed symbols when naming a synthetic nonterminal.
  /// It should not occur inside any source symbol name.
  pub fn with_separator(separator: impl Into<String>) -> Self {
    Self {
      separator: separator.into(),
    }
  }

  pub fn separator(&self) -> &str {
    &self.separator
  }

  /// Rewrites `rules` into chomsky normal form and renormalizes them per left
  /// hand side. Unit productions (`A -> B`) are left alone.
  ///
  /// The output order is deterministic: rules come out in the order they are
  /// popped off the worklist, which starts as `rules` and is consumed from the
  /// end.
  pub fn binarize(&self, rules: Vec<Rule>) -> Result<Vec<Rule>, GrammarError> {
    if let Some(rule) = rules.iter().find(|r| r.is_empty()) {
      return Err(GrammarError::EmptyRhs {
        lhs: rule.symbol_str().to_string(),
      });
    }

    let input_len = rules.len();
    let mut synthetics = Synthetics::new(&self.separator, &rules);
    let mut worklist = rules;
    let mut cnf = Vec::with_capacity(worklist.len());

    while let Some(rule) = worklist.pop() {
      if rule.len() <= 2 {
        cnf.push(rule);
        continue;
      }

      let Rule {
        symbol,
        mut productions,
        prob,
        ..
      } = rule;
      // len > 2, so there is always a last symbol and at least two before it
      let last = productions.split_off(productions.len() - 1);
      let collapsed = productions;

      let synthetic = synthetics.name_for(&collapsed);
      if synthetics.register(&synthetic, &collapsed) {
        // a structural re-expansion, not a real choice: weight 1 before renormalizing
        worklist.push(Rule::new(synthetic.clone(), collapsed, 1.0));
      }

      let mut binary = vec![synthetic];
      binary.extend(last);
      cnf.push(Rule::new(symbol, binary, prob));
    }

    debug!(
      input = input_len,
      synthetic = synthetics.introduced,
      output = cnf.len(),
      "binarized grammar"
    );

    renormalize(cnf)
  }
}

/// Divides each rule's probability by the total mass of its left hand side.
pub fn renormalize(mut rules: Vec<Rule>) -> Result<Vec<Rule>, GrammarError> {
  let mut mass: HashMap<Symbol, f64> = HashMap::new();
  for rule in rules.iter() {
    *mass.entry(rule.symbol.clone()).or_insert(0.0) += rule.prob;
  }

  for rule in rules.iter_mut() {
    let total = mass[&rule.symbol];
    if !(total.is_finite() && total > 0.0) {
      return Err(GrammarError::Normalization {
        symbol: rule.symbol_str().to_string(),
      });
    }
    rule.prob /= total;
  }

  Ok(rules)
}
