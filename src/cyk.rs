use std::fmt;

use tracing::{debug, trace};

use crate::grammar::Grammar;
use crate::rules::Symbol;
use crate::syntree::SynTree;

/// How a chart cell got its probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backpointer {
  #[default]
  None,
  /// from a lexical rule over a single word
  Lexical,
  /// from `lhs -> left right`, with `left` covering `start..split`
  Binary {
    split: usize,
    left: usize,
    right: usize,
  },
  /// from a unit production `lhs -> child` over the same span
  Unary { child: usize },
}

/// Dense probabilistic CYK table: for every nonterminal and every span
/// `left..right` with `0 <= left < right <= n`, the best probability found so
/// far and the backpointer that produced it. Cells start at probability 0.
#[derive(Debug, Clone)]
pub struct Chart {
  words: usize,
  nonterminals: Vec<Symbol>,
  probs: Vec<f64>,
  backpointers: Vec<Backpointer>,
}

impl Chart {
  pub fn new(nonterminals: Vec<Symbol>, words: usize) -> Self {
    let size = nonterminals.len() * (words + 1) * (words + 1);
    Self {
      words,
      nonterminals,
      probs: vec![0.0; size],
      backpointers: vec![Backpointer::None; size],
    }
  }

  /// Number of words the chart spans
  pub fn len(&self) -> usize {
    self.words
  }

  pub fn is_empty(&self) -> bool {
    self.words == 0
  }

  pub fn nonterminals(&self) -> &[Symbol] {
    &self.nonterminals
  }

  fn cell(&self, nt: usize, left: usize, right: usize) -> usize {
    debug_assert!(left < right && right <= self.words, "bad span {}..{}", left, right);
    (nt * (self.words + 1) + left) * (self.words + 1) + right
  }

  pub fn prob(&self, nt: usize, left: usize, right: usize) -> f64 {
    self.probs[self.cell(nt, left, right)]
  }

  pub fn backpointer(&self, nt: usize, left: usize, right: usize) -> Backpointer {
    self.backpointers[self.cell(nt, left, right)]
  }

  /// Offers `prob` for `nt` over `left..right`. It is only taken if strictly
  /// better than what the cell holds, so a cell never decreases and the first
  /// of several equally good derivations is the one kept.
  pub fn relax(
    &mut self,
    nt: usize,
    left: usize,
    right: usize,
    prob: f64,
    backpointer: Backpointer,
  ) -> bool {
    let cell = self.cell(nt, left, right);
    if prob > self.probs[cell] {
      self.probs[cell] = prob;
      self.backpointers[cell] = backpointer;
      true
    } else {
      false
    }
  }
}

impl fmt::Display for Chart {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for len in 1..=self.words {
      for left in 0..=(self.words - len) {
        let right = left + len;
        writeln!(f, "Span {}..{}:", left, right)?;
        for (nt, symbol) in self.nonterminals.iter().enumerate() {
          let prob = self.prob(nt, left, right);
          if prob <= 0.0 {
            continue;
          }
          write!(f, "  {} {:e}", symbol, prob)?;
          match self.backpointer(nt, left, right) {
            Backpointer::Binary { split, left, right } => writeln!(
              f,
              " <- {} {} @{}",
              self.nonterminals[left], self.nonterminals[right], split
            )?,
            Backpointer::Unary { child } => writeln!(f, " <- {}", self.nonterminals[child])?,
            Backpointer::Lexical | Backpointer::None => writeln!(f)?,
          }
        }
      }
    }
    Ok(())
  }
}

/// The most likely parse of a sentence
#[derive(Debug, Clone, PartialEq)]
pub struct Parse {
  pub tree: SynTree<String, String>,
  pub prob: f64,
}

impl fmt::Display for Parse {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}\nprobability: {}", self.tree.bracketed(), self.prob)
  }
}

/// Applies unit productions to `left..right` until nothing improves. Strict
/// improvement means a cycle of probability <= 1 can't loop; the pass cap
/// covers grammars that were never renormalized.
fn close_unary(g: &Grammar, chart: &mut Chart, left: usize, right: usize) {
  let unary = g.unary_rules();
  for _ in 0..=unary.len() {
    let mut changed = false;
    for rule in unary {
      let prob = chart.prob(rule.child, left, right) * rule.prob;
      if chart.relax(
        rule.lhs,
        left,
        right,
        prob,
        Backpointer::Unary { child: rule.child },
      ) {
        trace!(lhs = %g.symbol(rule.lhs), left, right, prob, "unary improvement");
        changed = true;
      }
    }
    if !changed {
      return;
    }
  }
}

/// Fills a chart for `input` bottom-up, shortest spans first.
pub fn parse_chart(g: &Grammar, input: &[&str]) -> Chart {
  let n = input.len();
  let nts = g.nonterminals().len();
  let mut chart = Chart::new(g.nonterminals().to_vec(), n);
  if chart.is_empty() || nts == 0 {
    return chart;
  }

  for i in 1..=n {
    let word = input[i - 1];
    let lexical = g.lexical_rules(word);
    if lexical.is_empty() {
      trace!(word, pos = i - 1, "no lexical rule");
    }
    for &(nt, prob) in lexical {
      chart.relax(nt, i - 1, i, prob, Backpointer::Lexical);
    }
    close_unary(g, &mut chart, i - 1, i);

    // every span ending at i, from shortest to longest, so all shorter spans
    // are final before they're combined
    for j in (0..i.saturating_sub(1)).rev() {
      for k in (j + 1)..i {
        for lhs in 0..nts {
          for rule in g.binary_rules(lhs) {
            let left = chart.prob(rule.left, j, k);
            if left <= 0.0 {
              continue;
            }
            let prob = left * chart.prob(rule.right, k, i) * rule.prob;
            chart.relax(
              lhs,
              j,
              i,
              prob,
              Backpointer::Binary {
                split: k,
                left: rule.left,
                right: rule.right,
              },
            );
          }
        }
      }
      close_unary(g, &mut chart, j, i);
    }
  }

  chart
}

/// Follows backpointers from `nt` over `left..right`. `unary_budget` bounds
/// chains of unit productions over a single span.
fn build_tree(
  g: &Grammar,
  chart: &Chart,
  input: &[&str],
  nt: usize,
  left: usize,
  right: usize,
  unary_budget: usize,
) -> Option<SynTree<String, String>> {
  let tag = g.symbol(nt).name.clone();
  match chart.backpointer(nt, left, right) {
    Backpointer::None => None,
    Backpointer::Lexical => Some(SynTree::preterminal(tag, input[left].to_string(), left)),
    Backpointer::Binary {
      split,
      left: l,
      right: r,
    } => {
      let budget = g.nonterminals().len();
      let left_tree = build_tree(g, chart, input, l, left, split, budget)?;
      let right_tree = build_tree(g, chart, input, r, split, right, budget)?;
      Some(SynTree::branch(tag, vec![left_tree, right_tree]))
    }
    Backpointer::Unary { child } => {
      let budget = unary_budget.checked_sub(1)?;
      let child = build_tree(g, chart, input, child, left, right, budget)?;
      Some(SynTree::branch(tag, vec![child]))
    }
  }
}

/// Finds the most probable parse of `input` rooted at the grammar's start
/// symbol, or `None` if the grammar can't derive it.
pub fn parse(input: &[&str], g: &Grammar) -> Option<Parse> {
  if input.is_empty() {
    return None;
  }
  g.start_index()?;
  best_parse(g, &parse_chart(g, input), input)
}

/// Reads the best parse out of a chart already filled by [`parse_chart`] for
/// the same grammar and input.
pub fn best_parse(g: &Grammar, chart: &Chart, input: &[&str]) -> Option<Parse> {
  let n = input.len();
  if n == 0 || chart.len() != n || chart.nonterminals().is_empty() {
    return None;
  }
  let start = g.start_index()?;

  let prob = chart.prob(start, 0, n);
  debug!(words = n, prob, "read best parse from chart");
  if prob <= 0.0 {
    return None;
  }

  let tree = build_tree(g, chart, input, start, 0, n, g.nonterminals().len())?;
  Some(Parse { tree, prob })
}
