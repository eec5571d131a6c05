use std::borrow::Borrow;
use std::fmt;

/// A grammar symbol. Terminals and nonterminals share a namespace: identity is
/// plain string equality, and whether a symbol is a terminal depends on how the
/// grammar uses it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
  pub name: String,
}

impl Symbol {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into() }
  }

  pub fn as_str(&self) -> &str {
    &self.name
  }
}

impl Borrow<str> for Symbol {
  fn borrow(&self) -> &str {
    &self.name
  }
}

impl From<&str> for Symbol {
  fn from(name: &str) -> Self {
    Self::new(name)
  }
}

impl fmt::Display for Symbol {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name)
  }
}

/// A weighted production `symbol -> productions : prob`.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
  pub symbol: Symbol,
  pub productions: Vec<Symbol>,
  pub prob: f64,
  /// The single right hand symbol was written as a word (quoted), so it is
  /// never read as a unit production even if it names a nonterminal.
  pub word: bool,
}

impl Rule {
  pub fn new(symbol: Symbol, productions: Vec<Symbol>, prob: f64) -> Self {
    Self {
      symbol,
      productions,
      prob,
      word: false,
    }
  }

  /// `symbol -> "word" : prob`
  pub fn word(symbol: &str, word: &str, prob: f64) -> Self {
    Self {
      word: true,
      ..Self::new(Symbol::new(symbol), vec![Symbol::new(word)], prob)
    }
  }

  /// Shorthand mostly for tests: `Rule::from_strs("NP", &["DT", "NN"], 0.5)`
  pub fn from_strs(symbol: &str, productions: &[&str], prob: f64) -> Self {
    Self::new(
      Symbol::new(symbol),
      productions.iter().map(|p| Symbol::new(*p)).collect(),
      prob,
    )
  }

  pub fn len(&self) -> usize {
    self.productions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// One or two right hand symbols
  pub fn is_cnf(&self) -> bool {
    (1..=2).contains(&self.len())
  }

  pub fn is_binary(&self) -> bool {
    self.len() == 2
  }

  pub fn symbol_str(&self) -> &str {
    self.symbol.as_str()
  }
}

impl fmt::Display for Rule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ->", self.symbol)?;
    for p in self.productions.iter() {
      if self.word {
        write!(f, " {:?}", p.name)?;
      } else {
        write!(f, " {}", p)?;
      }
    }
    write!(f, " : {}", self.prob)
  }
}

/// An ordered list of rules, as read from a rule file or grammar source.
/// Order matters: it decides which derivation wins a probability tie.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleSet(pub Vec<Rule>);

impl RuleSet {
  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
    self.0.iter()
  }

  pub fn into_rules(self) -> Vec<Rule> {
    self.0
  }
}

impl From<Vec<Rule>> for RuleSet {
  fn from(rules: Vec<Rule>) -> Self {
    Self(rules)
  }
}

impl IntoIterator for RuleSet {
  type Item = Rule;
  type IntoIter = std::vec::IntoIter<Rule>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.into_iter()
  }
}

impl fmt::Display for RuleSet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for rule in self.0.iter() {
      writeln!(f, "{}", rule)?;
    }
    Ok(())
  }
}
