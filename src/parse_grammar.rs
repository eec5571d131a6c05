//! Readers for the two rule formats: tab-separated rule records, and arrow
//! notation for grammars written inline.
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::rules::{Rule, RuleSet, Symbol};
use crate::utils::{Err, GrammarError};

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: Regex = Regex::new($pattern).unwrap();
    }
  };
}

regex_static!(FIELD_SEP, r"\s+");
regex_static!(PROB, r"^(\d+\.?\d*|\.\d+)([eE][-+]?\d+)?$");

fn parse_prob(s: &str) -> Result<f64, String> {
  if !PROB.is_match(s) {
    return Err(format!("bad probability {:?}", s));
  }
  s.parse::<f64>()
    .ok()
    .filter(|p| p.is_finite())
    .ok_or_else(|| format!("bad probability {:?}", s))
}

/// Reads rule records, one per line:
///
/// ```text
/// 0.5	NP	DT	NN
/// 1.0	DT	the
/// ```
///
/// The probability comes first, then the left hand side, then one or more
/// right hand symbols. Fields are separated by tabs (any run of whitespace is
/// accepted). Blank lines and lines starting with `//` are skipped.
pub fn read_rule_records(s: &str) -> Result<RuleSet, GrammarError> {
  let mut rules = Vec::new();
  for (idx, line) in s.lines().enumerate() {
    let line = line.trim();
    if line.is_empty() || line.starts_with("//") {
      continue;
    }

    let fields = FIELD_SEP.split(line).collect::<Vec<_>>();
    if fields.len() < 3 {
      return Err(GrammarError::input_format(
        idx + 1,
        format!(
          "expected probability, lhs and at least one rhs symbol, got {:?}",
          line
        ),
      ));
    }

    let prob = parse_prob(fields[0]).map_err(|e| GrammarError::input_format(idx + 1, e))?;
    rules.push(Rule::new(
      Symbol::new(fields[1]),
      fields[2..].iter().map(|f| Symbol::new(*f)).collect(),
      prob,
    ));
  }
  Ok(RuleSet(rules))
}

/// Reads a rule record file, see [`read_rule_records`].
pub fn read_rule_file(path: impl AsRef<Path>) -> Result<RuleSet, Err> {
  let path = path.as_ref();
  let src = fs::read_to_string(path)
    .map_err(|e| -> Err { format!("{}: {}", path.display(), e).into() })?;
  read_rule_records(&src).map_err(|e| -> Err { format!("{}: {}", path.display(), e).into() })
}

/// Reads a lexicon and a grammar file and returns their rules in that order,
/// ready to be binarized together.
pub fn load_rules(lexicon: impl AsRef<Path>, grammar: impl AsRef<Path>) -> Result<RuleSet, Err> {
  let mut rules = read_rule_file(lexicon)?.into_rules();
  rules.extend(read_rule_file(grammar)?);
  Ok(RuleSet(rules))
}

/// Where a parse failed, and why. `at` is the unconsumed input.
struct Failure<'a> {
  message: String,
  at: &'a str,
}

type Infallible<'a, T> = (T, &'a str);
type ParseResult<'a, T> = Result<(T, &'a str), Failure<'a>>;

fn fail<'a, T>(message: impl Into<String>, at: &'a str) -> ParseResult<'a, T> {
  Err(Failure {
    message: message.into(),
    at,
  })
}

/// Try to consume a regex, returning None if it doesn't match
fn optional_re<'a>(re: &'static Regex, s: &'a str) -> Infallible<'a, Option<&'a str>> {
  match re.find(s) {
    Some(m) if m.start() == 0 => {
      let (_, rest) = s.split_at(m.end());
      (Some(m.as_str()), rest)
    }
    _ => (None, s),
  }
}

/// Try to consume a regex, failing if it doesn't match
fn needed_re<'a>(re: &'static Regex, what: &str, s: &'a str) -> ParseResult<'a, &'a str> {
  if let (Some(c), rest) = optional_re(re, s) {
    Ok((c, rest))
  } else {
    fail(format!("expected {}", what), s)
  }
}

/// Try to consume a char, returning None if it doesn't match
fn optional_char(c: char, s: &str) -> Infallible<'_, Option<char>> {
  match s.strip_prefix(c) {
    Some(rest) => (Some(c), rest),
    None => (None, s),
  }
}

/// Tries to skip whitespace and `//` comments
fn skip_whitespace(s: &str) -> &str {
  regex_static!(WHITESPACE_OR_COMMENT, r"(\s|//[^\n]*)+");
  optional_re(&*WHITESPACE_OR_COMMENT, s).1
}

/// A symbol name: anything up to whitespace or one of `;:"`
fn parse_name(s: &str) -> ParseResult<'_, &str> {
  regex_static!(NAME, r#"[^\s;:"]+"#);
  needed_re(&*NAME, "symbol name", s)
}

/// A right hand symbol: a quoted word or a bare name. The flag is set for words.
fn parse_production(s: &str) -> ParseResult<'_, (Symbol, bool)> {
  regex_static!(QUOTED, r#""[^"\n]*""#);
  if let (Some(quoted), rest) = optional_re(&*QUOTED, s) {
    Ok(((Symbol::new(&quoted[1..quoted.len() - 1]), true), rest))
  } else {
    let (name, rest) = parse_name(s)?;
    Ok(((Symbol::new(name), false), rest))
  }
}

/// `LHS -> productions [: prob];`
fn parse_rule(s: &str) -> ParseResult<'_, Rule> {
  #![allow(clippy::trivial_regex)]
  regex_static!(ARROW, "->");
  regex_static!(NUMBER, r"[^\s;]+");

  let (name, s) = parse_name(s)?;
  let s = skip_whitespace(s);
  let (_, s) = needed_re(&*ARROW, "->", s)?;

  let mut productions = Vec::new();
  let mut quoted = false;
  let mut rem = s;
  let prob = loop {
    rem = skip_whitespace(rem);
    if let (Some(_), s) = optional_char(';', rem) {
      rem = s;
      break 1.0;
    }
    if let (Some(_), s) = optional_char(':', rem) {
      let s = skip_whitespace(s);
      let (number, s) = needed_re(&*NUMBER, "probability", s)?;
      let prob = match parse_prob(number) {
        Ok(prob) => prob,
        Err(e) => return fail(e, s),
      };
      let s = skip_whitespace(s);
      let (semi, s) = optional_char(';', s);
      if semi.is_none() {
        return fail("expected ;", s);
      }
      rem = s;
      break prob;
    }
    if rem.is_empty() {
      return fail("unterminated rule", rem);
    }
    let ((prod, word), s) = parse_production(rem)?;
    productions.push(prod);
    quoted = word;
    rem = s;
  };

  if productions.is_empty() {
    return fail(format!("rule for {} has no right hand side", name), rem);
  }

  let word = quoted && productions.len() == 1;
  let mut rule = Rule::new(Symbol::new(name), productions, prob);
  rule.word = word;
  Ok((rule, rem))
}

fn parse_rules(s: &str) -> ParseResult<'_, Vec<Rule>> {
  let mut rules = Vec::new();
  let mut rem = s;
  loop {
    rem = skip_whitespace(rem);
    if rem.is_empty() {
      return Ok((rules, rem));
    }
    let (rule, s) = parse_rule(rem)?;
    rules.push(rule);
    rem = s;
  }
}

impl FromStr for RuleSet {
  type Err = GrammarError;

  /// Parses arrow notation:
  ///
  /// ```text
  /// // comments run to the end of the line
  /// S  -> NP VP : 0.9;
  /// S  -> VP : 0.1;
  /// NP -> DT NN;            // probability defaults to 1
  /// DT -> "the";            // quoted symbols are words
  /// ```
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match parse_rules(s) {
      Ok((rules, _)) => Ok(Self(rules)),
      Err(Failure { message, at }) => {
        let consumed = &s[..s.len() - at.len()];
        let line = consumed.matches('\n').count() + 1;
        Err(GrammarError::input_format(line, message))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_read_records() {
    let rules = read_rule_records("1.0\tDT\tthe\n\n// comment\n0.25\tS\tNP\tVP\tPP\n").unwrap();
    assert_eq!(
      rules,
      RuleSet(vec![
        Rule::from_strs("DT", &["the"], 1.0),
        Rule::from_strs("S", &["NP", "VP", "PP"], 0.25),
      ])
    );
  }

  #[test]
  fn test_read_records_keeps_odd_tags() {
    let rules = read_rule_records("0.5\tPRP$\ther\n1\t,\t,\n").unwrap();
    assert_eq!(rules.0[0].symbol_str(), "PRP$");
    assert_eq!(rules.0[1].productions[0].as_str(), ",");
  }

  #[test]
  fn test_read_records_errors() {
    assert_eq!(
      read_rule_records("1.0\tDT\tthe\nDT\tthe\tNN\n").unwrap_err(),
      GrammarError::input_format(2, "bad probability \"DT\"")
    );
    assert!(matches!(
      read_rule_records("0.5\tNP\n"),
      Err(GrammarError::InputFormat { line: 1, .. })
    ));
    assert!(read_rule_records("-1\tA\tb\n").is_err());
    assert!(read_rule_records("nan\tA\tb\n").is_err());
  }

  #[test]
  fn test_arrow_notation() {
    let rules: RuleSet = r#"
      // toy grammar
      S -> NP VP : 0.9;
      S -> VP : .1; // imperative
      NP -> DT NN;
      DT -> "the" : 1e0;
    "#
    .parse()
    .unwrap();

    assert_eq!(
      rules,
      RuleSet(vec![
        Rule::from_strs("S", &["NP", "VP"], 0.9),
        Rule::from_strs("S", &["VP"], 0.1),
        Rule::from_strs("NP", &["DT", "NN"], 1.0),
        Rule::word("DT", "the", 1.0),
      ])
    );
  }

  #[test]
  fn test_quoted_symbols_are_words() {
    let rules: RuleSet = r#"X -> "S"; X -> S; Y -> "a" B;"#.parse().unwrap();
    assert!(rules.0[0].word);
    assert!(!rules.0[1].word);
    assert!(!rules.0[2].word);
    assert_eq!(rules.0[0].productions, rules.0[1].productions);
  }

  #[test]
  fn test_arrow_notation_errors() {
    let err = "S -> NP VP;\nNP -> ;\n".parse::<RuleSet>().unwrap_err();
    assert!(matches!(err, GrammarError::InputFormat { line: 2, .. }), "{}", err);

    let err = "S -> NP VP : high;".parse::<RuleSet>().unwrap_err();
    assert!(matches!(err, GrammarError::InputFormat { line: 1, .. }));

    assert!("S NP VP;".parse::<RuleSet>().is_err());
    assert!("S -> NP VP".parse::<RuleSet>().is_err());
  }

  #[test]
  fn test_load_rules() {
    let dir = std::env::temp_dir().join(format!("pcky-load-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let lexicon = dir.join("lexicon.txt");
    let grammar = dir.join("grammar.txt");
    fs::write(&lexicon, "1.0\tDT\ta\n1.0\tNN\tbarrier\n").unwrap();
    fs::write(&grammar, "1.0\tNP\tDT\tNN\n1.0\tS\tNP\n").unwrap();

    let rules = load_rules(&lexicon, &grammar).unwrap();
    assert_eq!(rules.len(), 4);
    assert_eq!(rules.0[0].symbol_str(), "DT");
    assert_eq!(rules.0[3].symbol_str(), "S");

    assert!(load_rules(dir.join("missing.txt"), &grammar).is_err());
    fs::remove_dir_all(&dir).unwrap();
  }
}
