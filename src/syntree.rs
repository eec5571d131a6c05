use std::fmt;

#[derive(Debug, PartialEq, Clone)]
pub struct Constituent<T> {
  pub value: T,
  pub span: (usize, usize),
}

impl<T> fmt::Display for Constituent<T>
where
  T: fmt::Display,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}..{}: {}", self.span.0, self.span.1, self.value)
  }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Word<U> {
  pub value: U,
  pub span: (usize, usize),
}

impl<U> fmt::Display for Word<U>
where
  U: fmt::Display,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}..{}: {}", self.span.0, self.span.1, self.value)
  }
}

/// A parse tree. A preterminal (`DT -> a`) is a branch with a single leaf child;
/// binary rules give branches with two children and unit productions give
/// branches with one branch child.
#[derive(Debug, PartialEq, Clone)]
pub enum SynTree<T, U> {
  Branch(Constituent<T>, Vec<SynTree<T, U>>),
  Leaf(Word<U>),
}

impl<T, U> SynTree<T, U> {
  /// `tag` over the single word `word` at `pos`
  pub fn preterminal(tag: T, word: U, pos: usize) -> Self {
    let span = (pos, pos + 1);
    Self::Branch(
      Constituent { value: tag, span },
      vec![Self::Leaf(Word { value: word, span })],
    )
  }

  pub fn branch(tag: T, children: Vec<SynTree<T, U>>) -> Self {
    let start = children.first().map_or(0, |c| c.span().0);
    let end = children.last().map_or(start, |c| c.span().1);
    Self::Branch(
      Constituent {
        value: tag,
        span: (start, end),
      },
      children,
    )
  }

  pub fn span(&self) -> (usize, usize) {
    match self {
      Self::Branch(c, _) => c.span,
      Self::Leaf(w) => w.span,
    }
  }

  pub fn is_leaf(&self) -> bool {
    matches!(self, Self::Leaf(_))
  }

  pub fn is_branch(&self) -> bool {
    matches!(self, Self::Branch(_, _))
  }

  pub fn get_leaf(&self) -> Option<&Word<U>> {
    match self {
      Self::Leaf(w) => Some(w),
      _ => None,
    }
  }

  pub fn get_branch(&self) -> Option<(&Constituent<T>, &Vec<SynTree<T, U>>)> {
    match self {
      Self::Branch(c, cs) => Some((c, cs)),
      _ => None,
    }
  }

  /// The leaves of the tree, left to right
  pub fn words(&self) -> Vec<&U> {
    let mut words = Vec::new();
    self.collect_words(&mut words);
    words
  }

  fn collect_words<'a>(&'a self, words: &mut Vec<&'a U>) {
    match self {
      Self::Leaf(w) => words.push(&w.value),
      Self::Branch(_, children) => {
        for child in children.iter() {
          child.collect_words(words);
        }
      }
    }
  }

  pub fn depth(&self) -> usize {
    match self {
      Self::Leaf(_) => 0,
      Self::Branch(_, children) => 1 + children.iter().map(Self::depth).max().unwrap_or(0),
    }
  }
}

impl<T, U> SynTree<T, U>
where
  T: fmt::Display,
  U: fmt::Display,
{
  /// Span-free bracketed form, e.g. `(S (NP (DT a) (NN barrier)))`
  pub fn bracketed(&self) -> String {
    let mut out = String::new();
    self.write_bracketed(&mut out);
    out
  }

  fn write_bracketed(&self, out: &mut String) {
    match self {
      Self::Leaf(w) => out.push_str(&w.value.to_string()),
      Self::Branch(c, children) => {
        out.push('(');
        out.push_str(&c.value.to_string());
        for child in children.iter() {
          out.push(' ');
          child.write_bracketed(out);
        }
        out.push(')');
      }
    }
  }
}

impl<T, U> fmt::Display for SynTree<T, U>
where
  T: fmt::Display,
  U: fmt::Display,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Leaf(t) => write!(f, "{}", t),
      Self::Branch(t, ts) => {
        write!(f, "({}", t)?;
        if ts.len() == 1 && ts[0].is_leaf() {
          write!(f, " ({}))", ts[0])
        } else {
          for t in ts.iter() {
            let fmt = format!("{}", t);
            for line in fmt.lines() {
              write!(f, "\n  {}", line)?;
            }
          }
          write!(f, ")")
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn a_barrier() -> SynTree<&'static str, &'static str> {
    SynTree::branch(
      "S",
      vec![SynTree::branch(
        "NP",
        vec![
          SynTree::preterminal("DT", "a", 0),
          SynTree::preterminal("NN", "barrier", 1),
        ],
      )],
    )
  }

  #[test]
  fn test_bracketed() {
    assert_eq!(a_barrier().bracketed(), "(S (NP (DT a) (NN barrier)))");
  }

  #[test]
  fn test_spans_and_words() {
    let t = a_barrier();
    assert_eq!(t.span(), (0, 2));
    assert_eq!(t.words(), vec![&"a", &"barrier"]);
    assert_eq!(t.depth(), 3);
    assert!(t.is_branch());
    let (cons, children) = t.get_branch().unwrap();
    assert_eq!(cons.value, "S");
    assert_eq!(children.len(), 1);
  }

  #[test]
  fn test_display() {
    let t = SynTree::branch(
      "NP",
      vec![
        SynTree::preterminal("DT", "a", 0),
        SynTree::preterminal("NN", "barrier", 1),
      ],
    );
    assert_eq!(
      t.to_string(),
      "(0..2: NP\n  (0..1: DT (0..1: a))\n  (1..2: NN (1..2: barrier)))"
    );
  }
}
