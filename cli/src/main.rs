use std::env;
use std::io;
use std::io::Write;
use std::process;

use tracing::info;
use tracing_subscriber::EnvFilter;

use pcky::{best_parse, load_rules, parse_chart, Err, Grammar};

fn usage(prog_name: &str) -> String {
  format!(
    r"Usage: {} LEXICON GRAMMAR [options] [SENTENCE...]

Reads tab-separated rule records (probability, lhs, rhs...) from LEXICON and
GRAMMAR, binarizes them, and prints the most probable parse of each SENTENCE.
Without sentences, reads them from stdin.

Options:
  -h, --help        Print this message
  -c, --chart       Print the parse chart (defaults to not printing)
  -r, --rules       Print the binarized grammar before parsing
  -s, --start SYM   Start symbol (defaults to S)

Set RUST_LOG=debug for binarization and parsing logs.",
    prog_name
  )
}

fn parse(g: &Grammar, sentence: &str, print_chart: bool) {
  let sentence = sentence.split_whitespace().collect::<Vec<_>>();
  if sentence.is_empty() {
    return;
  }

  let chart = parse_chart(g, &sentence);
  if print_chart {
    println!("chart:\n{}", chart);
  }

  match best_parse(g, &chart, &sentence) {
    Some(parse) => {
      println!("{}", parse.tree.bracketed());
      println!("probability: {:e}", parse.prob);
    }
    None => println!("no parse"),
  }
  println!();
}

struct Args {
  lexicon: String,
  grammar: String,
  start: Option<String>,
  sentences: Vec<String>,
  print_chart: bool,
  print_rules: bool,
}

impl Args {
  fn make_error_message(msg: &str, prog_name: impl AsRef<str>) -> String {
    format!("argument error: {}.\n\n{}", msg, usage(prog_name.as_ref()))
  }

  fn parse(v: Vec<String>) -> Result<Self, String> {
    if v.is_empty() {
      return Err(Self::make_error_message("bad argument vector", "pcky"));
    }

    let mut iter = v.into_iter();
    let prog_name = iter.next().unwrap_or_else(|| "pcky".to_string());

    let mut files: Vec<String> = Vec::new();
    let mut sentences = Vec::new();
    let mut start = None;
    let mut print_chart = false;
    let mut print_rules = false;

    while let Some(o) = iter.next() {
      if o == "-h" || o == "--help" {
        println!("{}", usage(&prog_name));
        process::exit(0);
      } else if o == "-c" || o == "--chart" {
        print_chart = true;
      } else if o == "-r" || o == "--rules" {
        print_rules = true;
      } else if o == "-s" || o == "--start" {
        match iter.next() {
          Some(sym) => start = Some(sym),
          None => return Err(Self::make_error_message("missing start symbol", prog_name)),
        }
      } else if o.starts_with('-') {
        return Err(Self::make_error_message(
          &format!("unknown option {}", o),
          prog_name,
        ));
      } else if files.len() < 2 {
        files.push(o);
      } else {
        sentences.push(o);
      }
    }

    let mut files = files.into_iter();
    match (files.next(), files.next()) {
      (Some(lexicon), Some(grammar)) => Ok(Self {
        lexicon,
        grammar,
        start,
        sentences,
        print_chart,
        print_rules,
      }),
      _ => Err(Self::make_error_message(
        "need a lexicon and a grammar file",
        prog_name,
      )),
    }
  }
}

fn main() -> Result<(), Err> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(io::stderr)
    .init();

  let opts = match Args::parse(env::args().collect()) {
    Ok(opts) => opts,
    Err(msg) => {
      eprintln!("{}", msg);
      process::exit(255);
    }
  };

  let rules = load_rules(&opts.lexicon, &opts.grammar)?;
  info!(rules = rules.len(), "loaded rule files");
  let mut g = Grammar::from_rules(rules.into_rules())?;
  if let Some(start) = opts.start {
    g = g.with_start(start);
  }

  if opts.print_rules {
    println!("{}", g);
  }

  if !opts.sentences.is_empty() {
    for sentence in opts.sentences.iter() {
      parse(&g, sentence, opts.print_chart);
    }
    return Ok(());
  }

  let mut input = String::new();
  loop {
    print!("> ");
    io::stdout().flush()?;

    match io::stdin().read_line(&mut input) {
      Ok(_) => {
        if input.is_empty() {
          // ctrl+d
          return Ok(());
        }
        parse(&g, input.trim(), opts.print_chart);
        input.clear();
      }
      Err(error) => return Err(error.into()),
    }
  }
}
