use std::{
    collections::VecDeque,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use esolang::{
    brainfuck::Brainfuck,
    chess::Chess,
    input::InputEvent,
    shorto::ShortO,
    vm::{Engine, EngineOptions, EngineState, Language, Observer, RunStats, Step},
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Lang {
    Brainfuck,
    ShortO,
    Chess,
    /// Print the tokens of a data-language script.
    Weird,
}

impl Lang {
    fn from_path(path: &Path) -> Option<Lang> {
        match path.extension()?.to_str()? {
            "bf" => Some(Lang::Brainfuck),
            "sho" => Some(Lang::ShortO),
            "chess" => Some(Lang::Chess),
            "weird" => Some(Lang::Weird),
            _ => None,
        }
    }
}

/// Run an esolang program. Input requests are answered from stdin.
#[derive(Parser, Debug)]
#[command()]
struct Args {
    /// File containing the program.
    #[arg()]
    file: PathBuf,
    /// Language of the program. Guessed from the extension (.bf, .sho, .chess, .weird) when omitted.
    #[arg(long, short = 'l', value_enum)]
    lang: Option<Lang>,
    /// Print statistics after running the program.
    #[arg(long, short = 's')]
    stats: bool,
    /// Wall-clock budget of one scheduling slice, in milliseconds.
    #[arg(long)]
    time_slice_ms: Option<u64>,
    /// Maximum number of instructions in one scheduling slice.
    #[arg(long)]
    step_budget: Option<u32>,
    /// Maximum stack size.
    #[arg(long, short = 'm')]
    max_stack_size: Option<usize>,
    /// Seed for the random number generator.
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn engine_options(&self) -> EngineOptions {
        let mut options = EngineOptions::default();
        if let Some(ms) = self.time_slice_ms {
            options = options.with_time_slice(Duration::from_millis(ms));
        }
        if let Some(budget) = self.step_budget {
            options = options.with_step_budget(budget);
        }
        if let Some(size) = self.max_stack_size {
            options = options.with_max_stack_size(size);
        }
        if let Some(seed) = self.seed {
            options = options.with_seed(seed);
        }
        options
    }
}

/// Streams program output to a writer, normally stdout.
///
/// The terminal already shows what the user typed, so a committed input line
/// that the program keeps in its output is not printed a second time.
struct Terminal<W> {
    out: W,
    committed: Option<String>,
    write_error: Option<io::Error>,
}

impl<W: Write> Terminal<W> {
    fn new(out: W) -> Self {
        Terminal { out, committed: None, write_error: None }
    }

    fn write(&mut self, text: &str) {
        if self.write_error.is_some() {
            return;
        }
        if let Err(err) = self.out.write_all(text.as_bytes()).and_then(|()| self.out.flush()) {
            self.write_error = Some(err);
        }
    }
}

impl<W: Write> Observer for Terminal<W> {
    fn output_appended(&mut self, text: &str) {
        if self.committed.take().as_deref() == Some(text) {
            return;
        }
        self.write(text);
    }

    fn output_truncated(&mut self, len: usize) {
        self.committed = None;
        debug!(len, "output truncated, printed text stays on screen");
    }

    fn output_cleared(&mut self) {
        self.committed = None;
        debug!("output cleared, printed text stays on screen");
    }

    fn input_committed(&mut self, line: &str, kept: bool) {
        self.committed = kept.then(|| line.to_string());
    }
}

/// Characters typed on stdin, a line at a time.
struct Keyboard<R> {
    reader: R,
    pending: VecDeque<char>,
}

impl<R: BufRead> Keyboard<R> {
    fn new(reader: R) -> Self {
        Keyboard { reader, pending: VecDeque::new() }
    }

    /// Next key, `None` at the end of input.
    fn next_key(&mut self) -> io::Result<Option<InputEvent>> {
        loop {
            if self.pending.is_empty() {
                let mut line = String::new();
                if self.reader.read_line(&mut line)? == 0 {
                    return Ok(None);
                }
                self.pending.extend(line.chars());
            }
            let Some(c) = self.pending.pop_front() else { continue };
            let event = match c {
                '\r' => continue,
                '\n' => InputEvent::Enter,
                '\t' => InputEvent::Tab,
                '\u{8}' | '\u{7f}' => InputEvent::Backspace,
                '\u{1b}' => InputEvent::Escape,
                c => InputEvent::Char(c),
            };
            return Ok(Some(event));
        }
    }
}

/// Runs the program until it ends, answering input requests from `keyboard`.
fn drive<L: Language, R: BufRead, W: Write>(
    engine: &mut Engine<L, Terminal<W>>,
    source: &str,
    keyboard: &mut Keyboard<R>,
) -> io::Result<()> {
    let mut step = engine.run(source);
    loop {
        step = match step {
            Step::Continue => engine.step(),
            Step::AwaitingInput(_) => match keyboard.next_key()? {
                Some(key) => engine.input(key),
                None => {
                    debug!("end of input, cancelling");
                    engine.cancel();
                    Step::Done(engine.state())
                }
            },
            Step::Done(_) => return Ok(()),
        };
    }
}

fn execute<L: Language>(language: L, source: &str, options: EngineOptions, stats: bool) -> anyhow::Result<()> {
    let mut engine = Engine::with_observer(language, options, Terminal::new(io::stdout()));
    let mut keyboard = Keyboard::new(io::stdin().lock());

    let start_time = Instant::now();
    drive(&mut engine, source, &mut keyboard)?;
    let elapsed = start_time.elapsed();

    if !engine.output().is_empty() && !engine.output().ends_with('\n') {
        engine.observer_mut().write("\n");
    }
    if let Some(err) = engine.observer_mut().write_error.take() {
        return Err(err).context("Failed to write program output");
    }
    if stats {
        print_stats(engine.stats(), elapsed);
    }

    match engine.state() {
        EngineState::Failed => bail!("{}", engine.console().error().unwrap_or("Program failed")),
        EngineState::Cancelled => bail!("Program cancelled"),
        _ => Ok(()),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let source = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let Some(lang) = args.lang.or_else(|| Lang::from_path(&args.file)) else {
        bail!("Cannot tell the language of {}, use --lang", args.file.display());
    };
    let options = args.engine_options();
    debug!(?lang, ?options, "starting");

    match lang {
        Lang::Brainfuck => execute(Brainfuck, &source, options, args.stats),
        Lang::ShortO => execute(ShortO::default(), &source, options, args.stats),
        Lang::Chess => execute(Chess, &source, options, args.stats),
        Lang::Weird => {
            let script = esolang::weird::tokenize(&source)?;
            print!("{script}");
            Ok(())
        }
    }
}

fn print_stats(stats: RunStats, elapsed: Duration) {
    let instructions_per_second = stats.instructions as f64 / elapsed.as_secs_f64();
    eprintln!("Run time: {:?}", elapsed);
    eprintln!(
        "Instructions executed: {} ({}/s)",
        stats.instructions,
        match instructions_per_second {
            n if n >= 1_000_000.0 => format!("{:.1}M", n / 1_000_000.0),
            n if n >= 1_000.0 => format!("{:.1}k", n / 1_000.0),
            n => format!("{:.1}", n),
        }
    );
    eprintln!("Scheduling slices: {}", stats.slices);
}
