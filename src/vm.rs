//! The resumable execution engine shared by all languages.
//!
//! An [`Engine`] never blocks. [`Engine::run`] parses a program and returns
//! [`Step::Continue`]; the host then calls [`Engine::step`] whenever it gets a
//! chance, and [`Engine::input`] for every key press. Each call does a bounded
//! amount of work and reports what the engine needs next.
use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use rand::{rngs::StdRng, SeedableRng};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::{
    config::get_config,
    console::{Console, ConsoleEvent},
    input::{Feed, InputEvent, InputMode, InputValue, Suspension},
    parser::ParseError,
    program::Program,
    shorto::ValueKind,
};


/// An error that can occur while executing a single instruction.
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperationError {
    #[error("There is no value to pop from stack")]
    PopFailed,
    #[error("Adding to a full stack")]
    PushFailed,
    #[error("No marker for \"{name}\" detected")]
    UnknownMarker { name: String },
    #[error("Unknown operator `{symbol}`")]
    UnknownOperator { symbol: char },
    #[error("Jump target {target} is outside of the program")]
    JumpOutOfRange { target: i64 },
    #[error("Result of {left} {operator} {right} would be too long ({requested} characters)")]
    TextTooLong { operator: char, left: ValueKind, right: ValueKind, requested: u64 },
    #[error("No start of loop")]
    MissingLoopStart,
    #[error("No move left to use as a parameter")]
    MissingParameter,
    #[error("Expected a move as a parameter, found `{token}`")]
    InvalidParameter { token: String },
    #[error("The game does not have a result")]
    MissingResult,
    #[error("Input of this kind cannot be used here")]
    UnexpectedInput,
}

/// An error that ended a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// A specific instruction failed.
    #[error("{error} at Instruction {position} (Runtime)\n[{instruction}]")]
    InstructionFailed {
        /// Textual form of the failing instruction.
        instruction: String,
        /// 1-based index of the instruction in the token sequence.
        position: usize,
        error: OperationError,
    },
}

/// What an executed instruction asks of the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    None,
    /// End the current scheduling slice; used after jumps.
    Yield,
    /// Park until the host delivers input.
    Input(InputMode),
    /// Stop successfully.
    Halt,
}

/// Everything an instruction may touch.
pub struct Context<'a, L: Language + ?Sized> {
    pub program: &'a mut Program<L::Token>,
    pub state: &'a mut L::State,
    pub console: &'a mut Console,
    pub rng: &'a mut StdRng,
}

/// A language front-end: a tokenizer plus per-token semantics.
///
/// Implementations hold only read-only data (such as an operator registry),
/// so one value can back any number of engines.
pub trait Language {
    type Token: Clone + fmt::Display + fmt::Debug;
    type State: fmt::Debug;

    const NAME: &'static str;
    /// Whether a committed input line stays in the output.
    const KEEPS_COMMITTED_INPUT: bool = true;

    fn tokenize(&self, source: &str) -> Result<Program<Self::Token>, ParseError>;

    fn new_state(&self, options: &EngineOptions) -> Self::State;

    fn execute(&self, token: &Self::Token, ctx: &mut Context<'_, Self>) -> Result<Effect, OperationError>;

    /// Stores a committed input value into the runtime state.
    fn accept_input(&self, state: &mut Self::State, value: InputValue) -> Result<(), OperationError>;

    /// Called when the instruction pointer moves past the last token.
    fn finish(&self, _state: &Self::State) -> Result<(), OperationError> {
        Ok(())
    }

    /// The character a key stands for when the program reads a single
    /// character. Keys mapped to `None` are ignored.
    fn char_for_key(event: InputEvent) -> Option<char> {
        event.as_char()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Suspended(InputMode),
    Completed,
    Failed,
    Cancelled,
}

impl EngineState {
    /// A program is loaded and has not ended yet.
    pub fn is_active(self) -> bool {
        matches!(self, EngineState::Running | EngineState::Suspended(_))
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineState::Idle => write!(f, "idle"),
            EngineState::Running => write!(f, "running"),
            EngineState::Suspended(_) => write!(f, "waiting for input"),
            EngineState::Completed => write!(f, "completed"),
            EngineState::Failed => write!(f, "failed"),
            EngineState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// What the host should do after a call into the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Call [`Engine::step`] again on the next opportunity.
    Continue,
    /// Deliver key presses through [`Engine::input`].
    AwaitingInput(InputMode),
    /// The run is over (or none was started).
    Done(EngineState),
}

/// Receives notifications about a running program.
///
/// Every method has an empty default, implement only what you need.
pub trait Observer {
    fn output_appended(&mut self, _text: &str) {}
    /// Output was shortened to `len` characters.
    fn output_truncated(&mut self, _len: usize) {}
    fn output_cleared(&mut self) {}
    fn echo_changed(&mut self, _echo: &str) {}
    /// A typed line was committed; `kept` tells whether it was appended to the output.
    fn input_committed(&mut self, _line: &str, _kept: bool) {}
    fn error(&mut self, _message: &str) {}
    fn state_changed(&mut self, _state: EngineState) {}
}

/// An [`Observer`] that ignores everything.
#[derive(Default, Debug, Clone, Copy)]
pub struct NoObserver {}

impl Observer for NoObserver {}

/// A flag that stops an engine before its next instruction.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Options for an [`Engine`].
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    /// Wall-clock budget of one [`Engine::step`] call.
    pub time_slice: Duration,
    /// Maximum number of instructions per [`Engine::step`] call.
    pub step_budget: u32,
    /// Maximum number of values on a stack machine's stack.
    pub max_stack_size: usize,
    /// Seed for the random operators; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        let config = get_config();
        EngineOptions {
            time_slice: config.time_slice,
            step_budget: config.step_budget,
            max_stack_size: config.max_stack_size,
            seed: None,
        }
    }
}

impl EngineOptions {
    pub fn with_time_slice(mut self, time_slice: Duration) -> Self {
        self.time_slice = time_slice;
        self
    }

    pub fn with_step_budget(mut self, step_budget: u32) -> Self {
        self.step_budget = step_budget.max(1);
        self
    }

    pub fn with_max_stack_size(mut self, max_stack_size: usize) -> Self {
        self.max_stack_size = max_stack_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

/// Counters of the current or last run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Number of instructions executed.
    pub instructions: u64,
    /// Number of [`Engine::step`] calls made while running.
    pub slices: u64,
}

/// Per-run data, dropped as soon as the run ends.
struct ActiveRun<L: Language> {
    program: Program<L::Token>,
    state: L::State,
    suspension: Option<Suspension>,
}

pub struct Engine<L: Language, O: Observer = NoObserver> {
    language: L,
    options: EngineOptions,
    observer: O,
    console: Console,
    active: Option<ActiveRun<L>>,
    state: EngineState,
    rng: StdRng,
    cancel: CancelHandle,
    stats: RunStats,
}

impl<L: Language> Engine<L, NoObserver> {
    pub fn new(language: L, options: EngineOptions) -> Self {
        Self::with_observer(language, options, NoObserver::default())
    }
}

impl<L: Language, O: Observer> Engine<L, O> {
    pub fn with_observer(language: L, options: EngineOptions, observer: O) -> Self {
        let rng = options.rng();
        Engine {
            language,
            options,
            observer,
            console: Console::new(),
            active: None,
            state: EngineState::Idle,
            rng,
            cancel: CancelHandle::default(),
            stats: RunStats::default(),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn language(&self) -> &L {
        &self.language
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn output(&self) -> &str {
        self.console.output()
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Runtime state (stack, tape) of the active run.
    pub fn runtime_state(&self) -> Option<&L::State> {
        self.active.as_ref().map(|run| &run.state)
    }

    /// Index of the next instruction of the active run.
    pub fn instruction_pointer(&self) -> Option<usize> {
        self.active.as_ref().map(|run| run.program.pc())
    }

    /// A handle that can stop this engine from outside, e.g. from a key handler.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Starts `source` from scratch, discarding any active run.
    pub fn run(&mut self, source: &str) -> Step {
        if self.active.take().is_some() {
            debug!(language = L::NAME, "restarting, previous run discarded");
        }
        self.cancel.reset();
        self.stats = RunStats::default();
        if self.options.seed.is_some() {
            self.rng = self.options.rng();
        }
        self.console.reset();
        self.flush_console();

        match self.language.tokenize(source) {
            Ok(mut program) => {
                program.reset();
                debug!(
                    language = L::NAME,
                    tokens = program.len(),
                    markers = program.markers().len(),
                    "program parsed"
                );
                let state = self.language.new_state(&self.options);
                self.active = Some(ActiveRun { program, state, suspension: None });
                self.set_state(EngineState::Running);
                Step::Continue
            }
            Err(error) => {
                self.fail(RunError::Parse(error));
                Step::Done(EngineState::Failed)
            }
        }
    }

    /// Executes instructions until the slice budget runs out or the program
    /// stops, suspends or yields.
    pub fn step(&mut self) -> Step {
        if self.cancel.is_cancelled() {
            self.cancel();
            return self.status();
        }
        if self.state != EngineState::Running {
            return self.status();
        }
        self.stats.slices += 1;

        let started = Instant::now();
        let mut executed: u32 = 0;
        loop {
            if self.cancel.is_cancelled() {
                self.cancel();
                return self.status();
            }
            let Some(run) = self.active.as_mut() else {
                return self.status();
            };

            let position = run.program.pc();
            let Some(token) = run.program.advance() else {
                let result = self.language.finish(&run.state);
                let last = run.program.tokens().last().map(|t| t.to_string()).unwrap_or_default();
                match result {
                    Ok(()) => self.complete(),
                    Err(error) => self.fail(RunError::InstructionFailed {
                        instruction: last,
                        position: position.max(1),
                        error,
                    }),
                }
                return self.status();
            };

            trace!(language = L::NAME, ip = position, %token, "executing");
            let result = {
                let mut ctx = Context {
                    program: &mut run.program,
                    state: &mut run.state,
                    console: &mut self.console,
                    rng: &mut self.rng,
                };
                self.language.execute(&token, &mut ctx)
            };
            self.stats.instructions += 1;
            self.flush_console();

            match result {
                Err(error) => {
                    self.fail(RunError::InstructionFailed {
                        instruction: token.to_string(),
                        position: position + 1,
                        error,
                    });
                    return self.status();
                }
                Ok(Effect::None) => {}
                Ok(Effect::Yield) => return Step::Continue,
                Ok(Effect::Input(mode)) => {
                    if let Some(run) = self.active.as_mut() {
                        run.suspension = Some(Suspension::new(mode));
                    }
                    self.set_state(EngineState::Suspended(mode));
                    return self.status();
                }
                Ok(Effect::Halt) => {
                    self.complete();
                    return self.status();
                }
            }

            executed += 1;
            if executed >= self.options.step_budget || started.elapsed() >= self.options.time_slice {
                return Step::Continue;
            }
        }
    }

    /// Delivers one key press. Escape cancels an active run; other keys only
    /// matter while the program waits for input.
    pub fn input(&mut self, event: InputEvent) -> Step {
        if self.cancel.is_cancelled() || (event == InputEvent::Escape && self.state.is_active()) {
            self.cancel();
            return self.status();
        }
        let EngineState::Suspended(mode) = self.state else {
            return self.status();
        };
        if mode == InputMode::Char && L::char_for_key(event).is_none() {
            return self.status();
        }
        let Some(run) = self.active.as_mut() else {
            return self.status();
        };
        let Some(suspension) = run.suspension.as_mut() else {
            return self.status();
        };

        let feed = suspension.feed(event, &mut self.console);
        let Feed::Commit(value) = feed else {
            self.flush_console();
            return self.status();
        };

        if matches!(mode, InputMode::Line(_)) {
            self.console.commit_echo(L::KEEPS_COMMITTED_INPUT);
        }
        run.suspension = None;
        let result = self.language.accept_input(&mut run.state, value);
        let position = run.program.pc();
        let instruction = position
            .checked_sub(1)
            .and_then(|i| run.program.tokens().get(i))
            .map(|t| t.to_string())
            .unwrap_or_default();
        self.flush_console();

        if let Err(error) = result {
            self.fail(RunError::InstructionFailed { instruction, position, error });
            return self.status();
        }
        self.set_state(EngineState::Running);
        self.step()
    }

    /// Stops the active run immediately. Uncommitted input disappears from the console.
    pub fn cancel(&mut self) {
        self.cancel.reset();
        if self.active.take().is_none() {
            return;
        }
        self.console.discard_echo();
        self.flush_console();
        debug!(language = L::NAME, instructions = self.stats.instructions, "run cancelled");
        self.set_state(EngineState::Cancelled);
    }

    /// Empties the output on the host's request.
    pub fn clear_output(&mut self) {
        self.console.clear();
        self.flush_console();
    }

    /// Calls [`Engine::step`] until the engine stops asking for it.
    pub fn run_until_blocked(&mut self) -> Step {
        loop {
            match self.step() {
                Step::Continue => continue,
                other => return other,
            }
        }
    }

    fn status(&self) -> Step {
        match self.state {
            EngineState::Running => Step::Continue,
            EngineState::Suspended(mode) => Step::AwaitingInput(mode),
            state => Step::Done(state),
        }
    }

    fn complete(&mut self) {
        self.active = None;
        debug!(language = L::NAME, instructions = self.stats.instructions, "run completed");
        self.set_state(EngineState::Completed);
    }

    fn fail(&mut self, error: RunError) {
        let message = error.to_string();
        warn!(language = L::NAME, "run failed: {message}");
        self.active = None;
        self.console.discard_echo();
        self.console.set_error(message.clone());
        self.flush_console();
        self.observer.error(&message);
        self.set_state(EngineState::Failed);
    }

    fn set_state(&mut self, state: EngineState) {
        if self.state == state {
            return;
        }
        debug!(language = L::NAME, from = %self.state, to = %state, "state changed");
        self.state = state;
        self.observer.state_changed(state);
    }

    fn flush_console(&mut self) {
        for event in self.console.drain_events() {
            match event {
                ConsoleEvent::Appended(text) => self.observer.output_appended(&text),
                ConsoleEvent::Truncated { len } => self.observer.output_truncated(len),
                ConsoleEvent::Cleared => self.observer.output_cleared(),
                ConsoleEvent::EchoChanged(echo) => self.observer.echo_changed(&echo),
                ConsoleEvent::Committed { line, kept } => self.observer.input_committed(&line, kept),
            }
        }
    }
}
