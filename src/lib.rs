//! # esolang
//! Resumable interpreters for three small esoteric languages.
//!
//! * [`brainfuck`]: the classic eight-instruction tape machine.
//! * [`shorto`]: a stack machine over numbers and text, with literal text
//!   output, code blocks and named jump markers.
//! * [`chess`]: a tape machine programmed in algebraic chess notation.
//!
//! [`weird`] only tokenizes: it turns a line-oriented data language into
//! commands of typed tokens with variables numbered and constants resolved.
//!
//! The three interpreters share one [`vm::Engine`]. The engine never blocks: it runs a
//! bounded slice of instructions per call, parks when the program asks for
//! input and picks up where it left off once the host delivers a key press.
//!
//! ```
//! use esolang::brainfuck::Brainfuck;
//! use esolang::vm::{Engine, EngineOptions, EngineState, Step};
//!
//! let mut engine = Engine::new(Brainfuck, EngineOptions::default());
//! engine.run("++++++++[>++++++++<-]>+.");
//! assert_eq!(engine.run_until_blocked(), Step::Done(EngineState::Completed));
//! assert_eq!(engine.output(), "A");
//! ```
pub mod brainfuck;
pub mod chess;
pub mod config;
pub mod console;
pub mod input;
pub mod parser;
pub mod program;
pub mod shorto;
pub mod tape;
pub mod vm;
pub mod weird;
