//! Core of the lispc toolchain: a small Lisp compiled to C++.
//!
//! The pipeline is:
//!
//!   source .lisp
//!     -> preprocess (comments dropped, `()` -> `nil`)
//!     -> lexer      (tokens)
//!     -> parser     (AST)
//!     -> generator  (C++ header + body, resolved through scopes)
//!     -> runtime    (spliced into the C++ runtime skeleton)
//!
//! Invoking the native compiler on the result is left to the callers
//! (see the `lispc-cli` crate).

// ---------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------

pub mod error;

// ---------------------------------------------------------------------
// Front-end: preprocessing, lexing and parsing
// ---------------------------------------------------------------------

pub mod preprocess;
pub mod lexer;
pub mod parser;
pub mod ast;

// ---------------------------------------------------------------------
// Back-end: scopes, code generation and the runtime skeleton
// ---------------------------------------------------------------------

pub mod scope;
pub mod generator;
pub mod runtime;
pub mod compiler;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use compiler::{CompilationArtifact, compile, compile_file};
pub use error::CoreError;
pub use generator::{FunctionSymbol, generate};
pub use runtime::Runtime;
