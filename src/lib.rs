//! Semantic middle-end for a contract-oriented language compiling to
//! WebAssembly: a typed AST, a name/type checker with constant folding,
//! and a control-flow IR that feeds a code generator.
//!
//! The pipeline is [`ast`] (produced by an external parser) → [`checker`]
//! (name resolution, typing, constant folding) → [`ir`] (basic-block
//! lowering) → [`codegen`] (an embedder-supplied [`codegen::CodeGen`]).

pub mod ast;
pub mod checker;
pub mod codegen;
pub mod error;
pub mod ir;
pub mod meta;
pub mod scope;
pub mod value;

pub use checker::{Checker, CheckerConfig, ReservedSignature, check_program};
pub use codegen::CodeGen;
pub use error::{Error, ErrorKind};
pub use ir::{BasicBlock, Branch, IrBuilder};
pub use scope::Scope;
