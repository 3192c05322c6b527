pub mod ast;
pub mod backend;
pub mod builtins;
pub mod config;
pub mod error;
pub mod java_stub;
pub mod lexer;
pub mod logging;
pub mod parser;
pub mod server;
pub mod token;
pub mod transpiler;

pub use backend::{Backend, Translation, backend, backends};
pub use config::{CaseConvention, Scoping, TranslateOptions};
pub use error::{Degradation, TranslateError};
pub use transpiler::Transpiler;
