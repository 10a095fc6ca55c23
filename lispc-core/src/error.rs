use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to read source: {0}")]
    SourceIo(#[from] std::io::Error),
    #[error("runtime template was not found at {0}")]
    MissingRuntime(PathBuf),
    #[error("invalid runtime template: {0}")]
    InvalidRuntime(String),
    #[error("preprocess error: {0}")]
    PreprocessError(String),
    #[error("lex error at byte {position}: could not lex {found:?}")]
    LexError { position: usize, found: String },
    #[error("unexpected token: {0}")]
    UnexpectedToken(String),
    #[error("invalid literal: {0}")]
    InvalidLiteral(String),
    #[error("symbol not found: {0}")]
    SymbolNotFound(String),
    #[error("symbol already defined: {0}")]
    DuplicateSymbol(String),
    #[error("function '{0}' cannot be used as a value")]
    UnexpectedFunctionValue(String),
    #[error("'{0}' is not a function")]
    UnexpectedFunctionUse(String),
    #[error("unexpected keyword: {0}")]
    UnexpectedKeyword(String),
    #[error("unexpected form: {0}")]
    UnexpectedForm(String),
    #[error("invalid function name in defun: {0}")]
    InvalidFunctionName(String),
    #[error("invalid parameter list in defun '{0}'")]
    InvalidParameterList(String),
    #[error("invalid binding in let: {0}")]
    InvalidBinding(String),
}
