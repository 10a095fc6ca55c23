//! Textual normalization that runs before the lexer.
//!
//! Comments are dropped and every literal `()` is rewritten to `nil`.
//! The scan knows nothing about string literals, so a `()` written
//! inside a string is rewritten as well.

use crate::error::CoreError;

const LINE_COMMENT: &str = ";";
const BLOCK_COMMENT_START: &str = "#|";
const BLOCK_COMMENT_END: &str = "|#";
const EMPTY_LIST: &str = "()";
const NIL: &str = "nil";

pub fn preprocess(source: &str) -> Result<String, CoreError> {
    let mut output = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(ch) = rest.chars().next() {
        if rest.starts_with(LINE_COMMENT) {
            // The line break stays so the tokens around the comment
            // remain separated.
            rest = match rest.find('\n') {
                Some(end) => &rest[end..],
                None => "",
            };
        } else if let Some(body) = rest.strip_prefix(BLOCK_COMMENT_START) {
            let end = body.find(BLOCK_COMMENT_END).ok_or_else(|| {
                CoreError::PreprocessError(format!(
                    "unterminated block comment starting at byte {}",
                    source.len() - rest.len()
                ))
            })?;
            rest = &body[end + BLOCK_COMMENT_END.len()..];
        } else if let Some(after) = rest.strip_prefix(EMPTY_LIST) {
            output.push_str(NIL);
            rest = after;
        } else {
            output.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
    }

    Ok(output)
}
