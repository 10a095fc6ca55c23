//! The C++ runtime skeleton that generated code is spliced into.
//!
//! A template holds two placeholders: [`HEADER_PLACEHOLDER`] receives
//! the function definitions and [`BODY_PLACEHOLDER`] the top-level
//! statements. The bundled template lives in `runtime/runtime.hpp`.

use std::fs;
use std::path::Path;

use crate::error::CoreError;

pub const HEADER_PLACEHOLDER: &str = "$1";
pub const BODY_PLACEHOLDER: &str = "$2";

const BUNDLED_TEMPLATE: &str = include_str!("../runtime/runtime.hpp");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Runtime {
    template: String,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::bundled()
    }
}

impl Runtime {
    pub fn bundled() -> Self {
        Runtime {
            template: BUNDLED_TEMPLATE.to_string(),
        }
    }

    pub fn from_text(template: impl Into<String>) -> Result<Self, CoreError> {
        let template = template.into();
        for placeholder in [HEADER_PLACEHOLDER, BODY_PLACEHOLDER] {
            if !template.contains(placeholder) {
                return Err(CoreError::InvalidRuntime(format!(
                    "missing placeholder {placeholder}"
                )));
            }
        }
        Ok(Runtime { template })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let template =
            fs::read_to_string(path).map_err(|_| CoreError::MissingRuntime(path.to_path_buf()))?;
        Self::from_text(template)
    }

    #[cfg(test)]
    fn template(&self) -> &str {
        &self.template
    }

    /// Replace every placeholder of the template in a single pass.
    /// Inserted text is never scanned for placeholders itself.
    pub fn splice(&self, header: &str, body: &str) -> String {
        let mut out = String::with_capacity(self.template.len() + header.len() + body.len());
        let mut rest = self.template.as_str();
        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if let Some(after) = tail.strip_prefix(HEADER_PLACEHOLDER) {
                out.push_str(header);
                rest = after;
            } else if let Some(after) = tail.strip_prefix(BODY_PLACEHOLDER) {
                out.push_str(body);
                rest = after;
            } else {
                out.push('$');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}
