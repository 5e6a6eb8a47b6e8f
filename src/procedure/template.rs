//! Placeholder substitution for step instructions.
//!
//! Supported forms:
//! - `${name}` - braced placeholder
//! - `$name`   - bare placeholder
//! - `$$`      - a literal `$`
//!
//! Any other use of `$` is a malformed template.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;

use super::error::{ProcedureError, ProcedureResult};
use super::state::State;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$(?:(\$)|([_A-Za-z][_A-Za-z0-9]*)|\{([_A-Za-z][_A-Za-z0-9]*)\}|())")
        .expect("placeholder pattern is valid")
});

/// A `$` that does not start a valid placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid placeholder at line {line}, column {column}")]
pub struct InvalidPlaceholder {
    pub line: usize,
    pub column: usize,
}

impl InvalidPlaceholder {
    fn at(template: &str, offset: usize) -> Self {
        let before = &template[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |nl| nl + 1);
        let column = before[line_start..].chars().count() + 1;
        Self { line, column }
    }
}

/// A single parsed placeholder occurrence.
enum Token<'a> {
    Escaped,
    Named(&'a str),
}

fn classify<'a>(template: &'a str, caps: &Captures<'a>) -> Result<Token<'a>, InvalidPlaceholder> {
    if caps.get(1).is_some() {
        return Ok(Token::Escaped);
    }
    if let Some(name) = caps.get(2).or_else(|| caps.get(3)) {
        return Ok(Token::Named(name.as_str()));
    }
    let offset = caps.get(0).map_or(0, |m| m.start());
    Err(InvalidPlaceholder::at(template, offset))
}

/// List the keys referenced by a template, in order of appearance.
pub fn placeholders(template: &str) -> Result<Vec<&str>, InvalidPlaceholder> {
    let mut names = Vec::new();
    for caps in PLACEHOLDER.captures_iter(template) {
        if let Token::Named(name) = classify(template, &caps)? {
            names.push(name);
        }
    }
    Ok(names)
}

/// Substitute every placeholder in `template` with the textual form of its
/// state value.
///
/// `step` names the step being rendered and is carried into errors. Unknown
/// keys fail with `MissingStateKey`; malformed placeholders fail with
/// `RenderFailure`. Nothing is left unsubstituted.
pub fn substitute(template: &str, state: &State, step: &str) -> ProcedureResult<String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&template[last..whole.start()]);

        match classify(template, &caps) {
            Ok(Token::Escaped) => out.push('$'),
            Ok(Token::Named(name)) => out.push_str(&state.require(name, step)?.to_string()),
            Err(invalid) => {
                return Err(ProcedureError::RenderFailure {
                    step: step.to_string(),
                    message: invalid.to_string(),
                });
            }
        }

        last = whole.end();
    }

    out.push_str(&template[last..]);
    Ok(out)
}
