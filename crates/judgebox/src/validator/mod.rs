//! Static validator: an execution-free pass/fail judgment for deployments without a browser
//! backend.
//!
//! Checks run in a fixed order and stop at the first finding:
//!
//! 1. syntax (after blanking pure import/export declarations)
//! 2. standalone calls outside the whitelist
//! 3. misspelled keywords (`awaits`, `expectt`)
//! 4. presence of at least one `test(`, `expect(` or `page.` reference
//! 5. dotted method calls outside the Playwright whitelist
//!
//! The checks are lexical. Call-like text inside strings or comments is scanned like code.

pub mod lexicon;
pub mod similarity;
pub mod syntax;

use crate::model::{ExecutionOutcome, ValidationFinding};
use lexicon::{
    GENERIC_METHODS, KNOWN_KEYWORDS, PLAYWRIGHT_METHODS, SENSITIVE_KEYWORDS, STANDALONE_WHITELIST,
};
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, error};

const IDENTIFIER: &str = r"[A-Za-z_$][\w$]*";
const METHOD_CALL: &str = r"\.([A-Za-z_$][\w$]*)\(";
const PLAUSIBLE_COMMAND: &str = r"\bexpect\s*\(|\btest\s*\(|\bpage\.";

struct Patterns {
    identifier: Regex,
    method_call: Regex,
    plausible: Regex,
    keyword_suffixes: Vec<(&'static str, Regex)>,
}

fn patterns() -> Option<&'static Patterns> {
    static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            let keyword_suffixes = SENSITIVE_KEYWORDS
                .iter()
                .map(|keyword| {
                    Regex::new(&format!(r"\b(?i:{keyword})[a-z]+\b")).map(|re| (*keyword, re))
                })
                .collect::<Result<Vec<_>, _>>()
                .ok()?;
            Some(Patterns {
                identifier: Regex::new(IDENTIFIER).ok()?,
                method_call: Regex::new(METHOD_CALL).ok()?,
                plausible: Regex::new(PLAUSIBLE_COMMAND).ok()?,
                keyword_suffixes,
            })
        })
        .as_ref()
}

/// Stateless validator. Cheap to construct; every call is independent.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticValidator;

impl StaticValidator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Run every check in order and return the first finding.
    ///
    /// # Errors
    /// The first [`ValidationFinding`] raised.
    pub fn validate(&self, source: &str) -> Result<(), ValidationFinding> {
        check_syntax(source)?;
        let Some(patterns) = patterns() else {
            return Err(ValidationFinding::ValidatorUnavailable);
        };
        check_standalone_calls(patterns, source)?;
        check_keyword_suffixes(patterns, source)?;
        check_plausible(patterns, source)?;
        check_methods(patterns, source)?;
        Ok(())
    }

    /// Judge `source` without executing it.
    #[must_use]
    pub fn evaluate(&self, source: &str) -> ExecutionOutcome {
        outcome_for(self.validate(source))
    }
}

fn outcome_for(result: Result<(), ValidationFinding>) -> ExecutionOutcome {
    match result {
        Err(finding @ ValidationFinding::ValidatorUnavailable) => {
            error!("static validator patterns failed to compile");
            ExecutionOutcome::Errored {
                message: finding.to_string(),
            }
        }
        Err(finding) => {
            debug!(finding = finding.kind(), "static validation failed");
            ExecutionOutcome::SimulatedRan {
                valid: false,
                diagnostic: render_diagnostic(Some(&finding)),
            }
        }
        Ok(()) => ExecutionOutcome::SimulatedRan {
            valid: true,
            diagnostic: render_diagnostic(None),
        },
    }
}

/// Human-readable log for a simulated run.
#[must_use]
pub fn render_diagnostic(finding: Option<&ValidationFinding>) -> String {
    let mut out = String::from(
        "Simulated run: no browser backend is configured, the script was checked statically and not executed.\n\n",
    );
    match finding {
        None => out.push_str("  ok   submission.spec.js passed all static checks\n\n  1 passed (static)\n"),
        Some(finding) => {
            out.push_str(&format!("  x    submission.spec.js\n\n    {finding}\n\n  1 failed (static)\n"));
        }
    }
    out
}

fn check_syntax(source: &str) -> Result<(), ValidationFinding> {
    let script = syntax::strip_module_declarations(source);
    syntax::check_script(&script).map_err(|issue| ValidationFinding::SyntaxError {
        message: issue.to_string(),
    })
}

fn check_standalone_calls(patterns: &Patterns, source: &str) -> Result<(), ValidationFinding> {
    for m in patterns.identifier.find_iter(source) {
        let before = source.get(..m.start()).unwrap_or_default();
        if before
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
        {
            continue;
        }
        if before.trim_end().ends_with('.') {
            continue;
        }
        let after = source.get(m.end()..).unwrap_or_default();
        if !after.starts_with('(') {
            continue;
        }

        let name = m.as_str();
        if name.starts_with(|c: char| c.is_ascii_uppercase()) {
            continue;
        }
        if STANDALONE_WHITELIST.contains(&name) {
            continue;
        }
        return Err(ValidationFinding::UnknownStandaloneFunction {
            name: name.to_string(),
            suggestion: similarity::closest(name, KNOWN_KEYWORDS).map(str::to_string),
        });
    }
    Ok(())
}

fn check_keyword_suffixes(patterns: &Patterns, source: &str) -> Result<(), ValidationFinding> {
    for (keyword, re) in &patterns.keyword_suffixes {
        for line in source.lines() {
            if let Some(found) = re.find(line) {
                return Err(ValidationFinding::UnknownKeyword {
                    found: found.as_str().to_string(),
                    suggestion: (*keyword).to_string(),
                });
            }
        }
    }
    Ok(())
}

fn check_plausible(patterns: &Patterns, source: &str) -> Result<(), ValidationFinding> {
    if patterns.plausible.is_match(source) {
        Ok(())
    } else {
        Err(ValidationFinding::NoRecognizedCommands)
    }
}

fn check_methods(patterns: &Patterns, source: &str) -> Result<(), ValidationFinding> {
    for caps in patterns.method_call.captures_iter(source) {
        let Some(name) = caps.get(1).map(|m| m.as_str()) else {
            continue;
        };
        if GENERIC_METHODS.contains(&name) || PLAYWRIGHT_METHODS.contains(&name) {
            continue;
        }
        let suggestion = PLAYWRIGHT_METHODS
            .iter()
            .find(|method| method.eq_ignore_ascii_case(name))
            .copied()
            .or_else(|| similarity::closest(name, PLAYWRIGHT_METHODS));
        return Err(ValidationFinding::UnknownMethod {
            name: name.to_string(),
            suggestion: suggestion.map(str::to_string),
        });
    }
    Ok(())
}
