// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config diagnostics rendered with miette.
//!
//! Figment errors are turned into [`ConfigError`]s that point at the
//! offending line of the TOML file when it can be found, list the keys the
//! section accepts and suggest the closest one (Jaro-Winkler).

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler score for a "did you mean" hint.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration problem, ready to be rendered.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key that no section declares.
    #[error("unknown configuration key `{key}` in {section}")]
    #[diagnostic(
        code(tollgate::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// `[egress]`-style section name, or "the top level".
        section: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("not a recognized key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value of the wrong TOML type.
    #[error("invalid type for `{key}`: found {found}")]
    #[diagnostic(code(tollgate::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        found: String,
        expected: String,
        #[label("wrong type")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A required key is absent.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(tollgate::config::missing_key),
        help("add `{key} = <value>` to tollgate.toml")
    )]
    MissingKey { key: String },

    /// A value that parsed but makes no sense, e.g. a zero timeout.
    #[error("validation error: {message}")]
    #[diagnostic(code(tollgate::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(tollgate::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert every error carried by `err` into a [`ConfigError`].
///
/// `toml_sources` holds `(path, content)` pairs used to locate source spans.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let section: Vec<String> = error.path.clone();
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let (span, src) = locate(&error, &section, field, toml_sources);
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        section: section_label(&section),
                        suggestion: suggest_key(field, expected),
                        valid_keys: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::MissingField(field) => ConfigError::MissingKey {
                    key: dotted(&section, field),
                },
                Kind::InvalidType(found, expected) => {
                    let (parent, field) = match section.split_last() {
                        Some((field, parent)) => (parent.to_vec(), field.clone()),
                        None => (Vec::new(), String::new()),
                    };
                    let (span, src) = locate(&error, &parent, &field, toml_sources);
                    ConfigError::InvalidType {
                        key: section.join("."),
                        found: found.to_string(),
                        expected: expected.clone(),
                        span,
                        src,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn section_label(path: &[String]) -> String {
    if path.is_empty() {
        "the top level".to_string()
    } else {
        format!("[{}]", path.join("."))
    }
}

fn dotted(path: &[String], field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{}.{field}", path.join("."))
    }
}

/// Span of `field` under `path` in whichever file the error came from.
fn locate(
    error: &figment::error::Error,
    path: &[String],
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    if field.is_empty() {
        return (None, None);
    }

    let origin = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(p) => Some(p.display().to_string()),
            _ => None,
        });
    // Inline sources carry no file metadata; fall back to the only source.
    let source = match origin {
        Some(origin) => toml_sources.iter().find(|(p, _)| *p == origin),
        None if toml_sources.len() == 1 => toml_sources.first(),
        None => None,
    };

    let Some((name, content)) = source else {
        return (None, None);
    };
    match find_key_offset(content, path, field) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), field.len())),
            Some(NamedSource::new(name, content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `field` at the start of a line, after the `[section]`
/// header named by `path[0]` (or from the top when `path` is empty).
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let start = match path.first() {
        None => 0,
        Some(section) => {
            let header = format!("[{section}]");
            content.find(&header)? + header.len()
        }
    };

    let mut offset = start;
    for line in content[start..].split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix(field)
            && rest.trim_start().starts_with('=')
        {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }
    None
}

/// Closest valid key to `unknown`, if any is similar enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Print each error to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}
