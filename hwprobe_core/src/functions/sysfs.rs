//! Sysfs glob-read probe function.
//!
//! Walks every directory matching a glob with exactly one wildcard path
//! segment, reads a set of required files (all must exist or the directory
//! is skipped entirely) plus a set of optional files, and yields one result
//! map per surviving directory.

use crate::args::ArgParser;
use crate::functions::{emit_results, ProbeFunction};
use crate::registry::{FunctionRegistry, ParseError};
use crate::result::{ProbeResult, ResultMap};
use crate::runtime::Context;
use regex::Regex;
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;

pub const NAME: &str = "sysfs";

pub struct SysfsFunction {
    dir_path: String,
    keys: Vec<String>,
    optional_keys: Vec<String>,
}

pub fn factory(
    _registry: &FunctionRegistry,
    args: &Map<String, Value>,
) -> Result<Box<dyn ProbeFunction>, ParseError> {
    let mut parser = ArgParser::new(args);
    let dir_path = parser.string("dir_path", None);
    let keys = parser.string_list("keys", None);
    let optional_keys = parser.string_list("optional_keys", Some(Vec::new()));

    let mut errors = match parser.finish() {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };

    if errors.is_empty() && split_glob(&dir_path).is_none() {
        errors.push(crate::args::ArgError::BadElement {
            key: "dir_path".to_string(),
            index: 0,
            cause: "glob must contain exactly one wildcard path segment".to_string(),
        });
    }

    if !errors.is_empty() {
        return Err(ParseError::invalid_arguments(NAME, errors));
    }

    Ok(Box::new(SysfsFunction {
        dir_path,
        keys,
        optional_keys,
    }))
}

impl ProbeFunction for SysfsFunction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn eval_in_helper(&self, ctx: &Context, output: &mut String) -> i32 {
        let mut results: ProbeResult = Vec::new();

        'dirs: for dir in glob_dirs(ctx, &self.dir_path) {
            let mut map = ResultMap::new();

            for key in &self.keys {
                match read_trimmed(&dir.join(key)) {
                    Some(content) => {
                        map.insert(key.clone(), Value::String(content));
                    }
                    None => {
                        log::debug!(
                            "sysfs: '{}' missing required file '{}', skipping",
                            dir.display(),
                            key
                        );
                        continue 'dirs;
                    }
                }
            }

            for key in &self.optional_keys {
                if let Some(content) = read_trimmed(&dir.join(key)) {
                    map.insert(key.clone(), Value::String(content));
                }
            }

            results.push(map);
        }

        emit_results(&results, output)
    }
}

/// Split a glob into (fixed prefix, wildcard segment, fixed suffix
/// segments). `None` when the glob does not have exactly one wildcarded
/// segment.
fn split_glob(pattern: &str) -> Option<(PathBuf, String, Vec<String>)> {
    let segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let wildcard_positions: Vec<usize> = segments
        .iter()
        .enumerate()
        .filter(|(_, s)| s.contains('*'))
        .map(|(i, _)| i)
        .collect();

    if wildcard_positions.len() != 1 {
        return None;
    }
    let pos = wildcard_positions[0];

    let mut prefix = PathBuf::from("/");
    for segment in &segments[..pos] {
        prefix.push(segment);
    }
    let suffix = segments[pos + 1..].iter().map(|s| s.to_string()).collect();

    Some((prefix, segments[pos].to_string(), suffix))
}

/// Anchored regex for one wildcard segment ('*' matches any run of
/// characters, everything else is literal).
fn segment_regex(segment: &str) -> Option<Regex> {
    let literals: Vec<String> = segment.split('*').map(|p| regex::escape(p)).collect();
    let pattern = format!("^{}$", literals.join(".*"));
    Regex::new(&pattern).ok()
}

/// All directories matching a one-wildcard glob, resolved under the
/// context's sysfs root. Absences of any kind yield an empty list.
pub(crate) fn glob_dirs(ctx: &Context, pattern: &str) -> Vec<PathBuf> {
    let Some((prefix, wildcard, suffix)) = split_glob(pattern) else {
        return Vec::new();
    };
    let Some(re) = segment_regex(&wildcard) else {
        return Vec::new();
    };

    let base = ctx.sysfs_path(&prefix.to_string_lossy());
    let Ok(entries) = fs::read_dir(&base) else {
        return Vec::new();
    };

    let mut dirs: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| re.is_match(name))
                .unwrap_or(false)
        })
        .map(|entry| {
            let mut path = entry.path();
            for segment in &suffix {
                path.push(segment);
            }
            path
        })
        .filter(|path| path.exists())
        .collect();

    dirs.sort();
    dirs
}

/// Read a sysfs attribute file, trimming trailing whitespace.
pub(crate) fn read_trimmed(path: &std::path::Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}
