//! Utility functions for candidate processing and validation.
//!
//! This module contains helpers for normalizing and validating candidate
//! names, de-duplicating input and parsing name lists from files.

use crate::error::ProbeError;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

lazy_static::lazy_static! {
    static ref CANDIDATE_RE: Regex = Regex::new(r"^[a-z0-9_.]{2,32}$")
        .unwrap_or_else(|e| panic!("invalid candidate pattern: {}", e));
}

/// Lowercase and trim a raw candidate.
pub fn normalize_candidate(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Validate a candidate name.
///
/// Accepts 2 to 32 characters from `a-z0-9_.` with no consecutive dots.
/// Callers are expected to normalize first.
pub fn validate_candidate(name: &str) -> Result<(), ProbeError> {
    if name.is_empty() {
        return Err(ProbeError::invalid_name(name, "Name cannot be empty"));
    }

    if name.chars().count() < 2 {
        return Err(ProbeError::invalid_name(name, "Name too short"));
    }

    if name.chars().count() > 32 {
        return Err(ProbeError::invalid_name(name, "Name too long"));
    }

    if name.contains("..") {
        return Err(ProbeError::invalid_name(
            name,
            "Name cannot contain consecutive dots",
        ));
    }

    if !CANDIDATE_RE.is_match(name) {
        return Err(ProbeError::invalid_name(
            name,
            "Only lowercase letters, digits, '_' and '.' are allowed",
        ));
    }

    Ok(())
}

/// Drop repeated names, keeping the first occurrence of each.
pub fn dedupe_preserving_order(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(names.len());
    names
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Names parsed from a list, plus the lines that were rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateList {
    pub names: Vec<String>,
    /// Human-readable descriptions like `Line 4: 'a' - Name too short`
    pub invalid: Vec<String>,
}

/// Parse a name list: one name per line.
///
/// Blank lines and `#` comments are skipped, inline comments are stripped,
/// names are normalized, and anything that fails validation is reported in
/// [`CandidateList::invalid`] instead of aborting the whole list.
pub fn parse_candidate_lines(content: &str) -> CandidateList {
    let mut list = CandidateList::default();

    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let name_part = trimmed.split('#').next().unwrap_or("").trim();
        if name_part.is_empty() {
            continue;
        }

        let name = normalize_candidate(name_part);
        match validate_candidate(&name) {
            Ok(()) => list.names.push(name),
            Err(ProbeError::InvalidName { reason, .. }) => list
                .invalid
                .push(format!("Line {}: '{}' - {}", idx + 1, name_part, reason)),
            Err(e) => list
                .invalid
                .push(format!("Line {}: '{}' - {}", idx + 1, name_part, e)),
        }
    }

    list
}

/// Read and parse a name list file.
///
/// Fails if the file is missing or holds no valid names.
pub fn read_candidates_from_file<P: AsRef<Path>>(path: P) -> Result<CandidateList, ProbeError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ProbeError::file_error(
            path.to_string_lossy(),
            "File not found",
        ));
    }

    let content = fs::read_to_string(path).map_err(|e| {
        ProbeError::file_error(path.to_string_lossy(), format!("Failed to read: {}", e))
    })?;

    let list = parse_candidate_lines(&content);
    if list.names.is_empty() {
        return Err(ProbeError::file_error(
            path.to_string_lossy(),
            "No valid names found in the file",
        ));
    }

    Ok(list)
}
