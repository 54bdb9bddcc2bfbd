// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Question catalog loading and validation
//!
//! The catalog declares the packages on offer and the questions inside
//! them. It is loaded from TOML at startup and read-only afterwards;
//! validation here keeps invalid recurrence parameters out of the
//! generator entirely.
//!
//! ```toml
//! [[package]]
//! id = "course-30"
//! name = "1 month"
//! duration_days = 30
//!
//!   [[package.question]]
//!   id = "mood-daily"
//!   text = "How are you feeling today?"
//!   kind = "multiple_choice"
//!   options = ["Very good", "Good", "Satisfactory", "Poor"]
//!   interval_days = 1
//!   delay_days = 0
//! ```

use crate::model::{Package, PackageId, QuestionId, QuestionKind, QuestionTemplate};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Errors from catalog loading
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("duplicate id in catalog: {0}")]
    DuplicateId(String),

    #[error("package {0}: duration_days must be >= 1, got {1}")]
    NonPositiveDuration(PackageId, i64),

    #[error("question {0}: interval_days must be >= 1, got {1}")]
    NonPositiveInterval(QuestionId, i64),

    #[error("question {0}: delay_days must be >= 0, got {1}")]
    NegativeDelay(QuestionId, i64),

    #[error("question {0}: multiple_choice requires at least two options")]
    MissingOptions(QuestionId),

    #[error("question {0}: yes_no questions take no options")]
    UnexpectedOptions(QuestionId),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "package")]
    packages: Vec<PackageEntry>,
}

#[derive(Debug, Deserialize)]
struct PackageEntry {
    id: String,
    name: String,
    duration_days: i64,
    #[serde(default, rename = "question")]
    questions: Vec<QuestionEntry>,
}

#[derive(Debug, Deserialize)]
struct QuestionEntry {
    id: String,
    text: String,
    kind: QuestionKind,
    #[serde(default)]
    options: Vec<String>,
    interval_days: i64,
    #[serde(default)]
    delay_days: i64,
}

/// Validated catalog of packages and their question templates
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    packages: Vec<Package>,
    templates: Vec<QuestionTemplate>,
}

impl Catalog {
    /// Parse and validate a TOML catalog
    pub fn parse(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(content)?;

        let mut packages = Vec::new();
        let mut templates = Vec::new();
        let mut seen = HashSet::new();

        for entry in file.packages {
            let package_id = PackageId::new(entry.id.clone());
            if !seen.insert(entry.id.clone()) {
                return Err(CatalogError::DuplicateId(entry.id));
            }
            if entry.duration_days < 1 {
                return Err(CatalogError::NonPositiveDuration(
                    package_id,
                    entry.duration_days,
                ));
            }

            for question in entry.questions {
                let question_id = QuestionId::new(question.id.clone());
                if !seen.insert(question.id.clone()) {
                    return Err(CatalogError::DuplicateId(question.id));
                }
                if question.interval_days < 1 {
                    return Err(CatalogError::NonPositiveInterval(
                        question_id,
                        question.interval_days,
                    ));
                }
                if question.delay_days < 0 {
                    return Err(CatalogError::NegativeDelay(
                        question_id,
                        question.delay_days,
                    ));
                }
                match question.kind {
                    QuestionKind::MultipleChoice if question.options.len() < 2 => {
                        return Err(CatalogError::MissingOptions(question_id));
                    }
                    QuestionKind::YesNo if !question.options.is_empty() => {
                        return Err(CatalogError::UnexpectedOptions(question_id));
                    }
                    _ => {}
                }

                templates.push(QuestionTemplate {
                    id: question_id,
                    package: package_id.clone(),
                    text: question.text,
                    kind: question.kind,
                    options: question.options,
                    interval_days: question.interval_days,
                    delay_days: question.delay_days,
                });
            }

            packages.push(Package {
                id: package_id,
                name: entry.name,
                duration_days: entry.duration_days,
            });
        }

        Ok(Self {
            packages,
            templates,
        })
    }

    /// Load a catalog from a TOML file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Packages in catalog order
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// All question templates
    pub fn templates(&self) -> &[QuestionTemplate] {
        &self.templates
    }
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
