use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::models::{AccountData, Language};

// Grades 5-13 with an optional section letter, or the upper-school years Q1/Q2.
static CLASS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(Q[1-2]|[5-9]|1[0-3])[a-zA-Z]?$").expect("valid class regex"));

pub fn validate_class(class: &str) -> Result<(), ValidationError> {
    if CLASS_PATTERN.is_match(class) {
        Ok(())
    } else {
        Err(ValidationError::InvalidClass(class.to_string()))
    }
}

/// Trims, lowercases and deduplicates subject abbreviations.
pub fn normalize_subjects(subjects: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(subjects.len());
    for subject in subjects {
        let subject = subject.trim().to_lowercase();
        if !subject.is_empty() && !normalized.contains(&subject) {
            normalized.push(subject);
        }
    }
    normalized
}

pub fn build_account(
    id: Uuid,
    class: &str,
    lang: &str,
    ignored: &[String],
    additional: &[String],
) -> Result<AccountData, ValidationError> {
    let class = class.trim();
    validate_class(class)?;
    let lang: Language = lang.parse()?;

    Ok(AccountData {
        id,
        affected_class: class.to_string(),
        lang,
        ignored: normalize_subjects(ignored),
        additional: normalize_subjects(additional),
    })
}
