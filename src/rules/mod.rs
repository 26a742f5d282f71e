//! Rule corpus preparation.
//!
//! Records arrive already parsed from an external loader. This module
//! validates them and applies the corpus-level options (extra rule sets,
//! language filtering) before the index builder tokenizes them.

pub mod legalese;
pub mod thresholds;

use anyhow::{Result, bail};

use crate::index::IndexOptions;
use crate::models::RuleRecord;

/// Check that a record can become a rule.
///
/// A malformed record is skipped with a warning at build time; this returns
/// the reason used in that warning.
pub fn validate_record(record: &RuleRecord) -> Result<()> {
    if record.identifier.trim().is_empty() {
        bail!("rule has an empty identifier");
    }
    if record.license_expression.trim().is_empty() {
        bail!("rule '{}' has an empty license expression", record.identifier);
    }
    if record.text.trim().is_empty() {
        bail!("rule '{}' has an empty text", record.identifier);
    }
    if record.relevance > 100 {
        bail!(
            "rule '{}' has relevance {} out of the 0-100 range",
            record.identifier,
            record.relevance
        );
    }
    if let Some(coverage) = record.minimum_coverage
        && coverage > 100
    {
        bail!(
            "rule '{}' has minimum coverage {} out of the 0-100 range",
            record.identifier,
            coverage
        );
    }
    Ok(())
}

/// True if the record is in the corpus primary language.
///
/// Records without a language tag are primary.
pub fn is_primary_language(record: &RuleRecord) -> bool {
    match record.language.as_deref() {
        None => true,
        Some(lang) => {
            let lang = lang.trim().to_lowercase();
            lang.is_empty() || lang == "en" || lang.starts_with("en-")
        }
    }
}

/// Assemble the record list the index will be built from.
///
/// Appends extra rule sets unless restricted to built-in rules, and filters
/// to the primary language unless all languages are indexed.
pub fn assemble_corpus(builtin: Vec<RuleRecord>, options: &IndexOptions) -> Vec<RuleRecord> {
    let mut records = builtin;
    if !options.builtin_only {
        records.extend(options.extra_rules.iter().cloned());
    }
    if !options.all_languages {
        records.retain(is_primary_language);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_record_ok() {
        let record = RuleRecord::new("mit_1.RULE", "mit", "MIT License");
        assert!(validate_record(&record).is_ok());
    }

    #[test]
    fn test_validate_record_empty_identifier() {
        let record = RuleRecord::new("  ", "mit", "MIT License");
        assert!(validate_record(&record).is_err());
    }

    #[test]
    fn test_validate_record_empty_expression() {
        let record = RuleRecord::new("mit_1.RULE", "", "MIT License");
        assert!(validate_record(&record).is_err());
    }

    #[test]
    fn test_validate_record_empty_text() {
        let record = RuleRecord::new("mit_1.RULE", "mit", "   \n ");
        assert!(validate_record(&record).is_err());
    }

    #[test]
    fn test_validate_record_relevance_range() {
        let mut record = RuleRecord::new("mit_1.RULE", "mit", "MIT License");
        record.relevance = 101;
        assert!(validate_record(&record).is_err());
    }

    #[test]
    fn test_validate_record_coverage_range() {
        let mut record = RuleRecord::new("mit_1.RULE", "mit", "MIT License");
        record.minimum_coverage = Some(120);
        assert!(validate_record(&record).is_err());
    }

    #[test]
    fn test_is_primary_language() {
        let mut record = RuleRecord::new("r", "mit", "text");
        assert!(is_primary_language(&record));
        record.language = Some("en".to_string());
        assert!(is_primary_language(&record));
        record.language = Some("en-us".to_string());
        assert!(is_primary_language(&record));
        record.language = Some("de".to_string());
        assert!(!is_primary_language(&record));
    }

    #[test]
    fn test_assemble_corpus_language_filter() {
        let mut german = RuleRecord::new("de_1.RULE", "mit", "MIT Lizenz Text");
        german.language = Some("de".to_string());
        let builtin = vec![
            RuleRecord::new("mit_1.RULE", "mit", "MIT License"),
            german.clone(),
        ];

        let primary_only = assemble_corpus(builtin.clone(), &IndexOptions::default());
        assert_eq!(primary_only.len(), 1);

        let options = IndexOptions {
            all_languages: true,
            ..IndexOptions::default()
        };
        let all = assemble_corpus(builtin, &options);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_assemble_corpus_extra_rules() {
        let builtin = vec![RuleRecord::new("mit_1.RULE", "mit", "MIT License")];
        let extra = vec![RuleRecord::new("custom_1.RULE", "custom", "Custom terms")];

        let options = IndexOptions {
            extra_rules: extra.clone(),
            ..IndexOptions::default()
        };
        let merged = assemble_corpus(builtin.clone(), &options);
        assert_eq!(merged.len(), 2);

        let options = IndexOptions {
            extra_rules: extra,
            builtin_only: true,
            ..IndexOptions::default()
        };
        let builtin_only = assemble_corpus(builtin, &options);
        assert_eq!(builtin_only.len(), 1);
    }
}
