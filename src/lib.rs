//! License text matching engine.
//!
//! Detects which license (and other long-form rule) texts are present
//! inside arbitrary input text. Rule texts are tokenized into a shared
//! numeric vocabulary and indexed once; each scan then runs a fixed
//! pipeline of strategies from cheapest to most expensive: whole-run
//! content-hash lookup, automaton exact substring search, and prefiltered
//! approximate sequence alignment. Raw matches are merged, deduplicated,
//! and ranked before being returned.
//!
//! ```
//! use licmatch::{Engine, IndexOptions, RuleRecord};
//!
//! let rules = vec![
//!     RuleRecord::new("mit_notice.RULE", "mit", "Licensed under the MIT License"),
//! ];
//! let engine = Engine::new(rules, &IndexOptions::default())?;
//! let matches = engine.scan("This project is Licensed under the MIT License.")?;
//! assert_eq!(matches[0].license_expression, "mit");
//! # anyhow::Ok(())
//! ```

pub mod aho_match;
pub mod config;
pub mod engine;
pub mod hash_match;
pub mod index;
pub mod match_refine;
pub mod models;
pub mod query;
pub mod rules;
pub mod seq_match;
pub mod spans;
pub mod tokenize;

pub use config::MatchConfig;
pub use engine::{Engine, detect};
pub use index::{IndexOptions, LicenseIndex, build_index};
pub use models::{LicenseMatch, MatchRecord, MatcherKind, Rule, RuleRecord};
pub use spans::Span;
