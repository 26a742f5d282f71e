//! End-to-end scanning scenarios against a small built corpus.

use licmatch::{Engine, IndexOptions, MatchConfig, MatcherKind, RuleRecord, detect};

const MIT_TEXT: &str = "Permission is hereby granted, free of charge, to any person \
obtaining a copy of this software and associated documentation files (the \"Software\"), \
to deal in the Software without restriction, including without limitation the rights to \
use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the \
Software, and to permit persons to whom the Software is furnished to do so";

fn corpus() -> Vec<RuleRecord> {
    let mut fp = RuleRecord::new(
        "fp_mit_name.RULE",
        "mit",
        "massachusetts institute of technology license office",
    );
    fp.is_false_positive = true;

    vec![
        RuleRecord::new("mit_notice.RULE", "mit", "MIT License"),
        RuleRecord::new("mit_grant.RULE", "mit", "Permission is hereby granted"),
        RuleRecord::new("mit_text.RULE", "mit", MIT_TEXT),
        RuleRecord::new(
            "bsd_redist.RULE",
            "bsd-new",
            "Redistribution and use in source and binary forms, with or without \
             modification, are permitted provided that the following conditions are met",
        ),
        fp,
    ]
}

fn engine() -> Engine {
    let _ = env_logger::builder().is_test(true).try_init();
    Engine::new(corpus(), &IndexOptions::default()).unwrap()
}

#[test]
fn verbatim_rule_text_hash_matches_at_full_coverage() {
    let engine = engine();
    for (text, identifier) in [
        ("MIT License", "mit_notice.RULE"),
        (MIT_TEXT, "mit_text.RULE"),
    ] {
        let matches = engine.scan(text).unwrap();
        assert_eq!(matches.len(), 1, "text: {text}");
        let m = &matches[0];
        assert_eq!(m.matcher, MatcherKind::Hash);
        assert_eq!(m.rule_identifier, identifier);
        assert!((m.coverage() - 100.0).abs() < f32::EPSILON);
    }
}

#[test]
fn scanning_twice_yields_identical_ordered_lists() {
    let engine = engine();
    let text = format!("Copyright 2020. MIT License. {MIT_TEXT} and more text after");
    let first = engine.scan(&text).unwrap();
    let second = engine.scan(&text).unwrap();
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn notice_and_fragment_match_disjoint_in_document_order() {
    let engine = engine();
    let text = "Copyright 2020. MIT License. Permission is hereby granted, free of charge...";
    let matches = engine.scan(text).unwrap();

    let notice = matches
        .iter()
        .find(|m| m.rule_identifier == "mit_notice.RULE")
        .expect("notice rule should match");
    let grant = matches
        .iter()
        .find(|m| m.rule_identifier == "mit_grant.RULE")
        .expect("grant fragment should match");

    assert!(!notice.qspan.overlaps(&grant.qspan));
    assert!(notice.qend() < grant.qstart());
}

#[test]
fn near_miss_with_one_substitution_matches_approximately() {
    let engine = engine();
    let near_miss = MIT_TEXT.replace("documentation", "paperwork");
    let matches = engine.scan(&near_miss).unwrap();

    let m = matches
        .iter()
        .find(|m| m.rule_identifier == "mit_text.RULE")
        .expect("near-miss should still match the full text rule");
    assert_eq!(m.matcher, MatcherKind::Seq);
    assert!(m.coverage() < 100.0);
    assert!(m.coverage() > 90.0);
}

#[test]
fn plain_prose_returns_no_matches() {
    let engine = engine();
    let prose = "We hiked up the mountain at dawn and watched the valley fill \
                 with light while the kettle whistled back at camp.";
    assert!(engine.scan(prose).unwrap().is_empty());
}

#[test]
fn contained_weaker_match_is_dropped() {
    let engine = engine();
    // the grant fragment is part of the full MIT text: scanning the full
    // text must report the full rule, not the fragment inside it
    let matches = engine.scan(MIT_TEXT).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].rule_identifier, "mit_text.RULE");
}

#[test]
fn rebuild_removes_dropped_rule_and_keeps_others() {
    let engine = engine();
    assert!(!engine.scan("MIT License").unwrap().is_empty());

    let without_notice: Vec<RuleRecord> = corpus()
        .into_iter()
        .filter(|r| r.identifier != "mit_notice.RULE")
        .collect();
    engine
        .rebuild(without_notice, &IndexOptions::default())
        .unwrap();

    assert!(engine.scan("MIT License").unwrap().is_empty());

    let grant = engine.scan("Permission is hereby granted").unwrap();
    assert_eq!(grant.len(), 1);
    assert_eq!(grant[0].rule_identifier, "mit_grant.RULE");
}

#[test]
fn false_positive_rule_never_surfaces() {
    let engine = engine();
    let matches = engine
        .scan("massachusetts institute of technology license office")
        .unwrap();
    assert!(matches.iter().all(|m| m.rule_identifier != "fp_mit_name.RULE"));
}

#[test]
fn ranking_puts_higher_coverage_first() {
    let engine = engine();
    let near_miss = MIT_TEXT.replace("documentation", "paperwork");
    let text = format!("{near_miss}\n\nAlso: MIT License applies.");
    let matches = engine.scan(&text).unwrap();
    assert!(matches.len() >= 2);
    for pair in matches.windows(2) {
        assert!(pair[0].coverage() >= pair[1].coverage());
    }
}

#[test]
fn match_records_round_trip_for_formatting_layers() {
    let engine = engine();
    let matches = engine.scan("MIT License").unwrap();
    let records: Vec<licmatch::MatchRecord> =
        matches.iter().map(|m| m.to_record()).collect();
    let json = serde_json::to_string(&records).unwrap();
    let parsed: Vec<licmatch::MatchRecord> = serde_json::from_str(&json).unwrap();
    assert_eq!(records, parsed);
    assert_eq!(parsed[0].matcher, "1-hash");
}

#[test]
fn scan_batch_isolates_each_text() {
    let engine = engine();
    let near_miss = MIT_TEXT.replace("documentation", "paperwork");
    let texts = ["MIT License", "", &near_miss, "no legal words at all"];
    let results = engine.scan_batch(&texts);
    assert_eq!(results.len(), 4);
    assert_eq!(results[0].as_ref().unwrap().len(), 1);
    assert!(results[1].as_ref().unwrap().is_empty());
    assert!(!results[2].as_ref().unwrap().is_empty());
    assert!(results[3].as_ref().unwrap().is_empty());
}

#[test]
fn snapshot_scans_finish_against_their_index() {
    let engine = engine();
    let snapshot = engine.index();
    engine.rebuild(Vec::new(), &IndexOptions::default()).unwrap();

    // in-flight work holding the old reference still matches
    let old = detect(&snapshot, "MIT License", &MatchConfig::default()).unwrap();
    assert_eq!(old.len(), 1);
    // the swapped-in empty index matches nothing
    assert!(engine.scan("MIT License").unwrap().is_empty());
}

#[test]
fn custom_rules_can_be_added_and_restricted() {
    let custom = RuleRecord::new(
        "acme_eula.RULE",
        "acme-proprietary",
        "licensed exclusively for internal use at acme corporation",
    );

    let options = IndexOptions {
        extra_rules: vec![custom.clone()],
        ..IndexOptions::default()
    };
    let engine = Engine::new(corpus(), &options).unwrap();
    let hits = engine
        .scan("licensed exclusively for internal use at acme corporation")
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].license_expression, "acme-proprietary");

    let options = IndexOptions {
        extra_rules: vec![custom],
        builtin_only: true,
        ..IndexOptions::default()
    };
    let engine = Engine::new(corpus(), &options).unwrap();
    assert!(
        engine
            .scan("licensed exclusively for internal use at acme corporation")
            .unwrap()
            .is_empty()
    );
}
