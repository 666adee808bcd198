use ranksight_core::{
    document_fingerprint, locate_anchor, normalize_link_for_dedupe, ExistingLink, MatchType,
    Suggestion, SuggestionSet,
};

fn suggestion(anchor: &str, position: usize, match_type: MatchType) -> Suggestion {
    Suggestion {
        id: "s-1".to_string(),
        anchor_text: anchor.to_string(),
        url: "https://example.com/guide".to_string(),
        reason: "related guide".to_string(),
        position,
        match_type,
        is_applied: false,
    }
}

#[test]
fn recorded_position_is_used_when_still_valid() {
    let document = "Grow your SaaS funnel with content.";
    let suggestion = suggestion("SaaS funnel", 10, MatchType::Exact);
    assert_eq!(locate_anchor(document, &suggestion), Some(10));
}

#[test]
fn edited_document_falls_back_to_search() {
    // Text inserted ahead of the anchor shifts it; the stored offset now
    // points mid-sentence and must be treated as a hint only.
    let document = "NEW INTRO. Grow your SaaS funnel with content.";
    let suggestion = suggestion("SaaS funnel", 10, MatchType::Exact);
    assert_eq!(locate_anchor(document, &suggestion), Some(21));
}

#[test]
fn missing_anchor_resolves_to_none() {
    let document = "The paragraph was rewritten entirely.";
    let suggestion = suggestion("SaaS funnel", 10, MatchType::Exact);
    assert_eq!(locate_anchor(document, &suggestion), None);
}

#[test]
fn case_insensitive_match_finds_recased_anchor() {
    let document = "Learn about saas funnel mechanics.";
    let exact = suggestion("SaaS Funnel", 12, MatchType::Exact);
    assert_eq!(locate_anchor(document, &exact), None);

    let lenient = suggestion("SaaS Funnel", 12, MatchType::CaseInsensitive);
    assert_eq!(locate_anchor(document, &lenient), Some(12));
}

#[test]
fn multibyte_documents_use_character_offsets() {
    // "SaaS" sits at character offset 14 but a larger byte offset because
    // of the multi-byte characters before it.
    let document = "Héllo wörld — SaaS funnel here.";
    let offset = locate_anchor(document, &suggestion("SaaS funnel", 0, MatchType::Exact));
    assert_eq!(offset, Some(14));
}

#[test]
fn fingerprint_changes_when_document_changes() {
    let original = document_fingerprint("original content");
    let edited = document_fingerprint("original content, edited");
    assert_ne!(original, edited);
    assert_eq!(original, document_fingerprint("original content"));
    assert_eq!(original.len(), 64);
}

#[test]
fn link_normalization_equates_cosmetic_variants() {
    let a = normalize_link_for_dedupe("https://Example.com/a/").unwrap();
    let b = normalize_link_for_dedupe("https://example.com/a#section").unwrap();
    assert_eq!(a, b);

    let c = normalize_link_for_dedupe("https://example.com/b").unwrap();
    assert_ne!(a, c);

    assert!(normalize_link_for_dedupe("mailto:team@example.com").is_none());
    assert!(normalize_link_for_dedupe("not a url").is_none());
}

#[test]
fn duplicate_suggestions_are_detected_against_existing_links() {
    let set = SuggestionSet {
        internal: vec![suggestion("guide", 0, MatchType::Exact)],
        existing: vec![ExistingLink {
            anchor_text: "the guide".to_string(),
            url: "https://EXAMPLE.com/guide/".to_string(),
        }],
        ..SuggestionSet::default()
    };
    assert!(set.is_duplicate_of_existing(&set.internal[0]));

    let novel = Suggestion {
        url: "https://example.com/other".to_string(),
        ..set.internal[0].clone()
    };
    assert!(!set.is_duplicate_of_existing(&novel));
}
