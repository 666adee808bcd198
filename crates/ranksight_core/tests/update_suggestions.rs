use ranksight_core::{
    update, ClientState, Effect, MatchType, Msg, SetKey, StateEvent, Suggestion, SuggestionChange,
    SuggestionSet, WriteSettlement,
};

fn key() -> SetKey {
    SetKey {
        blog_id: "blog-1".to_string(),
        article_id: "article-1".to_string(),
        include_external: true,
    }
}

fn suggestion(id: &str, applied: bool) -> Suggestion {
    Suggestion {
        id: id.to_string(),
        anchor_text: format!("anchor {id}"),
        url: format!("https://example.com/{id}"),
        reason: "related pillar page".to_string(),
        position: 0,
        match_type: MatchType::Exact,
        is_applied: applied,
    }
}

fn set_with(internal: usize, external: usize) -> SuggestionSet {
    SuggestionSet {
        internal: (0..internal)
            .map(|i| suggestion(&format!("int-{i}"), false))
            .collect(),
        external: (0..external)
            .map(|i| suggestion(&format!("ext-{i}"), false))
            .collect(),
        ..SuggestionSet::default()
    }
}

fn loaded(set: SuggestionSet) -> ClientState {
    client_logging::initialize_for_tests();
    let (state, effects) = update(ClientState::new(), Msg::SuggestionsRequested { key: key() });
    assert_eq!(effects, vec![Effect::FetchSuggestions { key: key() }]);
    let (state, effects) = update(state, Msg::SuggestionsLoaded { key: key(), set });
    assert!(effects.is_empty());
    state
}

fn settle(state: ClientState, settlement: WriteSettlement) -> (ClientState, Vec<Effect>) {
    update(
        state,
        Msg::WriteSettled {
            key: key(),
            settlement,
        },
    )
}

#[test]
fn loaded_set_is_served_without_refetch() {
    let state = loaded(set_with(2, 1));
    assert_eq!(state.suggestions(&key()).unwrap().len(), 3);

    let (_, effects) = update(state, Msg::SuggestionsRequested { key: key() });
    assert!(effects.is_empty());
}

#[test]
fn include_external_is_part_of_the_key() {
    let state = loaded(set_with(2, 1));
    let other = SetKey {
        include_external: false,
        ..key()
    };
    assert!(state.suggestions(&other).is_none());

    let (_, effects) = update(state, Msg::SuggestionsRequested { key: other.clone() });
    assert_eq!(effects, vec![Effect::FetchSuggestions { key: other }]);
}

#[test]
fn toggles_are_applied_locally_and_serialized() {
    let state = loaded(set_with(3, 0));

    let (state, effects) = update(
        state,
        Msg::SuggestionToggled {
            key: key(),
            id: "int-0".to_string(),
            applied: true,
        },
    );
    assert_eq!(
        effects,
        vec![Effect::IssueSuggestionWrite {
            key: key(),
            change: SuggestionChange::Toggle {
                id: "int-0".to_string(),
                applied: true,
            },
        }]
    );

    // Second toggle before the first write settles: applied locally,
    // no second write goes out yet.
    let (state, effects) = update(
        state,
        Msg::SuggestionToggled {
            key: key(),
            id: "int-1".to_string(),
            applied: true,
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.suggestions(&key()).unwrap().applied_count(), 2);

    // First settlement releases exactly the queued write, in order.
    let (state, effects) = settle(state, WriteSettlement::Confirmed(None));
    assert_eq!(
        effects,
        vec![Effect::IssueSuggestionWrite {
            key: key(),
            change: SuggestionChange::Toggle {
                id: "int-1".to_string(),
                applied: true,
            },
        }]
    );

    let (_, effects) = settle(state, WriteSettlement::Confirmed(None));
    assert!(effects.is_empty());
}

#[test]
fn canonical_response_replaces_the_entry_wholesale() {
    let state = loaded(set_with(2, 0));
    let (state, _) = update(
        state,
        Msg::SuggestionToggled {
            key: key(),
            id: "int-0".to_string(),
            applied: true,
        },
    );

    // The server confirms the write but its canonical set does not carry
    // the applied flag; the cache takes the server's word verbatim.
    let canonical = set_with(2, 0);
    let (state, _) = settle(state, WriteSettlement::Confirmed(Some(canonical.clone())));
    assert_eq!(state.suggestions(&key()).unwrap(), &canonical);
}

#[test]
fn failed_write_invalidates_and_next_read_restores_server_state() {
    let state = loaded(set_with(5, 3));

    let (state, effects) = update(state, Msg::ApplyAllRequested { key: key() });
    assert_eq!(state.suggestions(&key()).unwrap().applied_count(), 8);
    assert!(matches!(
        effects.as_slice(),
        [Effect::IssueSuggestionWrite {
            change: SuggestionChange::ApplyAll,
            ..
        }]
    ));

    let (mut state, effects) = settle(state, WriteSettlement::Failed);
    assert!(effects.is_empty());
    // The optimistic state can no longer be trusted; the entry is stale and
    // observers are told to reconcile.
    assert!(state.suggestions(&key()).is_none());
    assert!(state.cache().is_stale(&key()));
    assert!(state
        .take_events()
        .iter()
        .any(|event| matches!(event, StateEvent::SuggestionsUpdated { .. })));

    let (state, effects) = update(state, Msg::SuggestionsRequested { key: key() });
    assert_eq!(effects, vec![Effect::FetchSuggestions { key: key() }]);
    let (state, _) = update(
        state,
        Msg::SuggestionsLoaded {
            key: key(),
            set: set_with(5, 3),
        },
    );
    assert_eq!(state.suggestions(&key()).unwrap().applied_count(), 0);
}

#[test]
fn queued_mutations_coalesce_per_suggestion() {
    let state = loaded(set_with(3, 0));
    let (state, _) = update(
        state,
        Msg::SuggestionToggled {
            key: key(),
            id: "int-0".to_string(),
            applied: true,
        },
    );
    let (state, _) = update(
        state,
        Msg::SuggestionToggled {
            key: key(),
            id: "int-1".to_string(),
            applied: true,
        },
    );
    // The user flips int-1 back before the first write settled; the queued
    // toggle is superseded, not duplicated.
    let (state, _) = update(
        state,
        Msg::SuggestionToggled {
            key: key(),
            id: "int-1".to_string(),
            applied: false,
        },
    );

    let (state, effects) = settle(state, WriteSettlement::Confirmed(None));
    assert_eq!(
        effects,
        vec![Effect::IssueSuggestionWrite {
            key: key(),
            change: SuggestionChange::Toggle {
                id: "int-1".to_string(),
                applied: false,
            },
        }]
    );
    let (_, effects) = settle(state, WriteSettlement::Confirmed(None));
    assert!(effects.is_empty());
}

#[test]
fn apply_all_supersedes_queued_toggles() {
    let state = loaded(set_with(3, 0));
    let (state, _) = update(
        state,
        Msg::SuggestionToggled {
            key: key(),
            id: "int-0".to_string(),
            applied: true,
        },
    );
    let (state, _) = update(
        state,
        Msg::SuggestionToggled {
            key: key(),
            id: "int-1".to_string(),
            applied: true,
        },
    );
    let (state, _) = update(state, Msg::ApplyAllRequested { key: key() });

    let (_, effects) = settle(state, WriteSettlement::Confirmed(None));
    assert_eq!(
        effects,
        vec![Effect::IssueSuggestionWrite {
            key: key(),
            change: SuggestionChange::ApplyAll,
        }]
    );
}

#[test]
fn mutation_without_loaded_entry_is_ignored() {
    let (state, effects) = update(
        ClientState::new(),
        Msg::SuggestionToggled {
            key: key(),
            id: "int-0".to_string(),
            applied: true,
        },
    );
    assert!(effects.is_empty());
    assert!(state.suggestions(&key()).is_none());
}
