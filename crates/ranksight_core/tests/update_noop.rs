use ranksight_core::{update, ClientState, Msg};

#[test]
fn update_is_noop() {
    let state = ClientState::new();
    let (next, effects) = update(state.clone(), Msg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}
