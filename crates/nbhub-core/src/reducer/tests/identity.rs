use super::*;
use pretty_assertions::assert_eq;

fn foreign_actions() -> Vec<AppAction> {
    vec![
        AuthAction::Login(Op::Request { request_id: rid(9) }).into(),
        HomeAction::AddProject(Op::Request { request_id: rid(9) }).into(),
        ProjectAction::StartServer(Op::Request { request_id: rid(9) }).into(),
        SettingsAction::FetchCards(Op::Request { request_id: rid(9) }).into(),
        RoutingAction::LocationChanged {
            path: "/settings".to_string(),
        }
        .into(),
    ]
}

#[test]
fn domain_reducers_ignore_other_domains() {
    let populated = populated();

    for action in foreign_actions() {
        let mut auth = populated.auth.clone();
        if !matches!(action, AppAction::Auth(_)) {
            assert_eq!(reduce_auth(&mut auth, &action), Reduction::Ignored);
            assert_eq!(auth, populated.auth);
        }

        let mut home = populated.home.clone();
        if !matches!(action, AppAction::Home(_)) {
            assert_eq!(reduce_home(&mut home, &action), Reduction::Ignored);
            assert_eq!(home, populated.home);
        }

        let mut project = populated.project.clone();
        if !matches!(action, AppAction::Project(_)) {
            assert_eq!(reduce_project(&mut project, &action), Reduction::Ignored);
            assert_eq!(project, populated.project);
        }

        let mut settings = populated.settings.clone();
        if !matches!(action, AppAction::Settings(_)) {
            assert_eq!(reduce_settings(&mut settings, &action), Reduction::Ignored);
            assert_eq!(settings, populated.settings);
        }
    }
}

#[test]
fn initial_state_is_a_fixed_point_for_foreign_slices() {
    let initial = state();
    let mut next = initial.clone();

    reduce(
        &mut next,
        &HomeAction::Dismiss(HomeOp::AddProject).into(),
    );

    assert_eq!(next.auth, initial.auth);
    assert_eq!(next.project, initial.project);
    assert_eq!(next.settings, initial.settings);
    assert_eq!(next.routing, initial.routing);
    assert_eq!(next.forms, initial.forms);
}

#[test]
fn logout_resets_every_slice_at_reducer_level() {
    let mut state = populated();
    assert_eq!(reduce(&mut state, &AppAction::Logout), Reduction::Applied);
    assert_eq!(state, RootState::default());
}

#[test]
fn rehydrate_only_touches_auth() {
    let mut state = state();
    reduce(
        &mut state,
        &AppAction::Rehydrate(PersistedSlice::new(PersistedAuth {
            account_id: Some("42".to_string()),
            username: Some("alice".to_string()),
            authenticated: true,
        })),
    );

    assert!(state.auth.token_present);
    assert_eq!(state.auth.username.as_deref(), Some("alice"));
    assert_eq!(state.home, RootState::default().home);
    assert_eq!(state.routing, RootState::default().routing);
}
