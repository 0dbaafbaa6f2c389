use super::*;
use pretty_assertions::assert_eq;

fn twice(state: &mut RootState, action: AppAction) -> RootState {
    reduce(state, &action);
    let once = state.clone();
    reduce(state, &action);
    once
}

#[test]
fn replacing_success_is_idempotent() {
    let mut state = state();
    reduce(
        &mut state,
        &HomeAction::FetchProjects(Op::Request { request_id: rid(1) }).into(),
    );

    let once = twice(
        &mut state,
        HomeAction::FetchProjects(Op::Success {
            request_id: rid(1),
            data: vec![project("a", "A"), project("b", "B")],
        })
        .into(),
    );

    assert_eq!(state, once);
}

#[test]
fn detail_and_session_success_are_idempotent() {
    let mut state = state();
    reduce(
        &mut state,
        &AuthAction::Login(Op::Request { request_id: rid(1) }).into(),
    );
    let once = twice(
        &mut state,
        AuthAction::Login(Op::Success {
            request_id: rid(1),
            data: login_success("abc"),
        })
        .into(),
    );
    assert_eq!(state, once);

    reduce(
        &mut state,
        &ProjectAction::UpdateProject(Op::Request { request_id: rid(2) }).into(),
    );
    let once = twice(
        &mut state,
        ProjectAction::UpdateProject(Op::Success {
            request_id: rid(2),
            data: project("p1", "renamed"),
        })
        .into(),
    );
    assert_eq!(state, once);
}

#[test]
fn additive_success_appends_each_time() {
    let mut state = state();
    reduce(
        &mut state,
        &HomeAction::AddProject(Op::Request { request_id: rid(1) }).into(),
    );
    let added = HomeAction::AddProject(Op::Success {
        request_id: rid(1),
        data: project("p1", "thesis"),
    });

    twice(&mut state, added.into());

    assert_eq!(state.home.projects.len(), 2);
}

#[test]
fn failure_is_idempotent() {
    let mut state = state();
    reduce(
        &mut state,
        &AuthAction::Register(Op::Request { request_id: rid(1) }).into(),
    );
    let once = twice(
        &mut state,
        AuthAction::Register(Op::Failure {
            request_id: rid(1),
            error: bad_request("username", "A user with that username already exists."),
        })
        .into(),
    );
    assert_eq!(state, once);
}
