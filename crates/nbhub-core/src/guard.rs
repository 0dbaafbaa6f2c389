//! Route guards: pure functions of "is a token persisted" and the requested
//! location.

use super::routes::Route;
use super::routes::RouteKind;
use super::routes::HOME_ROUTE;
use super::routes::LOGIN_ROUTE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardInput {
    /// False until the persisted slice has been read back.
    pub rehydrated: bool,
    pub token_present: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    Redirect { to: String },
    /// Persisted state is not available yet; show a neutral placeholder.
    Pending,
}

pub fn decide(input: GuardInput, location: &str) -> GuardDecision {
    match Route::parse(location).kind() {
        RouteKind::Public => GuardDecision::Render,
        _ if !input.rehydrated => GuardDecision::Pending,
        RouteKind::Private => private_route(input.token_present, location),
        RouteKind::Auth => auth_route(input.token_present, location),
        RouteKind::TokenExchange => GuardDecision::Render,
    }
}

/// Renders only with a token; otherwise sends the user to login carrying the
/// requested location.
pub fn private_route(token_present: bool, location: &str) -> GuardDecision {
    if token_present {
        return GuardDecision::Render;
    }
    GuardDecision::Redirect {
        to: login_redirect(location),
    }
}

/// Renders only without a token, except for single-use token-exchange links.
pub fn auth_route(token_present: bool, location: &str) -> GuardDecision {
    if !token_present || Route::parse(location).kind() == RouteKind::TokenExchange {
        return GuardDecision::Render;
    }
    GuardDecision::Redirect {
        to: HOME_ROUTE.to_string(),
    }
}

pub fn login_redirect(location: &str) -> String {
    format!("{LOGIN_ROUTE}?next={}", urlencoding::encode(location))
}

/// Where to go after a successful login: the `next` parameter of the login
/// location when it names a local, non-auth path.
pub fn return_path(login_location: &str) -> Option<String> {
    if Route::parse(login_location) != Route::Login {
        return None;
    }
    let (_, query) = login_location.split_once('?')?;
    let query = query.split('#').next().unwrap_or_default();

    let raw = query
        .split('&')
        .find_map(|pair| pair.strip_prefix("next="))?;
    let next = urlencoding::decode(raw).ok()?.into_owned();

    if !next.starts_with('/') || next.starts_with("//") {
        return None;
    }
    match Route::parse(&next).kind() {
        RouteKind::Auth | RouteKind::TokenExchange => None,
        RouteKind::Private | RouteKind::Public => Some(next),
    }
}
