use std::sync::OnceLock;

use regex::Regex;

pub const HOME_ROUTE: &str = "/";
pub const LOGIN_ROUTE: &str = "/login";
pub const REGISTER_ROUTE: &str = "/register";
pub const RESET_PASSWORD_ROUTE: &str = "/reset-password";
pub const HEALTH_ROUTE: &str = "/health";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// Only reachable without a session.
    Auth,
    /// Single-use login link; renders regardless of session.
    TokenExchange,
    Private,
    Public,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    ResetPassword,
    TokenExchange { token: String },
    Home,
    Project {
        namespace: String,
        project_id: String,
        section: Option<String>,
    },
    Settings,
    Billing,
    Health,
    Unknown(String),
}

fn token_exchange_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^/auth/token/([^/]+)/?$").expect("Invalid token route regex")
    })
}

fn project_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^/([^/]+)/projects/([^/]+)(?:/([^/]+))?/?$")
            .expect("Invalid project route regex")
    })
}

/// Drops query string and fragment.
pub fn route_path(location: &str) -> &str {
    let end = location.find(['?', '#']).unwrap_or(location.len());
    &location[..end]
}

impl Route {
    pub fn parse(location: &str) -> Self {
        let path = route_path(location);
        let trimmed = match path.trim_end_matches('/') {
            "" => HOME_ROUTE,
            other => other,
        };

        match trimmed {
            HOME_ROUTE => return Self::Home,
            LOGIN_ROUTE => return Self::Login,
            REGISTER_ROUTE => return Self::Register,
            RESET_PASSWORD_ROUTE => return Self::ResetPassword,
            HEALTH_ROUTE => return Self::Health,
            _ => {}
        }

        if let Some(caps) = token_exchange_pattern().captures(path) {
            return Self::TokenExchange {
                token: caps[1].to_string(),
            };
        }
        if let Some(caps) = project_pattern().captures(path) {
            return Self::Project {
                namespace: caps[1].to_string(),
                project_id: caps[2].to_string(),
                section: caps.get(3).map(|m| m.as_str().to_string()),
            };
        }
        if trimmed == "/settings" || trimmed.starts_with("/settings/") {
            return Self::Settings;
        }
        if trimmed == "/billing" || trimmed.starts_with("/billing/") {
            return Self::Billing;
        }
        Self::Unknown(path.to_string())
    }

    pub fn kind(&self) -> RouteKind {
        match self {
            Self::Login | Self::Register | Self::ResetPassword => RouteKind::Auth,
            Self::TokenExchange { .. } => RouteKind::TokenExchange,
            Self::Health => RouteKind::Public,
            Self::Home
            | Self::Project { .. }
            | Self::Settings
            | Self::Billing
            | Self::Unknown(_) => RouteKind::Private,
        }
    }
}

pub fn project_path(namespace: &str, project_id: &str) -> String {
    format!("/{namespace}/projects/{project_id}")
}

pub fn token_exchange_path(token: &str) -> String {
    format!("/auth/token/{token}")
}
