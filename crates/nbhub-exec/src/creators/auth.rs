use tracing::info;
use tracing::warn;

use nbhub_core::guard::return_path;
use nbhub_core::models::LoginSuccess;
use nbhub_core::models::RegisteredUser;
use nbhub_core::routes::HOME_ROUTE;
use nbhub_core::routes::LOGIN_ROUTE;
use nbhub_core::ApiFailure;
use nbhub_core::AppAction;
use nbhub_core::AuthAction;

use super::AppContext;
use super::Outcome;
use crate::client::HttpClient;
use crate::contracts::ApiResponse;
use crate::contracts::Credentials;
use crate::contracts::PasswordReset;
use crate::contracts::Registration;
use crate::contracts::RequestDescriptor;
use crate::contracts::TokenExchange;

impl<C: HttpClient> AppContext<C> {
    pub async fn login(&self, credentials: Credentials) -> Outcome {
        let request =
            RequestDescriptor::post_json(self.endpoints.login(), &credentials).public();
        let username = credentials.username;
        let login = self
            .call(AuthAction::Login, request, |response| {
                self.accept_login(response, Some(username.as_str()))
            })
            .await;
        self.after_login(&login);
        Outcome::of(&login)
    }

    /// Exchanges a single-use token from an emailed link for a session.
    pub async fn token_login(&self, token: &str) -> Outcome {
        let body = TokenExchange {
            token: token.to_string(),
        };
        let request =
            RequestDescriptor::post_json(self.endpoints.token_exchange(), &body).public();
        let login = self
            .call(AuthAction::TokenLogin, request, |response| {
                self.accept_login(response, None)
            })
            .await;
        self.after_login(&login);
        Outcome::of(&login)
    }

    pub async fn register(&self, registration: Registration) -> Outcome {
        let request =
            RequestDescriptor::post_json(self.endpoints.register(), &registration).public();
        let user = self
            .call(
                AuthAction::Register,
                request,
                ApiResponse::decode::<RegisteredUser>,
            )
            .await;
        if user.is_some() {
            self.navigate(LOGIN_ROUTE);
        }
        Outcome::of(&user)
    }

    pub async fn reset_password(&self, email: &str) -> Outcome {
        let body = PasswordReset {
            email: email.to_string(),
        };
        let request =
            RequestDescriptor::post_json(self.endpoints.reset_password(), &body).public();
        let sent = self
            .call(AuthAction::ResetPassword, request, |_| Ok(()))
            .await;
        Outcome::of(&sent)
    }

    /// Resets every slice, wipes durable storage and the session token, then
    /// lands on the login page.
    pub fn logout(&self) {
        self.store.dispatch(AppAction::Logout);
        if let Err(err) = self.store.purge() {
            warn!(error = %err, "failed to purge persisted state");
        }
        if let Err(err) = self.session.clear() {
            warn!(error = %err, "failed to clear session token");
        }
        self.navigate(LOGIN_ROUTE);
        info!("logged out");
    }

    /// Decodes the login payload and stores the token. Runs before SUCCESS is
    /// dispatched.
    fn accept_login(
        &self,
        response: ApiResponse,
        username: Option<&str>,
    ) -> Result<LoginSuccess, ApiFailure> {
        let mut login = response.decode::<LoginSuccess>()?;
        if login.username.is_none() {
            login.username = username.map(str::to_string);
        }
        self.session
            .set_token(&login.token)
            .map_err(|err| ApiFailure::local(format!("Could not save the session: {err}")))?;
        Ok(login)
    }

    fn after_login(&self, login: &Option<LoginSuccess>) {
        let Some(login) = login else {
            return;
        };
        info!(username = login.username.as_deref().unwrap_or("?"), "logged in");
        let target = return_path(&self.location()).unwrap_or_else(|| HOME_ROUTE.to_string());
        self.navigate(target);
    }
}
