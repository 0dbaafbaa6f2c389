//! Action creators. Each one allocates a request id, dispatches the REQUEST,
//! performs one HTTP call, then dispatches exactly one SUCCESS or FAILURE.
//! Side effects (navigation, dependent re-fetches) run only after SUCCESS.

use std::sync::Arc;

use tracing::debug;
use tracing::warn;

use nbhub_core::config::AppConfig;
use nbhub_core::ApiFailure;
use nbhub_core::AppAction;
use nbhub_core::Op;
use nbhub_core::RequestId;
use nbhub_core::RoutingAction;
use nbhub_core::SessionContext;
use nbhub_core::StoreHandle;

use crate::client::HttpClient;
use crate::contracts::ApiResponse;
use crate::contracts::RequestDescriptor;
use crate::endpoints::Endpoints;

pub mod auth;
pub mod home;
pub mod project;
pub mod settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Succeeded)
    }

    fn of<T>(data: &Option<T>) -> Self {
        if data.is_some() {
            Self::Succeeded
        } else {
            Self::Failed
        }
    }
}

/// Everything a creator needs: the store it dispatches into, the HTTP
/// boundary, the live session and the resolved configuration.
pub struct AppContext<C> {
    pub store: StoreHandle,
    pub client: Arc<C>,
    pub session: SessionContext,
    pub endpoints: Endpoints,
    pub config: AppConfig,
}

impl<C> Clone for AppContext<C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            client: Arc::clone(&self.client),
            session: self.session.clone(),
            endpoints: self.endpoints.clone(),
            config: self.config.clone(),
        }
    }
}

impl<C: HttpClient> AppContext<C> {
    pub fn new(
        store: StoreHandle,
        client: Arc<C>,
        session: SessionContext,
        config: AppConfig,
    ) -> Self {
        let endpoints = Endpoints::new(&config.api.base_url);
        Self {
            store,
            client,
            session,
            endpoints,
            config,
        }
    }

    pub fn location(&self) -> String {
        self.store.read(|state| state.routing.location.clone())
    }

    /// Resource namespace of the signed-in account.
    pub fn namespace(&self) -> Option<String> {
        self.store.read(|state| state.auth.username.clone())
    }

    pub fn navigate(&self, path: impl Into<String>) {
        self.store
            .dispatch(RoutingAction::LocationChanged { path: path.into() });
    }

    fn begin<T, A, W>(&self, wrap: W) -> RequestId
    where
        A: Into<AppAction>,
        W: Fn(Op<T>) -> A,
    {
        let request_id = self.store.next_request_id();
        self.store.dispatch(wrap(Op::Request { request_id }));
        request_id
    }

    fn finish<T, A, W>(
        &self,
        wrap: W,
        request_id: RequestId,
        result: Result<T, ApiFailure>,
    ) -> Option<T>
    where
        T: Clone,
        A: Into<AppAction>,
        W: Fn(Op<T>) -> A,
    {
        match result {
            Ok(data) => {
                self.store.dispatch(wrap(Op::Success {
                    request_id,
                    data: data.clone(),
                }));
                Some(data)
            }
            Err(error) => {
                debug!(%request_id, status = ?error.status, "request failed");
                let unauthorized = error.is_unauthorized();
                self.store.dispatch(wrap(Op::Failure { request_id, error }));
                if unauthorized
                    && self.config.session.logout_on_unauthorized
                    && self.session.token_present()
                {
                    warn!("session rejected by the server, logging out");
                    self.logout();
                }
                None
            }
        }
    }

    async fn call<T, A, W>(
        &self,
        wrap: W,
        request: RequestDescriptor,
        decode: impl FnOnce(ApiResponse) -> Result<T, ApiFailure>,
    ) -> Option<T>
    where
        T: Clone,
        A: Into<AppAction>,
        W: Fn(Op<T>) -> A + Copy,
    {
        let request_id = self.begin(wrap);
        let sent = match request.encoding_failure() {
            Some(failure) => Err(failure),
            None => self.client.send(request).await,
        };
        let result = sent.and_then(decode);
        self.finish(wrap, request_id, result)
    }
}
