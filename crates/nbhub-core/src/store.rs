use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use tracing::debug;
use tracing::warn;

use super::actions::AppAction;
use super::actions::RequestId;
use super::guard::GuardInput;
use super::persistence::load_slice;
use super::persistence::save_slice;
use super::persistence::PersistedAuth;
use super::persistence::PersistedSlice;
use super::persistence::PersistenceError;
use super::persistence::StateStorage;
use super::reducer::reduce;
use super::reducer::Reduction;
use super::state::RootState;

const ACTION_LOG_CAPACITY: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rehydration {
    Pending,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    pub seq: u64,
    pub type_name: String,
    pub request_id: Option<RequestId>,
    pub reduction: Reduction,
}

/// Bounded, sequence-numbered history of dispatched actions.
#[derive(Debug, Clone)]
pub struct ActionLog {
    cap: usize,
    next_seq: u64,
    buf: VecDeque<ActionRecord>,
}

impl ActionLog {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            next_seq: 1,
            buf: VecDeque::with_capacity(cap),
        }
    }

    fn record(&mut self, action: &AppAction, reduction: Reduction) {
        if self.cap == 0 {
            return;
        }
        let entry = ActionRecord {
            seq: self.next_seq,
            type_name: action.type_name(),
            request_id: action.request_id(),
            reduction,
        };
        self.next_seq += 1;

        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(entry);
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.next_seq = 1;
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionRecord> {
        self.buf.iter()
    }

    pub fn type_names(&self) -> Vec<String> {
        self.buf.iter().map(|entry| entry.type_name.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

pub type Listener = Box<dyn Fn(&RootState, &AppAction) + Send>;

/// Owns the state tree. The only way to change it is [`Store::dispatch`].
pub struct Store {
    state: RootState,
    storage: Arc<dyn StateStorage>,
    rehydration: Rehydration,
    last_written: Option<PersistedAuth>,
    log: ActionLog,
    listeners: Vec<Listener>,
    next_request: u64,
    session_floor: RequestId,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("rehydration", &self.rehydration)
            .field("listeners", &self.listeners.len())
            .field("next_request", &self.next_request)
            .field("session_floor", &self.session_floor)
            .finish_non_exhaustive()
    }
}

impl Store {
    pub fn new(storage: Arc<dyn StateStorage>) -> Self {
        Self {
            state: RootState::default(),
            storage,
            rehydration: Rehydration::Pending,
            last_written: None,
            log: ActionLog::new(ACTION_LOG_CAPACITY),
            listeners: Vec::new(),
            next_request: 1,
            session_floor: RequestId::default(),
        }
    }

    pub fn state(&self) -> &RootState {
        &self.state
    }

    pub fn rehydration(&self) -> Rehydration {
        self.rehydration
    }

    pub fn actions(&self) -> &ActionLog {
        &self.log
    }

    pub fn storage(&self) -> &Arc<dyn StateStorage> {
        &self.storage
    }

    pub fn guard_input(&self) -> GuardInput {
        GuardInput {
            rehydrated: self.rehydration == Rehydration::Done,
            token_present: self.state.auth.token_present,
        }
    }

    pub fn next_request_id(&mut self) -> RequestId {
        let id = RequestId(self.next_request);
        self.next_request += 1;
        id
    }

    /// Reads the persisted slice back and opens the persistence gate.
    ///
    /// Calling it again after completion is a no-op.
    pub fn rehydrate(&mut self) -> Result<(), PersistenceError> {
        if self.rehydration == Rehydration::Done {
            return Ok(());
        }
        let loaded = load_slice(self.storage.as_ref());
        // An unreadable store still opens the gate; the next write replaces it.
        let slice = match loaded {
            Ok(slice) => slice,
            Err(err) => {
                self.rehydration = Rehydration::Done;
                return Err(err);
            }
        };
        if let Some(slice) = slice {
            self.last_written = Some(slice.auth.clone());
            self.dispatch(AppAction::Rehydrate(slice));
        }
        self.rehydration = Rehydration::Done;
        debug!(token_present = self.state.auth.token_present, "store rehydrated");
        Ok(())
    }

    pub fn dispatch(&mut self, action: AppAction) -> Reduction {
        if matches!(action, AppAction::Logout) {
            self.state = RootState::default();
            self.session_floor = RequestId(self.next_request);
        }
        // Responses to requests issued before the last logout belong to a
        // session that no longer exists.
        let reduction = match action.request_id() {
            Some(request_id) if request_id < self.session_floor => Reduction::Stale,
            _ => reduce(&mut self.state, &action),
        };
        debug!(
            action = %action.type_name(),
            request = ?action.request_id(),
            outcome = ?reduction,
            "dispatch"
        );
        self.log.record(&action, reduction);
        self.persist();
        for listener in &self.listeners {
            listener(&self.state, &action);
        }
        reduction
    }

    /// Listeners run synchronously inside `dispatch` and must not dispatch.
    pub fn subscribe(&mut self, listener: impl Fn(&RootState, &AppAction) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Clears durable storage. The in-memory tree is left alone and counts as
    /// written, so later dispatches only persist once identity changes again.
    pub fn purge(&mut self) -> Result<(), PersistenceError> {
        self.storage.clear()?;
        self.last_written = Some(PersistedAuth::from_state(&self.state));
        Ok(())
    }

    fn persist(&mut self) {
        if self.rehydration == Rehydration::Pending {
            return;
        }
        let auth = PersistedAuth::from_state(&self.state);
        if self.last_written.as_ref() == Some(&auth) {
            return;
        }
        match save_slice(self.storage.as_ref(), &PersistedSlice::new(auth.clone())) {
            Ok(()) => self.last_written = Some(auth),
            Err(err) => warn!(error = %err, "failed to persist state"),
        }
    }
}

/// Shared handle used by action creators. Locks are short and never held
/// across an await point.
#[derive(Clone)]
pub struct StoreHandle {
    inner: Arc<Mutex<Store>>,
}

impl fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StoreHandle").finish()
    }
}

impl StoreHandle {
    pub fn new(store: Store) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut Store) -> R) -> R {
        let mut store = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut store)
    }

    pub fn dispatch(&self, action: impl Into<AppAction>) -> Reduction {
        let action = action.into();
        self.with(|store| store.dispatch(action))
    }

    pub fn next_request_id(&self) -> RequestId {
        self.with(Store::next_request_id)
    }

    pub fn read<R>(&self, f: impl FnOnce(&RootState) -> R) -> R {
        self.with(|store| f(store.state()))
    }

    pub fn snapshot(&self) -> RootState {
        self.read(RootState::clone)
    }

    pub fn rehydrate(&self) -> Result<(), PersistenceError> {
        self.with(Store::rehydrate)
    }

    pub fn purge(&self) -> Result<(), PersistenceError> {
        self.with(Store::purge)
    }

    pub fn guard_input(&self) -> GuardInput {
        self.with(|store| store.guard_input())
    }

    pub fn action_types(&self) -> Vec<String> {
        self.with(|store| store.actions().type_names())
    }
}
