//! Session and notification bootstrap behind the navigation bar and drawer.
//!
//! Lifecycle of one mounted shell:
//!
//! ```text
//! mount ──► GET /me ──┬─ user ──────► store user ──► GET /notifications ──► classify ──► store
//!                     ├─ error body ─► forced logout (clear, log out, /welcome)
//!                     └─ transport ──► show error
//! ```
//!
//! Forced logout is terminal: once `PendingLogout` is entered no further
//! fetch results are applied. `unmount` cancels whatever is still in flight.

use std::{
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::sync::watch;
use uuid::Uuid;

use super::{
    api::{SessionApi, UserFetch},
    classify::classify_notifications,
    context::AppContext,
    navigation_view::{
        CHATS_ROUTE, MenuAction, MenuItem, NOTIFICATIONS_ROUTE, ShellInputs, ShellView,
        profile_route, render_shell,
    },
};
use crate::models::User;

/// Public route the user lands on after being logged out.
pub const LANDING_ROUTE: &str = "/welcome";

/// Router abstraction; records where the UI should go.
pub trait Navigator: Send + Sync {
    fn push(&self, route: &str);
}

/// i18n abstraction; the active display language.
pub trait LocaleSwitcher: Send + Sync {
    fn language(&self) -> String;
    fn change_language(&self, locale: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutState {
    Normal,
    /// Terminal for this shell instance.
    PendingLogout,
}

/// Observable status of the shell.
#[derive(Debug, Clone, PartialEq)]
pub struct ShellStatus {
    pub loading: bool,
    pub error: Option<String>,
    pub logout: LogoutState,
    pub drawer_open: bool,
}

struct ShellState {
    status: ShellStatus,
    mounted: bool,
    // Bumped whenever a notification fetch starts or the identity goes away.
    // A fetch only applies its result while its generation is still current.
    generation: u64,
    // Identity whose buckets the notification context currently holds.
    notifications_owner: Option<Uuid>,
}

impl ShellState {
    fn accepts_updates(&self) -> bool {
        self.status.logout == LogoutState::Normal
    }
}

/// NavigationShell
///
/// Owns the bootstrap flow and drawer state of the navigation bar. Shared
/// state is read and written only through the `AppContext` it was given.
pub struct NavigationShell {
    api: Arc<dyn SessionApi>,
    navigator: Arc<dyn Navigator>,
    locale: Arc<dyn LocaleSwitcher>,
    context: AppContext,
    state: Mutex<ShellState>,
    unmounted: watch::Sender<bool>,
}

impl NavigationShell {
    pub fn new(
        api: Arc<dyn SessionApi>,
        navigator: Arc<dyn Navigator>,
        locale: Arc<dyn LocaleSwitcher>,
        context: AppContext,
    ) -> Self {
        Self {
            api,
            navigator,
            locale,
            context,
            state: Mutex::new(ShellState {
                status: ShellStatus {
                    loading: true,
                    error: None,
                    logout: LogoutState::Normal,
                    drawer_open: false,
                },
                mounted: false,
                generation: 0,
                notifications_owner: None,
            }),
            unmounted: watch::channel(false).0,
        }
    }

    // Never held across an await.
    fn state(&self) -> MutexGuard<'_, ShellState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub fn status(&self) -> ShellStatus {
        self.state().status.clone()
    }

    pub fn is_unmounted(&self) -> bool {
        *self.unmounted.borrow()
    }

    /// Runs `fut` unless the shell is unmounted first; `None` means cancelled.
    async fn until_unmounted<F: Future>(&self, fut: F) -> Option<F::Output> {
        let mut unmounted = self.unmounted.subscribe();
        if *unmounted.borrow_and_update() {
            return None;
        }
        tokio::select! {
            output = fut => Some(output),
            // The flag only ever flips to true.
            _ = unmounted.changed() => None,
        }
    }

    /// mount
    ///
    /// Session bootstrap. Issues exactly one current-user request per shell;
    /// later calls return immediately.
    pub async fn mount(&self) {
        {
            let mut state = self.state();
            if state.mounted || self.is_unmounted() {
                return;
            }
            state.mounted = true;
            state.status.loading = true;
            state.status.error = None;
        }

        let Some(outcome) = self.until_unmounted(self.api.get_user()).await else {
            tracing::debug!("user fetch cancelled by unmount");
            return;
        };

        match outcome {
            Ok(UserFetch::Authenticated(user)) => {
                tracing::debug!(user_id = %user.id, "session resolved");
                let generation = {
                    let mut state = self.state();
                    if !state.accepts_updates() {
                        return;
                    }
                    state.status.loading = false;
                    // Claimed before publishing the user so an identity watcher
                    // sees this identity as already handled.
                    self.claim_generation(&mut state, user.id)
                };
                self.context.session.set_user(Some(user.clone()));
                self.load_notifications(generation, &user).await;
            }
            Ok(UserFetch::Rejected) => {
                tracing::info!("session rejected by server, logging out");
                self.force_logout().await;
            }
            Err(e) => {
                tracing::warn!("user fetch failed: {}", e);
                let mut state = self.state();
                if !state.accepts_updates() {
                    return;
                }
                state.status.error = Some(e.to_string());
                state.status.loading = false;
            }
        }
    }

    /// Starts a fetch for `user_id`: drops buckets that belong to a different
    /// identity and returns the generation the result must match.
    fn claim_generation(&self, state: &mut ShellState, user_id: Uuid) -> u64 {
        state.generation += 1;
        if state.notifications_owner != Some(user_id) {
            self.context.notifications.clear();
            state.notifications_owner = Some(user_id);
        }
        state.status.loading = true;
        state.status.error = None;
        state.generation
    }

    /// sync_notifications
    ///
    /// Notification bootstrap for the current identity. On failure the error
    /// is shown and the last buckets of the same identity stay in place.
    pub async fn sync_notifications(&self) {
        if self.is_unmounted() {
            return;
        }

        let Some(user) = self.context.session.user() else {
            self.release_identity();
            return;
        };

        let generation = {
            let mut state = self.state();
            if !state.accepts_updates() {
                return;
            }
            self.claim_generation(&mut state, user.id)
        };

        self.load_notifications(generation, &user).await;
    }

    async fn load_notifications(&self, generation: u64, user: &User) {
        if user.preferred_locale != self.locale.language() {
            self.locale.change_language(&user.preferred_locale);
        }

        let Some(result) = self.until_unmounted(self.api.get_notifications()).await else {
            tracing::debug!("notification fetch cancelled by unmount");
            return;
        };

        let mut state = self.state();
        if state.generation != generation || !state.accepts_updates() {
            tracing::debug!(user_id = %user.id, "discarding superseded notification fetch");
            return;
        }

        match result {
            Ok(notifications) => {
                let classified = classify_notifications(notifications);
                tracing::debug!(
                    message = classified.message_count(),
                    regular = classified.regular_count(),
                    "notifications loaded"
                );
                self.context.notifications.set(classified);
            }
            Err(e) => {
                tracing::warn!("notification fetch failed: {}", e);
                state.status.error = Some(e.to_string());
            }
        }
        state.status.loading = false;
    }

    fn release_identity(&self) {
        let mut state = self.state();
        state.generation += 1;
        if state.notifications_owner.take().is_some() {
            self.context.notifications.clear();
        }
        state.status.loading = false;
    }

    /// watch_identity
    ///
    /// Re-runs the notification bootstrap every time the session user changes
    /// to a different identity (re-login, sign-out) until the shell is
    /// unmounted. Identities the shell resolved itself are not fetched twice.
    pub async fn watch_identity(&self) {
        let mut session = self.context.session.subscribe();
        session.borrow_and_update();

        loop {
            match self.until_unmounted(session.changed()).await {
                Some(Ok(())) => {}
                _ => return,
            }
            let current = session.borrow_and_update().as_ref().map(|user| user.id);
            let owner = self.state().notifications_owner;
            if current != owner {
                self.sync_notifications().await;
            }
        }
    }

    /// Enters `PendingLogout` once: clears the session, invalidates it with the
    /// API collaborator and navigates to the landing route.
    async fn force_logout(&self) {
        {
            let mut state = self.state();
            if state.status.logout == LogoutState::PendingLogout {
                return;
            }
            state.status.logout = LogoutState::PendingLogout;
            state.status.drawer_open = false;
            state.generation += 1;
            state.notifications_owner = None;
        }

        self.context.session.set_user(None);
        self.context.notifications.clear();
        self.api.log_out().await;
        self.navigator.push(LANDING_ROUTE);
    }

    /// User-initiated logout.
    pub async fn log_out(&self) {
        self.force_logout().await;
    }

    /// Cancels in-flight fetches; their results are dropped.
    pub fn unmount(&self) {
        self.unmounted.send_replace(true);
    }

    pub fn toggle_drawer(&self) {
        let mut state = self.state();
        state.status.drawer_open = !state.status.drawer_open;
    }

    pub fn dismiss_error(&self) {
        self.state().status.error = None;
    }

    /// Handles a click on a drawer entry. The drawer toggles as it does for
    /// every entry.
    pub async fn select(&self, item: MenuItem) {
        let Some(user_id) = self.context.session.user_id() else {
            return;
        };

        match item.action(user_id) {
            MenuAction::Navigate(route) => self.navigator.push(&route),
            MenuAction::LogOut => self.force_logout().await,
        }

        // Logging out already closed it.
        if item != MenuItem::LogOut {
            self.toggle_drawer();
        }
    }

    /// Click on the profile header of the drawer.
    pub fn open_profile(&self) {
        if let Some(user_id) = self.context.session.user_id() {
            self.navigator.push(&profile_route(user_id));
            self.toggle_drawer();
        }
    }

    pub fn open_chats(&self) {
        self.navigator.push(CHATS_ROUTE);
    }

    pub fn open_notifications(&self) {
        self.navigator.push(NOTIFICATIONS_ROUTE);
    }

    pub fn toggle_theme(&self) {
        self.context.theme.toggle();
    }

    /// Renders the current state.
    pub fn view(&self) -> ShellView {
        let status = self.status();
        let user = self.context.session.user();
        let notifications = self.context.notifications.get();

        render_shell(&ShellInputs {
            user: user.as_ref(),
            notifications: notifications.as_ref(),
            theme: self.context.theme.mode(),
            loading: status.loading,
            drawer_open: status.drawer_open,
            error: status.error.as_deref(),
        })
    }
}

impl Drop for NavigationShell {
    fn drop(&mut self) {
        self.unmount();
    }
}
