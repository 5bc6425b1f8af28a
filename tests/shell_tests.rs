use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tisn::{
    client::{
        AppContext, LANDING_ROUTE, LocaleSwitcher, LogoutState, MenuItem, NavigationShell,
        Navigator, SessionApi, ThemeMode, TransportError, UserFetch,
        navigation_view::{AppBarColor, profile_route},
    },
    models::{Notification, NotificationKind, User},
};
use uuid::Uuid;

// --- Test Doubles ---

type Scripted<T> = Mutex<VecDeque<(Duration, Result<T, TransportError>)>>;

/// Answers each call with the next scripted response, after its delay.
#[derive(Default)]
struct ScriptedApi {
    users: Scripted<UserFetch>,
    notifications: Scripted<Vec<Notification>>,
    user_calls: AtomicUsize,
    notification_calls: AtomicUsize,
    logout_calls: AtomicUsize,
}

impl ScriptedApi {
    fn user(&self, response: Result<UserFetch, TransportError>) -> &Self {
        self.delayed_user(Duration::ZERO, response)
    }

    fn delayed_user(&self, delay: Duration, response: Result<UserFetch, TransportError>) -> &Self {
        self.users.lock().unwrap().push_back((delay, response));
        self
    }

    fn notifications(&self, response: Result<Vec<Notification>, TransportError>) -> &Self {
        self.delayed_notifications(Duration::ZERO, response)
    }

    fn delayed_notifications(
        &self,
        delay: Duration,
        response: Result<Vec<Notification>, TransportError>,
    ) -> &Self {
        self.notifications
            .lock()
            .unwrap()
            .push_back((delay, response));
        self
    }

    fn user_calls(&self) -> usize {
        self.user_calls.load(Ordering::SeqCst)
    }

    fn notification_calls(&self) -> usize {
        self.notification_calls.load(Ordering::SeqCst)
    }

    fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }
}

async fn answer<T>(script: &Scripted<T>) -> Result<T, TransportError> {
    let next = script.lock().unwrap().pop_front();
    let (delay, response) = next.unwrap_or_else(|| {
        (
            Duration::ZERO,
            Err(TransportError::Malformed("unscripted call".to_string())),
        )
    });
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    response
}

#[async_trait]
impl SessionApi for ScriptedApi {
    async fn get_user(&self) -> Result<UserFetch, TransportError> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        answer(&self.users).await
    }

    async fn get_notifications(&self) -> Result<Vec<Notification>, TransportError> {
        self.notification_calls.fetch_add(1, Ordering::SeqCst);
        answer(&self.notifications).await
    }

    async fn log_out(&self) {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct RecordingNavigator {
    pushed: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    fn pushed(&self) -> Vec<String> {
        self.pushed.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn push(&self, route: &str) {
        self.pushed.lock().unwrap().push(route.to_string());
    }
}

struct RecordingLocale {
    current: Mutex<String>,
    changes: Mutex<Vec<String>>,
}

impl RecordingLocale {
    fn new(language: &str) -> Self {
        Self {
            current: Mutex::new(language.to_string()),
            changes: Mutex::new(Vec::new()),
        }
    }

    fn changes(&self) -> Vec<String> {
        self.changes.lock().unwrap().clone()
    }
}

impl LocaleSwitcher for RecordingLocale {
    fn language(&self) -> String {
        self.current.lock().unwrap().clone()
    }

    fn change_language(&self, locale: &str) {
        *self.current.lock().unwrap() = locale.to_string();
        self.changes.lock().unwrap().push(locale.to_string());
    }
}

// --- Helpers ---

struct Harness {
    api: Arc<ScriptedApi>,
    navigator: Arc<RecordingNavigator>,
    locale: Arc<RecordingLocale>,
    shell: Arc<NavigationShell>,
}

impl Harness {
    fn context(&self) -> &AppContext {
        self.shell.context()
    }
}

fn harness(api: ScriptedApi, language: &str) -> Harness {
    let api = Arc::new(api);
    let navigator = Arc::new(RecordingNavigator::default());
    let locale = Arc::new(RecordingLocale::new(language));
    let shell = Arc::new(NavigationShell::new(
        api.clone(),
        navigator.clone(),
        locale.clone(),
        AppContext::new(),
    ));
    Harness {
        api,
        navigator,
        locale,
        shell,
    }
}

fn user(n: u128, name: &str, locale: &str) -> User {
    User {
        id: Uuid::from_u128(n),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        avatar: None,
        preferred_locale: locale.to_string(),
        role: "member".to_string(),
        created_at: Utc::now(),
    }
}

fn notification(kind: NotificationKind) -> Notification {
    Notification {
        id: Uuid::new_v4(),
        kind,
        actor_id: None,
        text: kind.to_string(),
        is_read: false,
        created_at: Utc::now(),
    }
}

fn feed(messages: usize, regular: usize) -> Vec<Notification> {
    let mut notifications: Vec<Notification> = (0..messages)
        .map(|_| notification(NotificationKind::Message))
        .collect();
    notifications.extend((0..regular).map(|_| notification(NotificationKind::EventUpdate)));
    notifications
}

fn counts(context: &AppContext) -> Option<(usize, usize)> {
    context
        .notifications
        .get()
        .map(|buckets| (buckets.message_count(), buckets.regular_count()))
}

/// Lets spawned tasks run until `condition` holds.
async fn settle_until(condition: impl Fn() -> bool) {
    for _ in 0..1_000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never held");
}

// --- Tests ---

#[tokio::test]
async fn mount_loads_user_and_classified_notifications() {
    let api = ScriptedApi::default();
    api.user(Ok(UserFetch::Authenticated(user(1, "Ada", "en"))))
        .notifications(Ok(feed(2, 3)));
    let h = harness(api, "en");

    assert!(h.shell.status().loading);
    h.shell.mount().await;

    let status = h.shell.status();
    assert!(!status.loading);
    assert_eq!(status.error, None);
    assert_eq!(status.logout, LogoutState::Normal);
    assert_eq!(h.context().session.user().unwrap().name, "Ada");
    assert_eq!(counts(h.context()), Some((2, 3)));
    assert!(h.locale.changes().is_empty());
    assert!(h.navigator.pushed().is_empty());
}

#[tokio::test]
async fn mount_fetches_user_once() {
    let api = ScriptedApi::default();
    api.user(Ok(UserFetch::Authenticated(user(1, "Ada", "en"))))
        .notifications(Ok(Vec::new()));
    let h = harness(api, "en");

    h.shell.mount().await;
    h.shell.mount().await;

    assert_eq!(h.api.user_calls(), 1);
    assert_eq!(h.api.notification_calls(), 1);
    // An empty feed is still a known feed.
    assert_eq!(counts(h.context()), Some((0, 0)));
}

#[tokio::test]
async fn rejected_session_forces_a_single_logout() {
    let api = ScriptedApi::default();
    api.user(Ok(UserFetch::Rejected));
    let h = harness(api, "en");
    h.context().notifications.set(Default::default());

    h.shell.mount().await;

    assert!(h.shell.status().loading);
    assert_eq!(h.api.logout_calls(), 1);
    assert_eq!(h.navigator.pushed(), vec![LANDING_ROUTE.to_string()]);
    assert_eq!(h.shell.status().logout, LogoutState::PendingLogout);
    assert!(h.context().session.user().is_none());
    assert!(h.context().notifications.get().is_none());
    assert_eq!(h.api.notification_calls(), 0);

    // Terminal: nothing else logs out or fetches.
    h.shell.log_out().await;
    h.shell.sync_notifications().await;
    assert_eq!(h.api.logout_calls(), 1);
    assert_eq!(h.navigator.pushed().len(), 1);
    assert_eq!(h.api.notification_calls(), 0);
}

#[tokio::test]
async fn transport_failure_is_shown_without_logging_out() {
    let api = ScriptedApi::default();
    api.user(Err(TransportError::Status(502)));
    let h = harness(api, "en");

    h.shell.mount().await;

    let status = h.shell.status();
    assert!(!status.loading);
    assert_eq!(
        status.error.as_deref(),
        Some("server responded with status 502")
    );
    assert_eq!(status.logout, LogoutState::Normal);
    assert_eq!(h.api.logout_calls(), 0);
    assert!(h.navigator.pushed().is_empty());

    let view = h.shell.view();
    assert!(view.drawer.is_none());
    assert_eq!(view.error, status.error);

    h.shell.dismiss_error();
    assert_eq!(h.shell.view().error, None);
}

#[tokio::test]
async fn preferred_locale_is_applied_when_it_differs() {
    let api = ScriptedApi::default();
    api.user(Ok(UserFetch::Authenticated(user(1, "Ada", "es"))))
        .notifications(Ok(Vec::new()))
        .notifications(Ok(Vec::new()));
    let h = harness(api, "en");

    h.shell.mount().await;
    h.shell.sync_notifications().await;

    // The second sync finds the language already switched.
    assert_eq!(h.locale.changes(), vec!["es".to_string()]);
}

#[tokio::test]
async fn failed_refresh_keeps_last_known_notifications() {
    let api = ScriptedApi::default();
    api.user(Ok(UserFetch::Authenticated(user(1, "Ada", "en"))))
        .notifications(Ok(feed(1, 1)))
        .notifications(Err(TransportError::Status(500)));
    let h = harness(api, "en");

    h.shell.mount().await;
    h.shell.sync_notifications().await;

    let status = h.shell.status();
    assert!(!status.loading);
    assert!(status.error.is_some());
    assert_eq!(counts(h.context()), Some((1, 1)));
    assert_eq!(h.api.logout_calls(), 0);
}

#[tokio::test]
async fn identity_change_drops_previous_buckets() {
    let api = ScriptedApi::default();
    api.user(Ok(UserFetch::Authenticated(user(1, "Ada", "en"))))
        .notifications(Ok(feed(2, 0)))
        .notifications(Err(TransportError::Status(500)));
    let h = harness(api, "en");

    h.shell.mount().await;
    assert_eq!(counts(h.context()), Some((2, 0)));

    h.context().session.set_user(Some(user(2, "Bob", "en")));
    h.shell.sync_notifications().await;

    // Bob's fetch failed; Ada's badges must not show for Bob.
    assert_eq!(counts(h.context()), None);
    assert!(h.shell.status().error.is_some());
}

#[tokio::test]
async fn signing_out_clears_buckets() {
    let api = ScriptedApi::default();
    api.user(Ok(UserFetch::Authenticated(user(1, "Ada", "en"))))
        .notifications(Ok(feed(1, 0)));
    let h = harness(api, "en");

    h.shell.mount().await;
    h.context().session.set_user(None);
    h.shell.sync_notifications().await;

    assert_eq!(counts(h.context()), None);
    assert_eq!(h.api.notification_calls(), 1);
    assert!(!h.shell.status().loading);
}

#[tokio::test(start_paused = true)]
async fn superseded_fetch_never_overwrites_newer_identity() {
    let api = ScriptedApi::default();
    api.user(Ok(UserFetch::Authenticated(user(1, "Ada", "en"))))
        .delayed_notifications(Duration::from_millis(500), Ok(feed(5, 5)))
        .delayed_notifications(Duration::from_millis(10), Ok(feed(1, 0)));
    let h = harness(api, "en");

    let shell = h.shell.clone();
    let slow_mount = tokio::spawn(async move { shell.mount().await });
    settle_until(|| h.api.notification_calls() == 1).await;

    h.context().session.set_user(Some(user(2, "Bob", "en")));
    h.shell.sync_notifications().await;
    assert_eq!(counts(h.context()), Some((1, 0)));

    // Ada's answer arrives last and is discarded.
    slow_mount.await.unwrap();
    assert_eq!(counts(h.context()), Some((1, 0)));
    assert_eq!(h.context().session.user().unwrap().name, "Bob");
    assert!(!h.shell.status().loading);
}

#[tokio::test(start_paused = true)]
async fn unmount_cancels_in_flight_user_fetch() {
    let api = ScriptedApi::default();
    api.delayed_user(
        Duration::from_secs(5),
        Ok(UserFetch::Authenticated(user(1, "Ada", "en"))),
    );
    let h = harness(api, "en");

    let shell = h.shell.clone();
    let mount = tokio::spawn(async move { shell.mount().await });
    settle_until(|| h.api.user_calls() == 1).await;

    h.shell.unmount();
    mount.await.unwrap();

    assert!(h.shell.is_unmounted());
    assert!(h.context().session.user().is_none());
    assert_eq!(h.api.notification_calls(), 0);
    assert_eq!(h.api.logout_calls(), 0);
    assert!(h.navigator.pushed().is_empty());
}

#[tokio::test(start_paused = true)]
async fn unmount_discards_in_flight_notifications() {
    let api = ScriptedApi::default();
    api.user(Ok(UserFetch::Authenticated(user(1, "Ada", "en"))))
        .delayed_notifications(Duration::from_secs(5), Ok(feed(3, 3)));
    let h = harness(api, "en");

    let shell = h.shell.clone();
    let mount = tokio::spawn(async move { shell.mount().await });
    settle_until(|| h.api.notification_calls() == 1).await;

    h.shell.unmount();
    mount.await.unwrap();

    assert_eq!(h.context().session.user().unwrap().name, "Ada");
    assert_eq!(counts(h.context()), None);
}

#[tokio::test]
async fn identity_watcher_refetches_for_new_user_only() {
    let api = ScriptedApi::default();
    api.user(Ok(UserFetch::Authenticated(user(1, "Ada", "en"))))
        .notifications(Ok(feed(1, 0)))
        .notifications(Ok(feed(0, 4)));
    let h = harness(api, "en");

    let shell = h.shell.clone();
    let watcher = tokio::spawn(async move { shell.watch_identity().await });
    tokio::task::yield_now().await;

    h.shell.mount().await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    // The watcher saw Ada but the mount already loaded her notifications.
    assert_eq!(h.api.notification_calls(), 1);

    h.context().session.set_user(Some(user(2, "Bob", "en")));
    settle_until(|| counts(h.context()) == Some((0, 4))).await;
    assert_eq!(h.api.notification_calls(), 2);

    h.context().session.set_user(None);
    settle_until(|| counts(h.context()).is_none()).await;

    h.shell.unmount();
    watcher.await.unwrap();
    assert_eq!(h.api.notification_calls(), 2);
}

#[tokio::test]
async fn drawer_entries_navigate_and_toggle() {
    let api = ScriptedApi::default();
    let ada = user(1, "Ada", "en");
    api.user(Ok(UserFetch::Authenticated(ada.clone())))
        .notifications(Ok(Vec::new()));
    let h = harness(api, "en");
    h.shell.mount().await;

    h.shell.toggle_drawer();
    assert!(h.shell.status().drawer_open);

    h.shell.select(MenuItem::Events).await;
    assert!(!h.shell.status().drawer_open);

    h.shell.select(MenuItem::MyProfile).await;
    assert!(h.shell.status().drawer_open);

    h.shell.select(MenuItem::LogOut).await;
    let status = h.shell.status();
    assert!(!status.drawer_open);
    assert_eq!(status.logout, LogoutState::PendingLogout);
    assert_eq!(h.api.logout_calls(), 1);

    assert_eq!(
        h.navigator.pushed(),
        vec![
            "/events".to_string(),
            profile_route(ada.id),
            LANDING_ROUTE.to_string(),
        ]
    );
}

#[tokio::test]
async fn app_bar_shortcuts_navigate() {
    let api = ScriptedApi::default();
    let ada = user(1, "Ada", "en");
    api.user(Ok(UserFetch::Authenticated(ada.clone())))
        .notifications(Ok(Vec::new()));
    let h = harness(api, "en");
    h.shell.mount().await;

    h.shell.open_chats();
    h.shell.open_notifications();
    h.shell.open_profile();

    assert_eq!(
        h.navigator.pushed(),
        vec![
            "/chats".to_string(),
            "/notifications".to_string(),
            profile_route(ada.id),
        ]
    );
}

#[tokio::test]
async fn view_follows_session_and_theme() {
    let api = ScriptedApi::default();
    api.user(Ok(UserFetch::Authenticated(user(1, "Ada", "en"))))
        .notifications(Ok(feed(2, 1)));
    let h = harness(api, "en");

    let before = h.shell.view();
    assert!(before.drawer.is_none());
    assert_eq!(before.app_bar.chat_badge, None);
    assert_eq!(before.app_bar.notification_badge, None);

    h.shell.mount().await;
    let after = h.shell.view();
    let drawer = after.drawer.expect("drawer for a signed-in user");
    assert_eq!(drawer.header.name, "Ada");
    assert!(!drawer.open);
    assert_eq!(after.app_bar.chat_badge, Some(2));
    assert_eq!(after.app_bar.notification_badge, Some(1));
    assert_eq!(after.app_bar.color, AppBarColor::Primary);

    h.shell.toggle_theme();
    assert_eq!(h.context().theme.mode(), ThemeMode::Dark);
    assert_eq!(h.shell.view().app_bar.color, AppBarColor::Inherit);
}

#[tokio::test(start_paused = true)]
async fn late_transport_failure_after_logout_is_ignored() {
    let api = ScriptedApi::default();
    api.delayed_user(Duration::from_secs(1), Err(TransportError::Status(502)));
    let h = harness(api, "en");

    let shell = h.shell.clone();
    let mount = tokio::spawn(async move { shell.mount().await });
    settle_until(|| h.api.user_calls() == 1).await;

    h.shell.log_out().await;
    mount.await.unwrap();

    let status = h.shell.status();
    assert_eq!(status.logout, LogoutState::PendingLogout);
    assert_eq!(status.error, None);
    assert!(status.loading);
    assert_eq!(h.api.logout_calls(), 1);
    assert_eq!(h.navigator.pushed(), vec![LANDING_ROUTE.to_string()]);
}
