use std::sync::Arc;

use tokio::sync::watch;
use uuid::Uuid;

use super::classify::ClassifiedNotifications;
use crate::models::User;

/// ThemeMode
///
/// Palette type of the UI. Only the toggle and the icon choice live here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// SessionContext
///
/// The signed-in user shared between views. Clones share the same value;
/// every write goes through `set_user`.
#[derive(Clone)]
pub struct SessionContext {
    user: Arc<watch::Sender<Option<User>>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            user: Arc::new(watch::channel(None).0),
        }
    }

    pub fn user(&self) -> Option<User> {
        self.user.borrow().clone()
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user.borrow().as_ref().map(|user| user.id)
    }

    /// Replaces the whole user; `None` signs out.
    pub fn set_user(&self, user: Option<User>) {
        self.user.send_replace(user);
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.user.subscribe()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// NotificationContext
///
/// Classified notifications of the current identity. `None` means nothing has
/// been loaded for it yet, which hides the badges.
#[derive(Clone)]
pub struct NotificationContext {
    buckets: Arc<watch::Sender<Option<ClassifiedNotifications>>>,
}

impl NotificationContext {
    pub fn new() -> Self {
        Self {
            buckets: Arc::new(watch::channel(None).0),
        }
    }

    pub fn get(&self) -> Option<ClassifiedNotifications> {
        self.buckets.borrow().clone()
    }

    pub fn set(&self, buckets: ClassifiedNotifications) {
        self.buckets.send_replace(Some(buckets));
    }

    pub fn clear(&self) {
        self.buckets.send_replace(None);
    }
}

impl Default for NotificationContext {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct ThemeContext {
    mode: Arc<watch::Sender<ThemeMode>>,
}

impl ThemeContext {
    pub fn new(mode: ThemeMode) -> Self {
        Self {
            mode: Arc::new(watch::channel(mode).0),
        }
    }

    pub fn mode(&self) -> ThemeMode {
        *self.mode.borrow()
    }

    pub fn toggle(&self) -> ThemeMode {
        self.mode.send_modify(|mode| *mode = mode.toggled());
        self.mode()
    }
}

impl Default for ThemeContext {
    fn default() -> Self {
        Self::new(ThemeMode::default())
    }
}

/// AppContext
///
/// Bundle of the shared contexts, passed explicitly to whatever needs them.
#[derive(Clone, Default)]
pub struct AppContext {
    pub session: SessionContext,
    pub notifications: NotificationContext,
    pub theme: ThemeContext,
}

impl AppContext {
    pub fn new() -> Self {
        Self::default()
    }
}
