//! Client-side session core of the Tisn SPA.
//!
//! Holds the logic behind the navigation bar: bootstrapping the session,
//! loading and classifying notifications, forced logout, and the
//! state-to-render mapping of the shell, event cards and home toolbar.
//! Rendering itself belongs to whichever UI toolkit consumes the views.

pub mod api;
pub mod classify;
pub mod context;
pub mod event_card;
pub mod home_toolbar;
pub mod navigation_view;
pub mod shell;

pub use api::{HttpSessionApi, SessionApi, TransportError, UserFetch};
pub use classify::{ClassifiedNotifications, classify_notifications};
pub use context::{AppContext, NotificationContext, SessionContext, ThemeContext, ThemeMode};
pub use event_card::EventCardView;
pub use home_toolbar::{HomeToolbar, ToolbarButton};
pub use navigation_view::{MenuItem, ShellView, render_shell};
pub use shell::{LANDING_ROUTE, LocaleSwitcher, LogoutState, NavigationShell, Navigator, ShellStatus};
