//! State-to-render mapping of the app bar and drawer.
//!
//! Nothing here performs side effects; `NavigationShell` turns the returned
//! actions into navigation.

use uuid::Uuid;

use super::{classify::ClassifiedNotifications, context::ThemeMode};
use crate::models::User;

pub const APP_TITLE: &str = "Tisn";
pub const HOME_ROUTE: &str = "/";
pub const CHATS_ROUTE: &str = "/chats";
pub const NOTIFICATIONS_ROUTE: &str = "/notifications";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppBarColor {
    Inherit,
    Primary,
}

/// Icon of the theme toggle: the one for the mode a click switches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeIcon {
    /// Shown in dark mode.
    Brightness7,
    /// Shown in light mode.
    Brightness4,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppBarView {
    pub title: &'static str,
    pub title_href: &'static str,
    pub color: AppBarColor,
    pub theme_icon: ThemeIcon,
    /// Size of the message bucket; `None` until notifications are known.
    pub chat_badge: Option<usize>,
    /// Size of the regular bucket; `None` until notifications are known.
    pub notification_badge: Option<usize>,
}

/// The fixed drawer entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Home,
    Events,
    MyEvents,
    CreateEvent,
    Users,
    MyProfile,
    Interests,
    LogOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    Navigate(String),
    LogOut,
}

impl MenuItem {
    /// Drawer sections in display order; a divider separates each.
    pub const SECTIONS: [&'static [MenuItem]; 5] = [
        &[MenuItem::Home],
        &[MenuItem::Events, MenuItem::MyEvents, MenuItem::CreateEvent],
        &[MenuItem::Users, MenuItem::MyProfile],
        &[MenuItem::Interests],
        &[MenuItem::LogOut],
    ];

    /// Translation key of the entry label.
    pub fn label_key(&self) -> &'static str {
        match self {
            Self::Home => "navigationBarAndDrawer.home",
            Self::Events => "navigationBarAndDrawer.events",
            Self::MyEvents => "navigationBarAndDrawer.myEvents",
            Self::CreateEvent => "navigationBarAndDrawer.createEvent",
            Self::Users => "navigationBarAndDrawer.users",
            Self::MyProfile => "navigationBarAndDrawer.myProfile",
            Self::Interests => "navigationBarAndDrawer.interests",
            Self::LogOut => "navigationBarAndDrawer.logOut",
        }
    }

    pub fn action(&self, user_id: Uuid) -> MenuAction {
        let route = match self {
            Self::Home => HOME_ROUTE.to_string(),
            Self::Events => "/events".to_string(),
            Self::MyEvents => "/events/mine".to_string(),
            Self::CreateEvent => "/events/new".to_string(),
            Self::Users => "/users".to_string(),
            Self::MyProfile => profile_route(user_id),
            Self::Interests => "/interests".to_string(),
            Self::LogOut => return MenuAction::LogOut,
        };
        MenuAction::Navigate(route)
    }
}

pub fn profile_route(user_id: Uuid) -> String {
    format!("/users/{user_id}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileHeader {
    pub name: String,
    pub avatar: Option<String>,
    /// Translation key for the avatar alt text, interpolated with `name`.
    pub avatar_alt_key: &'static str,
    /// Upper-cased first letter, the fallback when there is no avatar image.
    pub initial: String,
    pub route: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuEntry {
    pub item: MenuItem,
    pub label_key: &'static str,
    pub action: MenuAction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawerView {
    pub open: bool,
    pub header: ProfileHeader,
    pub sections: Vec<Vec<MenuEntry>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShellView {
    pub app_bar: AppBarView,
    /// Present only for a signed-in user once loading finished.
    pub drawer: Option<DrawerView>,
    /// Message of the error notification, if one is showing.
    pub error: Option<String>,
}

/// Everything the shell renders from.
#[derive(Debug, Clone, Copy)]
pub struct ShellInputs<'a> {
    pub user: Option<&'a User>,
    pub notifications: Option<&'a ClassifiedNotifications>,
    pub theme: ThemeMode,
    pub loading: bool,
    pub drawer_open: bool,
    pub error: Option<&'a str>,
}

pub fn render_app_bar(theme: ThemeMode, notifications: Option<&ClassifiedNotifications>) -> AppBarView {
    let (color, theme_icon) = match theme {
        ThemeMode::Dark => (AppBarColor::Inherit, ThemeIcon::Brightness7),
        ThemeMode::Light => (AppBarColor::Primary, ThemeIcon::Brightness4),
    };

    AppBarView {
        title: APP_TITLE,
        title_href: HOME_ROUTE,
        color,
        theme_icon,
        chat_badge: notifications.map(ClassifiedNotifications::message_count),
        notification_badge: notifications.map(ClassifiedNotifications::regular_count),
    }
}

pub fn render_drawer(user: &User, open: bool) -> DrawerView {
    let header = ProfileHeader {
        name: user.name.clone(),
        avatar: user.avatar.clone(),
        avatar_alt_key: "navigationBarAndDrawer.avatar",
        initial: user
            .name
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default(),
        route: profile_route(user.id),
    };

    let sections = MenuItem::SECTIONS
        .iter()
        .map(|section| {
            section
                .iter()
                .map(|item| MenuEntry {
                    item: *item,
                    label_key: item.label_key(),
                    action: item.action(user.id),
                })
                .collect()
        })
        .collect();

    DrawerView {
        open,
        header,
        sections,
    }
}

pub fn render_shell(inputs: &ShellInputs<'_>) -> ShellView {
    let drawer = match inputs.user {
        Some(user) if !inputs.loading => Some(render_drawer(user, inputs.drawer_open)),
        _ => None,
    };

    ShellView {
        app_bar: render_app_bar(inputs.theme, inputs.notifications),
        drawer,
        error: inputs.error.map(str::to_string),
    }
}
