use std::sync::Arc;

use super::shell::Navigator;

/// Buttons of the toolbar anonymous visitors see on the home page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarButton {
    LogIn,
    SignUp,
}

impl ToolbarButton {
    pub const ALL: [ToolbarButton; 2] = [ToolbarButton::LogIn, ToolbarButton::SignUp];

    pub fn label(&self) -> &'static str {
        match self {
            Self::LogIn => "Log in",
            Self::SignUp => "Sign up",
        }
    }

    pub fn route(&self) -> &'static str {
        match self {
            Self::LogIn => "/log-in",
            Self::SignUp => "/sign-up",
        }
    }
}

pub struct HomeToolbar {
    navigator: Arc<dyn Navigator>,
}

impl HomeToolbar {
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self { navigator }
    }

    pub fn buttons(&self) -> [ToolbarButton; 2] {
        ToolbarButton::ALL
    }

    pub fn press(&self, button: ToolbarButton) {
        self.navigator.push(button.route());
    }
}
