use std::fmt;
use std::sync::Arc;

use crate::loader::ProfileLoader;
use crate::session::AuthContext;
use crate::slot::ProfileSlot;
use crate::ProfileError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Greeting {
    Guest,
    User(String),
}

impl fmt::Display for Greeting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Greeting::Guest => f.write_str("Today's tasks"),
            Greeting::User(name) => write!(f, "{}'s tasks", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Avatar {
    /// Object URL or remote URL of the profile picture
    Source(String),
    /// Static placeholder image
    Fallback(String),
}

impl Avatar {
    pub fn src(&self) -> &str {
        match self {
            Avatar::Source(src) | Avatar::Fallback(src) => src,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Join,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Join => "/join",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Login,
    Join,
    Logout,
}

impl Action {
    /// Where following the action leads, logout needs a request first
    pub fn route(&self) -> Option<Route> {
        match self {
            Action::Login => Some(Route::Login),
            Action::Join => Some(Route::Join),
            Action::Logout => None,
        }
    }
}

/// Everything needed to draw the header once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderView {
    pub greeting: Greeting,
    pub avatar: Option<Avatar>,
    pub actions: Vec<Action>,
}

#[derive(Debug)]
pub struct LogoutOutcome {
    pub route: Route,
    /// Set when the server did not confirm the logout. The local session
    /// is gone regardless.
    pub error: Option<ProfileError>,
}

/// Page header: greeting, profile picture and login/logout affordances
pub struct Header<A: AuthContext> {
    auth: Arc<A>,
    loader: ProfileLoader,
    slot: ProfileSlot,
}

impl<A: AuthContext> Header<A> {
    pub fn new(auth: Arc<A>, loader: ProfileLoader) -> Self {
        Self {
            auth,
            loader,
            slot: ProfileSlot::new(),
        }
    }

    pub fn slot(&self) -> &ProfileSlot {
        &self.slot
    }

    /// Call whenever the authentication state changes. Returns whether
    /// this load ended up on display.
    pub async fn on_auth_change(&self) -> bool {
        let session = self.auth.session();
        self.slot.refresh(&self.loader, &session).await
    }

    pub async fn logout(&self) -> LogoutOutcome {
        let session = self.auth.session();
        let error = match self.loader.logout(&session).await {
            Ok(()) => None,
            Err(e) => {
                log::warn!("logout was not confirmed: {}", e);
                Some(e)
            }
        };

        self.auth.on_logout();
        self.slot.clear();
        LogoutOutcome {
            route: Route::Login,
            error,
        }
    }

    pub fn view(&self) -> HeaderView {
        let session = self.auth.session();
        if !session.is_authenticated() {
            return HeaderView {
                greeting: Greeting::Guest,
                avatar: None,
                actions: vec![Action::Login, Action::Join],
            };
        }

        let avatar = match self.slot.display_source() {
            Some(src) => Avatar::Source(src),
            None => {
                Avatar::Fallback(self.loader.config().fallback_avatar.clone())
            }
        };
        HeaderView {
            greeting: Greeting::User(session.display_name().to_string()),
            avatar: Some(avatar),
            actions: vec![Action::Logout],
        }
    }
}
