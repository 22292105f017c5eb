use std::fmt;
use std::sync::RwLock;

/// Snapshot of the user session as seen by the header.
///
/// The credential is an opaque bearer token. Whether the session counts as
/// authenticated is derived from it, never stored separately.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Session {
    credential: Option<String>,
    display_name: String,
}

impl Session {
    pub fn authenticated<S, N>(credential: S, display_name: N) -> Self
    where
        S: Into<String>,
        N: Into<String>,
    {
        Self {
            credential: Some(credential.into()),
            display_name: display_name.into(),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential
            .as_deref()
            .map(|c| !c.is_empty())
            .unwrap_or(false)
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Value of the `Authorization` header, if there is a credential
    pub fn bearer(&self) -> Option<String> {
        match &self.credential {
            Some(credential) if !credential.is_empty() => {
                Some(format!("Bearer {}", credential))
            }
            _ => None,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .field("display_name", &self.display_name)
            .finish()
    }
}

/// Externally owned authentication state.
///
/// Implementors hand out session snapshots and drop the session on logout.
pub trait AuthContext {
    fn session(&self) -> Session;

    fn on_logout(&self);
}

/// In-process [AuthContext] backed by a lock.
#[derive(Default)]
pub struct MemoryAuthContext {
    session: RwLock<Session>,
}

impl MemoryAuthContext {
    pub fn new(session: Session) -> Self {
        Self {
            session: RwLock::new(session),
        }
    }

    pub fn login<S, N>(&self, credential: S, display_name: N)
    where
        S: Into<String>,
        N: Into<String>,
    {
        let mut session = self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *session = Session::authenticated(credential, display_name);
        log::debug!("logged in as {}", session.display_name());
    }
}

impl AuthContext for MemoryAuthContext {
    fn session(&self) -> Session {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn on_logout(&self) {
        let mut session = self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *session = Session::anonymous();
        log::debug!("session invalidated");
    }
}

impl fmt::Debug for MemoryAuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryAuthContext")
            .field("session", &self.session())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_credential_is_not_authenticated() {
        let session = Session::authenticated("", "kim");
        assert!(!session.is_authenticated());
        assert_eq!(session.bearer(), None);
        assert!(!Session::anonymous().is_authenticated());
    }

    #[test]
    fn bearer_header_value() {
        let session = Session::authenticated("abc.def", "kim");
        assert!(session.is_authenticated());
        assert_eq!(session.bearer().unwrap(), "Bearer abc.def");
    }

    #[test]
    fn debug_hides_credential() {
        let session = Session::authenticated("very-secret", "kim");
        let printed = format!("{:?}", session);
        assert!(!printed.contains("very-secret"));
        assert!(printed.contains("kim"));
    }

    #[test]
    fn login_then_logout() {
        let context = MemoryAuthContext::default();
        assert!(!context.session().is_authenticated());

        context.login("token", "lee");
        assert!(context.session().is_authenticated());
        assert_eq!(context.session().display_name(), "lee");

        context.on_logout();
        assert_eq!(context.session(), Session::anonymous());
    }
}
