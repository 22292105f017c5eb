pub mod config;
pub mod errors;
pub mod header;
pub mod loader;
pub mod resource;
pub mod session;
pub mod slot;

pub use config::ClientConfig;
pub use errors::{ProfileError, Result};
pub use header::{Header, HeaderView};
pub use loader::ProfileLoader;
pub use resource::{ImageHandle, ObjectUrlRegistry, ProfileResource};
pub use session::{AuthContext, MemoryAuthContext, Session};
pub use slot::{LoadTicket, ProfileSlot, SlotState};

use std::sync::Once;

pub const LOAD_PROFILE_ROUTE: &str = "load-profile";
pub const LOGOUT_ROUTE: &str = "logout";

static INIT: Once = Once::new();

/// Install the `env_logger` backend once per process
pub fn initialize() {
    INIT.call_once(|| {
        let _ = env_logger::try_init();
        log::info!("Initializing profile-loader");
    });
}
