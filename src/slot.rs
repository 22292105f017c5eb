use std::mem;
use std::sync::{Mutex, MutexGuard};

use crate::loader::ProfileLoader;
use crate::resource::ProfileResource;
use crate::session::Session;

/// Proof that a load was started, carrying its generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Idle,
    Loading,
    Ready,
}

#[derive(Debug)]
struct Current {
    generation: u64,
    state: SlotState,
    resource: ProfileResource,
}

/// Holds the profile resource currently on display.
///
/// Each load takes a ticket from [ProfileSlot::begin]. Only the ticket of
/// the latest generation may store its result; anything older is dropped,
/// which also revokes its object URL.
#[derive(Debug)]
pub struct ProfileSlot {
    current: Mutex<Current>,
}

impl Default for ProfileSlot {
    fn default() -> Self {
        Self {
            current: Mutex::new(Current {
                generation: 0,
                state: SlotState::Idle,
                resource: ProfileResource::Absent,
            }),
        }
    }
}

impl ProfileSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a load. The previous resource belongs to an older session and
    /// is released right away.
    pub fn begin(&self) -> LoadTicket {
        let mut current = self.lock();
        current.generation += 1;
        current.state = SlotState::Loading;
        let ticket = LoadTicket {
            generation: current.generation,
        };
        let previous = mem::take(&mut current.resource);
        drop(current);
        drop(previous);
        ticket
    }

    /// Store the result of the load behind `ticket`. Returns `false` and
    /// drops `resource` if a newer load was started in the meantime.
    pub fn complete(
        &self,
        ticket: LoadTicket,
        resource: ProfileResource,
    ) -> bool {
        let mut current = self.lock();
        if ticket.generation != current.generation {
            log::debug!(
                "discarding result of load {}, latest is {}",
                ticket.generation,
                current.generation
            );
            drop(current);
            drop(resource);
            return false;
        }

        // release before store
        let previous = mem::take(&mut current.resource);
        drop(previous);
        current.resource = resource;
        current.state = SlotState::Ready;
        true
    }

    /// Load the profile for `session` and display it unless superseded
    pub async fn refresh(
        &self,
        loader: &ProfileLoader,
        session: &Session,
    ) -> bool {
        let ticket = self.begin();
        let resource = loader.load(session).await;
        self.complete(ticket, resource)
    }

    /// Drop the displayed resource and invalidate loads in flight
    pub fn clear(&self) {
        let mut current = self.lock();
        current.generation += 1;
        current.state = SlotState::Idle;
        let previous = mem::take(&mut current.resource);
        drop(current);
        drop(previous);
    }

    pub fn state(&self) -> SlotState {
        self.lock().state
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Source of the displayed picture, `None` means use the fallback
    pub fn display_source(&self) -> Option<String> {
        self.lock().resource.source().map(str::to_string)
    }

    fn lock(&self) -> MutexGuard<'_, Current> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
