//! The network interface can hold a single encrypted session at a time.
//! Forecast fetch and telemetry publish each claim the slot for their whole
//! duration; claims never overlap within a wake cycle.

use std::fmt;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use log::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transport {
    Plain,
    Tls,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotBusy {
    pub wanted_by: &'static str,
}

impl fmt::Display for SlotBusy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "network session slot is busy, {} has to wait", self.wanted_by)
    }
}

impl std::error::Error for SlotBusy {}

pub struct SessionSlot {
    holder: Mutex<CriticalSectionRawMutex, Option<&'static str>>,
}

impl SessionSlot {
    pub const fn new() -> Self {
        Self {
            holder: Mutex::new(None),
        }
    }

    /// Fails immediately instead of waiting when the slot is held.
    pub fn claim(&self, user: &'static str, transport: Transport) -> Result<SessionClaim<'_>, SlotBusy> {
        let mut guard = self
            .holder
            .try_lock()
            .map_err(|_| SlotBusy { wanted_by: user })?;
        *guard = Some(user);
        debug!("Session slot claimed by {} ({:?})", user, transport);
        Ok(SessionClaim { guard, transport })
    }

    pub fn is_free(&self) -> bool {
        self.holder.try_lock().is_ok()
    }
}

impl Default for SessionSlot {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SessionClaim<'a> {
    guard: MutexGuard<'a, CriticalSectionRawMutex, Option<&'static str>>,
    transport: Transport,
}

impl SessionClaim<'_> {
    pub fn transport(&self) -> Transport {
        self.transport
    }
}

impl Drop for SessionClaim<'_> {
    fn drop(&mut self) {
        if let Some(user) = self.guard.take() {
            debug!("Session slot released by {}", user);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_fails_while_first_is_held() {
        let slot = SessionSlot::new();
        let forecast = slot.claim("forecast", Transport::Plain).unwrap();
        assert_eq!(forecast.transport(), Transport::Plain);
        assert!(!slot.is_free());

        let err = slot.claim("telemetry", Transport::Tls).err().unwrap();
        assert_eq!(err.wanted_by, "telemetry");

        drop(forecast);
        assert!(slot.is_free());
        let telemetry = slot.claim("telemetry", Transport::Tls).unwrap();
        assert_eq!(telemetry.transport(), Transport::Tls);
    }
}
