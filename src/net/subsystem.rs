//! Process-wide network subsystem lifecycle.
//!
//! std and socket2 start the platform socket layer (WSAStartup on Windows)
//! on first use and never expose a teardown. This module only checks that
//! socket creation works and tracks whether the subsystem is considered up.
//!
//! # Responsibilities
//! - Check the platform socket layer once per process
//! - Track explicit [`NetworkGuard`] holders; releasing the last one clears
//!   the tracked state, nothing is unloaded
//! - Let the acceptor and connector initialize lazily when the caller
//!   never called [`init`]
//!
//! # States
//! ```text
//! Down → Up (init() or ensure())
//! Up → Down (last NetworkGuard dropped, unless brought up lazily)
//! ```

use std::sync::Mutex;

use socket2::{Domain, Protocol, Socket, Type};

use crate::net::NetError;

struct SubsystemState {
    initialized: bool,
    /// Relied on through `ensure()`; stays up for the rest of the process.
    lazy: bool,
    guards: usize,
}

impl SubsystemState {
    const fn new() -> Self {
        Self {
            initialized: false,
            lazy: false,
            guards: 0,
        }
    }

    fn acquire(&mut self) {
        self.initialized = true;
        self.guards += 1;
    }

    fn mark_lazy(&mut self) {
        self.initialized = true;
        self.lazy = true;
    }

    /// Drop one guard. Returns true when this cleared the tracked state.
    fn release(&mut self) -> bool {
        self.guards = self.guards.saturating_sub(1);
        if self.guards == 0 && !self.lazy && self.initialized {
            self.initialized = false;
            return true;
        }
        false
    }
}

static STATE: Mutex<SubsystemState> = Mutex::new(SubsystemState::new());

fn lock_state() -> std::sync::MutexGuard<'static, SubsystemState> {
    STATE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Check that the platform socket layer works.
///
/// Creating a socket performs any platform startup (WSAStartup on Windows)
/// and proves IPv4 stream sockets are available.
fn startup() -> Result<(), NetError> {
    Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))
        .map(drop)
        .map_err(|e| NetError::Init(e.to_string()))?;
    tracing::debug!("Network subsystem initialized");
    Ok(())
}

/// Explicitly initialize the network subsystem.
///
/// The subsystem stays up while at least one returned guard is alive.
pub fn init() -> Result<NetworkGuard, NetError> {
    let mut state = lock_state();
    if !state.initialized {
        startup()?;
    }
    state.acquire();
    Ok(NetworkGuard { _private: () })
}

/// Initialize the subsystem if nothing has done so yet.
pub fn ensure() -> Result<(), NetError> {
    let mut state = lock_state();
    if !state.initialized {
        startup()?;
    }
    state.mark_lazy();
    Ok(())
}

/// Whether the subsystem is currently up.
pub fn is_initialized() -> bool {
    lock_state().initialized
}

/// Keeps the network subsystem marked up. Dropping the last guard clears
/// the tracked state; the platform socket layer itself stays loaded.
#[derive(Debug)]
pub struct NetworkGuard {
    _private: (),
}

impl Drop for NetworkGuard {
    fn drop(&mut self) {
        if lock_state().release() {
            tracing::debug!("Network subsystem released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_and_ensure_leave_subsystem_up() {
        let guard = init().unwrap();
        assert!(is_initialized());
        ensure().unwrap();
        assert!(is_initialized());

        let second = init().unwrap();
        drop(guard);
        assert!(is_initialized());
        drop(second);
    }

    #[test]
    fn last_guard_clears_tracked_state() {
        let mut state = SubsystemState::new();
        state.acquire();
        state.acquire();
        assert!(!state.release());
        assert!(state.initialized);
        assert!(state.release());
        assert!(!state.initialized);
    }

    #[test]
    fn lazy_use_keeps_state_after_last_guard() {
        let mut state = SubsystemState::new();
        state.acquire();
        state.mark_lazy();
        assert!(!state.release());
        assert!(state.initialized);
    }
}
