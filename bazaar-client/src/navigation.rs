//! Route navigation used when a session has to be abandoned.

use std::sync::{Mutex, PoisonError};

/// Where the user currently is, and how to send them somewhere else.
pub trait Navigator: Send + Sync {
    fn current_route(&self) -> String;
    fn navigate(&self, route: &str);
}

/// Navigator that only tracks routes in memory.
#[derive(Debug)]
pub struct MemoryNavigator {
    current: Mutex<String>,
    history: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    pub fn new(initial_route: impl Into<String>) -> Self {
        Self {
            current: Mutex::new(initial_route.into()),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Every route navigated to, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for MemoryNavigator {
    fn current_route(&self) -> String {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn navigate(&self, route: &str) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = route.to_string();
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route.to_string());
    }
}

/// Path part of a route, without query string or fragment.
pub(crate) fn route_path(route: &str) -> &str {
    route.split(['?', '#']).next().unwrap_or(route)
}
