//! In-memory location bar.

use std::sync::{Mutex, PoisonError};

use crate::url_state::LocationBar;

#[derive(Debug, Default)]
struct LocationState {
    query: String,
    pushes: Vec<String>,
}

/// Location bar backed by a string, recording every replacement.
#[derive(Debug, Default)]
pub struct MemoryLocation {
    state: Mutex<LocationState>,
}

impl MemoryLocation {
    pub fn new(query: &str) -> Self {
        Self {
            state: Mutex::new(LocationState {
                query: query.to_string(),
                pushes: Vec::new(),
            }),
        }
    }

    /// The query as last written.
    pub fn current(&self) -> String {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .query
            .clone()
    }

    /// Every query written through `replace_query`, in order.
    pub fn pushes(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pushes
            .clone()
    }
}

impl LocationBar for MemoryLocation {
    fn query(&self) -> String {
        self.current()
    }

    fn replace_query(&self, query: &str) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.query = query.to_string();
        state.pushes.push(query.to_string());
    }
}
