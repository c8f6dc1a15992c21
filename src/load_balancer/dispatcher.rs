//! Weighted round-robin dispatcher with per-session failover.
//!
//! The cursor and every backend's consecutive-selection counter sit behind a
//! single mutex, so concurrent `select()` calls observe a total order of
//! rotation advances.

use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

use crate::load_balancer::backend::Backend;
use crate::load_balancer::failover::FailureSet;

/// Errors returned by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("no backends configured")]
    NoBackends,

    #[error("every backend has already failed for this session")]
    NoCandidates,
}

/// A backend chosen for one outbound attempt, with its position in the registry.
#[derive(Debug, Clone)]
pub struct Selection {
    pub backend: Arc<Backend>,
    pub index: usize,
}

#[derive(Debug)]
struct Rotation {
    index: usize,
    /// Consecutive selections granted to each backend since it became current.
    current_connections: Vec<u32>,
}

/// Shared selector over the ordered backend registry.
#[derive(Debug)]
pub struct Dispatcher {
    backends: Vec<Arc<Backend>>,
    rotation: Mutex<Rotation>,
}

impl Dispatcher {
    pub fn new(backends: Vec<Backend>) -> Self {
        let count = backends.len();
        Self {
            backends: backends.into_iter().map(Arc::new).collect(),
            rotation: Mutex::new(Rotation {
                index: 0,
                current_connections: vec![0; count],
            }),
        }
    }

    /// Return the current backend and advance rotation state.
    ///
    /// The current backend keeps being returned until it has been selected
    /// `weight` times in a row; then the cursor moves to the next backend.
    pub fn select(&self) -> Result<Selection, DispatchError> {
        if self.backends.is_empty() {
            return Err(DispatchError::NoBackends);
        }

        let mut rotation = self.rotation.lock().unwrap_or_else(PoisonError::into_inner);
        let index = rotation.index;
        let backend = &self.backends[index];

        rotation.current_connections[index] += 1;
        if rotation.current_connections[index] >= backend.weight() {
            rotation.current_connections[index] = 0;
            rotation.index = (index + 1) % self.backends.len();
        }

        Ok(Selection {
            backend: backend.clone(),
            index,
        })
    }

    /// Return the first backend at or after the cursor that is not in `failed`.
    ///
    /// Rotation state is left untouched.
    pub fn select_excluding(&self, failed: &FailureSet) -> Result<Selection, DispatchError> {
        if self.backends.is_empty() {
            return Err(DispatchError::NoBackends);
        }

        let start = self
            .rotation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .index;
        let len = self.backends.len();

        (0..len)
            .map(|offset| (start + offset) % len)
            .find(|index| !failed.contains(*index))
            .map(|index| Selection {
                backend: self.backends[index].clone(),
                index,
            })
            .ok_or(DispatchError::NoCandidates)
    }

    /// Number of configured backends.
    pub fn size(&self) -> usize {
        self.backends.len()
    }

    /// A fresh failure set sized for this registry.
    pub fn failure_set(&self) -> FailureSet {
        FailureSet::with_capacity(self.backends.len())
    }
}
