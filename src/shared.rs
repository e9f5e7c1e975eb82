//! Game tree shared between concurrently simulated games.
//!
//! A single lock guards the whole tree, so `add_child` and `record_outcome`
//! calls from different games are serialised and no reader ever sees a node
//! mid-update.

use std::{
    fmt::Debug,
    hash::Hash,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{Error, Result, tree::GameTree};

/// Cloneable handle to one game tree behind a mutex.
#[derive(Debug)]
pub struct SharedTree<P, M> {
    inner: Arc<Mutex<GameTree<P, M>>>,
}

impl<P, M> Clone for SharedTree<P, M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, M> SharedTree<P, M>
where
    P: Clone + Eq + Hash + Debug,
    M: Clone + Eq + Debug,
{
    pub fn new(tree: GameTree<P, M>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(tree)),
        }
    }

    /// Exclusive access to the tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TreePoisoned`] if a thread panicked while holding the lock.
    pub fn lock(&self) -> Result<MutexGuard<'_, GameTree<P, M>>> {
        self.inner.lock().map_err(|_| Error::TreePoisoned)
    }

    /// Run `f` with the lock held.
    pub fn with<T>(&self, f: impl FnOnce(&mut GameTree<P, M>) -> Result<T>) -> Result<T> {
        let mut guard = self.lock()?;
        f(&mut guard)
    }

    /// Copy of the current tree.
    pub fn snapshot(&self) -> Result<GameTree<P, M>> {
        Ok(self.lock()?.clone())
    }

    /// Take the tree back out. Falls back to a copy while other handles exist.
    pub fn into_inner(self) -> Result<GameTree<P, M>> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => mutex.into_inner().map_err(|_| Error::TreePoisoned),
            Err(shared) => shared
                .lock()
                .map(|tree| tree.clone())
                .map_err(|_| Error::TreePoisoned),
        }
    }
}
