use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A thread-safe, reference-counted resource container with read-write locking.
///
/// `MtResource` wraps an `Arc<RwLock<T>>`. Clones share the same value, which is
/// how the chunk store and its host both hold on to one mesh sink: the store
/// owns a boxed clone and pushes meshes into it, the host keeps another clone
/// and reads what was uploaded.
///
/// # Examples
///
/// ```
/// use marching_terrain::core::MtResource;
///
/// let shared = MtResource::new(vec![1, 2, 3]);
/// let writer = shared.clone();
///
/// writer.get_mut().push(4);
/// assert_eq!(shared.get().len(), 4);
/// ```
///
/// # Poisoning
/// A panic while a guard is held does not make the resource unusable; the
/// next `get`/`get_mut` recovers the guard and carries on with whatever state
/// was left behind.
pub struct MtResource<T: Send + Sync> {
    resource: Arc<RwLock<T>>,
}

impl<T: Send + Sync> MtResource<T> {
    /// Creates a new `MtResource` containing the given value.
    pub fn new(resource: T) -> Self {
        Self {
            resource: Arc::new(RwLock::new(resource)),
        }
    }

    /// Returns a read-only guard over the contained value.
    pub fn get(&self) -> RwLockReadGuard<'_, T> {
        self.resource
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns an exclusive guard over the contained value.
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.resource
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Send + Sync> Clone for MtResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let a = MtResource::new(0u32);
        let b = a.clone();
        *b.get_mut() += 5;
        assert_eq!(*a.get(), 5);
    }

    #[test]
    fn test_recovers_from_poisoned_lock() {
        let resource = MtResource::new(1u32);
        let clone = resource.clone();

        let _ = std::thread::spawn(move || {
            let _guard = clone.get_mut();
            panic!("poison the lock");
        })
        .join();

        *resource.get_mut() += 1;
        assert_eq!(*resource.get(), 2);
    }
}
