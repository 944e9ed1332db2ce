use std::fmt;

/// A generation-checked handle into a [`Slab`].
///
/// A handle stays valid until the value it points to is removed. Once the
/// slot is reused, the generation no longer matches and every lookup through
/// the old handle returns `None`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// Packs the handle into a 64-bit poller token.
    pub(crate) fn token(self) -> u64 {
        (u64::from(self.generation) << 32) | u64::from(self.index)
    }

    /// Rebuilds a handle from a poller token.
    pub(crate) fn from_token(token: u64) -> Self {
        Self {
            index: token as u32,
            generation: (token >> 32) as u32,
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

enum Entry<T> {
    Occupied { generation: u32, value: T },
    Vacant { generation: u32 },
}

/// A slab allocator with generation-checked handles.
///
/// Values live in a contiguous vector; freed slots are recycled through a
/// free list. Each slot carries a generation counter that is bumped on
/// removal, so a handle to a removed value can never observe the value that
/// later reuses its slot.
pub(crate) struct Slab<T> {
    /// Slot storage.
    entries: Vec<Entry<T>>,
    /// Stack of vacant slot indices.
    free: Vec<usize>,
    /// Number of occupied slots.
    len: usize,
}

impl<T> Slab<T> {
    /// Creates a slab with room for `capacity` values before growing.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Inserts a value and returns its handle.
    ///
    /// A vacant slot is reused when available; otherwise the slab grows.
    pub(crate) fn insert(&mut self, value: T) -> Handle {
        self.len += 1;

        if let Some(index) = self.free.pop() {
            let generation = match self.entries[index] {
                Entry::Vacant { generation } => generation,
                Entry::Occupied { .. } => unreachable!("free list points at an occupied slot"),
            };

            self.entries[index] = Entry::Occupied { generation, value };

            return Handle {
                index: index as u32,
                generation,
            };
        }

        let index = self.entries.len();
        self.entries.push(Entry::Occupied {
            generation: 0,
            value,
        });

        Handle {
            index: index as u32,
            generation: 0,
        }
    }

    /// Removes and returns the value behind `handle`.
    ///
    /// Returns `None` if the handle is stale or was never issued.
    pub(crate) fn remove(&mut self, handle: Handle) -> Option<T> {
        let index = handle.index as usize;

        match self.entries.get(index) {
            Some(Entry::Occupied { generation, .. }) if *generation == handle.generation => {}
            _ => return None,
        }

        let next = Entry::Vacant {
            generation: handle.generation.wrapping_add(1),
        };

        match std::mem::replace(&mut self.entries[index], next) {
            Entry::Occupied { value, .. } => {
                self.free.push(index);
                self.len -= 1;
                Some(value)
            }
            Entry::Vacant { .. } => None,
        }
    }

    /// Returns a shared reference to the value behind `handle`.
    pub(crate) fn get(&self, handle: Handle) -> Option<&T> {
        match self.entries.get(handle.index as usize) {
            Some(Entry::Occupied { generation, value }) if *generation == handle.generation => {
                Some(value)
            }
            _ => None,
        }
    }

    /// Returns a mutable reference to the value behind `handle`.
    pub(crate) fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        match self.entries.get_mut(handle.index as usize) {
            Some(Entry::Occupied { generation, value }) if *generation == handle.generation => {
                Some(value)
            }
            _ => None,
        }
    }

    /// Returns `true` if `handle` refers to a live value.
    pub(crate) fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Number of live values.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Iterates over live values with their handles, in slot order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| match entry {
                Entry::Occupied { generation, value } => Some((
                    Handle {
                        index: index as u32,
                        generation: *generation,
                    },
                    value,
                )),
                Entry::Vacant { .. } => None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let mut slab = Slab::with_capacity(4);
        let a = slab.insert("a");
        let b = slab.insert("b");

        assert_eq!(slab.get(a), Some(&"a"));
        assert_eq!(slab.get(b), Some(&"b"));
        assert_eq!(slab.len(), 2);
    }

    #[test]
    fn removed_handle_is_stale_after_reuse() {
        let mut slab = Slab::with_capacity(1);
        let old = slab.insert(1);

        assert_eq!(slab.remove(old), Some(1));
        assert!(!slab.contains(old));

        let new = slab.insert(2);
        assert_ne!(old, new);
        assert_eq!(slab.get(old), None);
        assert_eq!(slab.get(new), Some(&2));
        assert_eq!(slab.remove(old), None);
        assert_eq!(slab.len(), 1);
    }

    #[test]
    fn token_round_trips_generation() {
        let mut slab = Slab::with_capacity(1);
        let first = slab.insert(());
        slab.remove(first);
        let second = slab.insert(());

        assert_eq!(Handle::from_token(second.token()), second);
        assert_ne!(Handle::from_token(first.token()), second);
    }

    #[test]
    fn iter_skips_vacant_slots() {
        let mut slab = Slab::with_capacity(3);
        let a = slab.insert('a');
        let b = slab.insert('b');
        let c = slab.insert('c');
        slab.remove(b);

        let live: Vec<_> = slab.iter().map(|(h, v)| (h, *v)).collect();
        assert_eq!(live, vec![(a, 'a'), (c, 'c')]);
    }
}
