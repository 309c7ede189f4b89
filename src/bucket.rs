//! Fixed-capacity storage of entry chains.
//!
//! Each global index addresses one [`Chain`]. New entries go to the head of
//! their chain, so iterating a chain yields the most recently inserted entry
//! first. A chain is backed by a `Vec` whose *last* element is the head; this
//! keeps head insertion and head removal O(1).

/// A resident key/value pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry<K, V> {
    pub key: K,
    pub value: V,
}

/// Entries sharing one global index, ordered head (newest) to tail (oldest).
#[derive(Clone, Debug)]
pub struct Chain<K, V> {
    // Tail at index 0, head at the end.
    entries: Vec<Entry<K, V>>,
}

impl<K, V> Default for Chain<K, V> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<K, V> Chain<K, V> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate head to tail.
    pub fn iter(&self) -> impl Iterator<Item = &Entry<K, V>> {
        self.entries.iter().rev()
    }

    /// Insert a new head entry.
    pub fn push_front(&mut self, key: K, value: V) {
        self.entries.push(Entry { key, value });
    }

    /// Detach the head entry.
    pub fn pop_front(&mut self) -> Option<Entry<K, V>> {
        self.entries.pop()
    }

    /// Find the entry for `key`, scanning head to tail.
    pub fn find_mut(&mut self, key: &K) -> Option<&mut Entry<K, V>>
    where
        K: PartialEq,
    {
        self.entries.iter_mut().rev().find(|e| e.key == *key)
    }

    pub fn find(&self, key: &K) -> Option<&Entry<K, V>>
    where
        K: PartialEq,
    {
        self.iter().find(|e| e.key == *key)
    }
}

/// Owns every chain of a table. The number of chains never changes.
#[derive(Clone, Debug)]
pub struct BucketStore<K, V> {
    chains: Box<[Chain<K, V>]>,
}

impl<K, V> BucketStore<K, V> {
    /// Allocate `capacity` empty chains.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            chains: std::iter::repeat_with(Chain::default).take(capacity).collect(),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.chains.len()
    }

    /// # Panics
    ///
    /// Panics if `global_index` is out of bounds.
    #[must_use]
    pub fn chain(&self, global_index: usize) -> &Chain<K, V> {
        &self.chains[global_index]
    }

    /// # Panics
    ///
    /// Panics if `global_index` is out of bounds.
    pub fn chain_mut(&mut self, global_index: usize) -> &mut Chain<K, V> {
        &mut self.chains[global_index]
    }

    #[must_use]
    pub fn is_empty(&self, global_index: usize) -> bool {
        self.chains[global_index].is_empty()
    }

    #[must_use]
    pub fn len(&self, global_index: usize) -> usize {
        self.chains[global_index].len()
    }

    /// Total entries across all chains. O(capacity).
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.chains.iter().map(Chain::len).sum()
    }

    pub fn find_mut(&mut self, global_index: usize, key: &K) -> Option<&mut Entry<K, V>>
    where
        K: PartialEq,
    {
        self.chains[global_index].find_mut(key)
    }

    pub fn push_front(&mut self, global_index: usize, key: K, value: V) {
        self.chains[global_index].push_front(key, value);
    }

    pub fn pop_front(&mut self, global_index: usize) -> Option<Entry<K, V>> {
        self.chains[global_index].pop_front()
    }

    /// Detach the chain at `global_index`, yielding entries head to tail.
    ///
    /// Each entry is removed from the store before it is yielded, so the
    /// caller owns (and releases) it immediately. Entries not yet yielded when
    /// the iterator is dropped stay resident.
    pub fn drain(&mut self, global_index: usize) -> Drain<'_, K, V> {
        Drain {
            chain: &mut self.chains[global_index],
        }
    }

    /// Release every entry at `global_index` and return their values head to tail.
    pub fn clear(&mut self, global_index: usize) -> Vec<V> {
        self.drain(global_index).map(|e| e.value).collect()
    }
}

/// Head-to-tail draining iterator returned by [`BucketStore::drain`].
pub struct Drain<'a, K, V> {
    chain: &'a mut Chain<K, V>,
}

impl<K, V> Iterator for Drain<'_, K, V> {
    type Item = Entry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        self.chain.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.chain.len();
        (n, Some(n))
    }
}

impl<K, V> ExactSizeIterator for Drain<'_, K, V> {}
