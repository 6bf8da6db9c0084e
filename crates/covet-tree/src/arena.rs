use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

pub struct Key<T>(u32, PhantomData<T>);

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.0)
    }
}

impl<T> std::hash::Hash for Key<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> PartialEq for Key<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for Key<T> {}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Key<T> {}

impl<T> Key<T> {
    pub const fn new(index: u32) -> Self {
        Self(index, PhantomData)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Arena<T> {
    items: Vec<T>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key the next `alloc` will hand out.
    pub fn next_key(&self) -> Key<T> {
        Key::new(self.items.len() as u32)
    }

    pub fn alloc(&mut self, value: T) -> Key<T> {
        let key = self.next_key();
        self.items.push(value);
        key
    }

    pub fn iter_enumerated(&self) -> impl Iterator<Item = (Key<T>, &T)> {
        self.items.iter().enumerate().map(|(i, item)| (Key::new(i as u32), item))
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T> Index<Key<T>> for Arena<T> {
    type Output = T;
    fn index(&self, index: Key<T>) -> &Self::Output {
        &self.items[index.index() as usize]
    }
}

impl<T> IndexMut<Key<T>> for Arena<T> {
    fn index_mut(&mut self, index: Key<T>) -> &mut Self::Output {
        &mut self.items[index.index() as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_allocation_order() {
        let mut arena = Arena::new();
        assert_eq!(arena.next_key(), Key::new(0));

        let a = arena.alloc("a");
        let b = arena.alloc("b");
        arena[b] = "c";

        assert_eq!((a.index(), b.index()), (0, 1));
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.iter_enumerated().collect::<Vec<_>>(), vec![(a, &"a"), (b, &"c")]);
        assert_eq!(format!("{b:?}"), "Key(1)");
    }
}
