//! Append-only arena backing the style catalog

use std::ops::Index;

/// Append-only table whose entries are addressed by insertion position
///
/// Entries are never removed or merged, so an index handed out once stays
/// valid for the lifetime of the table.
#[derive(Debug, Clone, PartialEq)]
pub struct Table<T> {
    items: Vec<T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Table<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return its index
    pub fn push(&mut self, item: T) -> u32 {
        self.items.push(item);
        (self.items.len() - 1) as u32
    }

    pub fn get(&self, index: u32) -> Option<&T> {
        self.items.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    /// Iterate over entries in index order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> Index<u32> for Table<T> {
    type Output = T;

    fn index(&self, index: u32) -> &T {
        &self.items[index as usize]
    }
}

impl<'a, T> IntoIterator for &'a Table<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_never_dedups() {
        let mut table = Table::new();
        assert_eq!(table.push("x"), 0);
        assert_eq!(table.push("x"), 1);
        assert_eq!(table.push("x"), 2);
        assert_eq!(table.len(), 3);
        assert_eq!(table[1], "x");
        assert_eq!(table.get(3), None);
    }
}
