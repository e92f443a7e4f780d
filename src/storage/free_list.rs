//! Free list of reclaimed page ids.

use std::collections::BTreeSet;

use crate::common::PageId;

/// Page ids that are allocated in the data file but referenced by no index
/// entry.
///
/// Ids are handed out lowest first so that reuse stays near the front of the
/// file. The page store never extends the file while this list is non-empty.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FreeList {
    ids: BTreeSet<PageId>,
}

impl FreeList {
    /// Create an empty free list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a page id to the list.
    ///
    /// Returns false if the id was already free.
    pub fn push(&mut self, page_id: PageId) -> bool {
        self.ids.insert(page_id)
    }

    /// Take the lowest free page id.
    pub fn pop(&mut self) -> Option<PageId> {
        self.ids.pop_first()
    }

    #[inline]
    pub fn contains(&self, page_id: PageId) -> bool {
        self.ids.contains(&page_id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Free ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = PageId> + '_ {
        self.ids.iter().copied()
    }
}

impl FromIterator<PageId> for FreeList {
    fn from_iter<I: IntoIterator<Item = PageId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_lowest_first() {
        let mut free = FreeList::new();
        free.push(PageId::new(7));
        free.push(PageId::new(2));
        free.push(PageId::new(5));

        assert_eq!(free.pop(), Some(PageId::new(2)));
        assert_eq!(free.pop(), Some(PageId::new(5)));
        assert_eq!(free.pop(), Some(PageId::new(7)));
        assert_eq!(free.pop(), None);
    }

    #[test]
    fn test_push_duplicate() {
        let mut free = FreeList::new();
        assert!(free.push(PageId::new(1)));
        assert!(!free.push(PageId::new(1)));
        assert_eq!(free.len(), 1);
        assert!(free.contains(PageId::new(1)));
    }

    #[test]
    fn test_collect_and_iter() {
        let free: FreeList = [3, 1, 2].into_iter().map(PageId::new).collect();
        let ids: Vec<u32> = free.iter().map(|p| p.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(!free.is_empty());
    }
}
