use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cons<T: Clone>(pub T, pub LinkedList<T>);

/// Persistent singly-linked list. Cloning is O(1), so search nodes can hand
/// the tail of a principal variation to their children without copying.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedList<T: Clone>(pub Option<Arc<Cons<T>>>);

impl<T: Clone> Default for LinkedList<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T: Clone> LinkedList<T> {
    #[inline]
    pub fn cons(head: T, tail: LinkedList<T>) -> Self {
        Self(Some(Arc::new(Cons(head, tail))))
    }

    pub fn decons(&self) -> Option<(T, LinkedList<T>)> {
        self.0.as_ref().map(|rc| (rc.0.clone(), rc.1.clone()))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn head(&self) -> Option<T> {
        self.0.as_ref().map(|rc| rc.0.clone())
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter { cur: self }
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

pub struct Iter<'a, T: Clone> {
    cur: &'a LinkedList<T>,
}

impl<'a, T: Clone> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let cell = self.cur.0.as_ref()?;
        self.cur = &cell.1;
        Some(&cell.0)
    }
}

impl<T: Clone + PartialEq> PartialEq for LinkedList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

#[macro_export]
macro_rules! cons {
    ($x: expr, $xs: expr) => {
        $crate::data_structures::linked_list::LinkedList::cons($x, $xs)
    };
}

#[macro_export]
macro_rules! linked_list {
    ($(,)?) => {
        $crate::data_structures::linked_list::LinkedList(None)
    };
    ($x: expr $(,)?) => {
        $crate::cons!($x, $crate::linked_list![])
    };
    ($x: expr, $($xs: expr),+ $(,)?) => {
        $crate::cons!($x, $crate::linked_list![$($xs),+])
    };
}

#[cfg(test)]
mod test {
    #[test]
    pub fn test_len() {
        let ll = linked_list![1, 2, 3];
        assert_eq!(3, ll.len())
    }

    #[test]
    pub fn test_iter_borrows_in_order() {
        let ll = linked_list![45, 10, 30];
        assert_eq!(vec![45, 10, 30], ll.to_vec());
        assert_eq!(85, ll.iter().sum::<i32>());
    }

    #[test]
    pub fn test_decons_shares_tail() {
        let tail = linked_list![2, 3];
        let ll = cons!(1, tail.clone());
        let (head, rest) = ll.decons().unwrap();
        assert_eq!(1, head);
        assert_eq!(tail, rest);
        let empty: super::LinkedList<u8> = linked_list![];
        assert!(empty.decons().is_none());
    }
}
