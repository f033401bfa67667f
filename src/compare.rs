use core::{cmp::Ordering, fmt};

/// A strict total order over keys of type `K`.
///
/// Every tree owns one comparator, supplied at construction. All structural decisions (descent
/// direction, uniqueness, bounds) are made through it, so it must stay consistent for the lifetime
/// of the tree.
pub trait Comparator<K: ?Sized> {
    fn compare(&self, a: &K, b: &K) -> Ordering;

    #[inline]
    fn less(&self, a: &K, b: &K) -> bool {
        self.compare(a, b) == Ordering::Less
    }
}

/// Orders keys by their [`Ord`] implementation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Natural;

impl<K: Ord + ?Sized> Comparator<K> for Natural {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

/// Inverts the order of another comparator.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Reversed<C>(pub C);

impl<K: ?Sized, C: Comparator<K>> Comparator<K> for Reversed<C> {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self.0.compare(b, a)
    }
}

/// Orders keys with a closure.
#[derive(Copy, Clone, Default)]
pub struct FnComparator<F>(pub F);

impl<K: ?Sized, F> Comparator<K> for FnComparator<F>
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        (self.0)(a, b)
    }
}

impl<F> fmt::Debug for FnComparator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnComparator(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_and_reversed() {
        assert_eq!(Natural.compare(&1, &2), Ordering::Less);
        assert_eq!(Reversed(Natural).compare(&1, &2), Ordering::Greater);
        assert!(Comparator::<str>::less(&Natural, "abc", "abd"));
    }

    #[test]
    fn closure() {
        let by_len = FnComparator(|a: &String, b: &String| a.len().cmp(&b.len()));
        assert_eq!(
            by_len.compare(&"zz".to_string(), &"aaa".to_string()),
            Ordering::Less
        );
    }
}
