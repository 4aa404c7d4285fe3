//! Bounded retention for newest-first history lists.

/// Truncate `list` to its first `max_len` elements. Lists are kept
/// newest-first, so overflow drops the oldest entries. Idempotent and
/// order-preserving.
pub fn enforce<T>(list: &mut Vec<T>, max_len: usize) {
    if list.len() > max_len {
        list.truncate(max_len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn under_limit_is_untouched() {
        let mut list = vec![1, 2, 3];
        enforce(&mut list, 5);
        assert_eq!(list, vec![1, 2, 3]);
    }

    #[test]
    fn overflow_drops_oldest() {
        let mut list: Vec<u32> = (0..1001).collect();
        enforce(&mut list, 1000);
        assert_eq!(list.len(), 1000);
        assert_eq!(list[0], 0);
        assert_eq!(*list.last().unwrap(), 999);
        assert!(!list.contains(&1000));
    }

    #[test]
    fn idempotent() {
        let mut once: Vec<u32> = (0..750).collect();
        enforce(&mut once, 500);
        let mut twice = once.clone();
        enforce(&mut twice, 500);
        assert_eq!(once, twice);
    }
}
