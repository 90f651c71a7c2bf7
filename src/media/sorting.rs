/// Merge two sequences that are each already sorted by `key` in the
/// requested direction into one sorted sequence.
///
/// Two-pointer linear merge: O(|a| + |b|), no sorting pass. On an exact key
/// tie the head of `a` is taken first, so input order is preserved across
/// the seam. Callers must supply pre-sorted inputs; nothing is validated
/// here and the output is only sorted if the precondition holds.
pub fn merge<T, K, F>(a: Vec<T>, b: Vec<T>, key: F, descending: bool) -> Vec<T>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut merged = Vec::with_capacity(a.len() + b.len());
    let mut a_iter = a.into_iter().peekable();
    let mut b_iter = b.into_iter().peekable();

    loop {
        let take_a = match (a_iter.peek(), b_iter.peek()) {
            (Some(x), Some(y)) => {
                if descending {
                    key(x) >= key(y)
                } else {
                    key(x) <= key(y)
                }
            }
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };

        if take_a {
            if let Some(x) = a_iter.next() {
                merged.push(x);
            }
        } else if let Some(y) = b_iter.next() {
            merged.push(y);
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_sorted(values: &[i32], descending: bool) -> bool {
        values.windows(2).all(|pair| {
            if descending {
                pair[0] >= pair[1]
            } else {
                pair[0] <= pair[1]
            }
        })
    }

    #[test]
    fn merges_ascending_inputs() {
        let merged = merge(vec![1, 4, 9], vec![2, 3, 10], |v| *v, false);
        assert_eq!(merged, vec![1, 2, 3, 4, 9, 10]);
    }

    #[test]
    fn merges_descending_inputs() {
        let merged = merge(vec![9, 4, 1], vec![10, 3, 2], |v| *v, true);
        assert_eq!(merged, vec![10, 9, 4, 3, 2, 1]);
    }

    #[test]
    fn preserves_length_and_elements() {
        let a = vec![0, 5, 5, 7];
        let b = vec![1, 5, 6];
        let merged = merge(a.clone(), b.clone(), |v| *v, false);

        assert_eq!(merged.len(), a.len() + b.len());
        let mut resorted = merged.clone();
        resorted.sort();
        let mut expected = [a, b].concat();
        expected.sort();
        assert_eq!(resorted, expected);
        assert!(is_sorted(&merged, false));
    }

    #[test]
    fn ties_prefer_the_first_sequence() {
        let a = vec![("a", 5)];
        let b = vec![("b", 5)];
        let merged = merge(a, b, |(_, v)| *v, false);
        assert_eq!(merged, vec![("a", 5), ("b", 5)]);

        let a = vec![("a", 5)];
        let b = vec![("b", 5)];
        let merged = merge(a, b, |(_, v)| *v, true);
        assert_eq!(merged, vec![("a", 5), ("b", 5)]);
    }

    #[test]
    fn exhausted_side_appends_remainder_unchanged() {
        let merged = merge(vec![1, 2], vec![3, 4, 5, 6], |v| *v, false);
        assert_eq!(merged, vec![1, 2, 3, 4, 5, 6]);

        let merged = merge(Vec::<i32>::new(), vec![1, 2], |v| *v, false);
        assert_eq!(merged, vec![1, 2]);
    }

    #[test]
    fn empty_inputs_merge_to_empty() {
        let merged = merge(Vec::<i32>::new(), Vec::new(), |v| *v, true);
        assert!(merged.is_empty());
    }
}
