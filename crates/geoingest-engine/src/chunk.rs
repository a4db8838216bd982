//! Query chunking for large identifier lists
//!
//! Filter queries carrying thousands of identifiers overflow the index's
//! URI limit, so the identifier list is packed into space-joined fragments
//! that each stay under the configured transport size.

/// Greedily pack `items`, in input order, into space-joined fragments whose
/// length stays strictly below `max_size`.
///
/// A single item at or over the limit is emitted alone in its own fragment
/// rather than failing the whole batch. Deterministic: identical input
/// always produces identical fragments, and joining the fragments with a
/// space reconstructs the input sequence.
pub fn chunk(items: &[String], max_size: usize) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut current = String::new();

    for item in items {
        if current.is_empty() {
            if item.len() >= max_size {
                fragments.push(item.clone());
            } else {
                current.push_str(item);
            }
        } else if current.len() + 1 + item.len() < max_size {
            current.push(' ');
            current.push_str(item);
        } else {
            fragments.push(std::mem::take(&mut current));
            if item.len() >= max_size {
                fragments.push(item.clone());
            } else {
                current.push_str(item);
            }
        }
    }

    if !current.is_empty() {
        fragments.push(current);
    }

    fragments
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn packs_in_order_under_limit() {
        let fragments = chunk(&ids(&["aa", "bb", "cc", "dd"]), 6);
        assert_eq!(fragments, vec!["aa bb", "cc dd"]);
        for fragment in &fragments {
            assert!(fragment.len() < 6);
        }
    }

    #[test]
    fn round_trips_the_input_sequence() {
        let input = ids(&["alpha", "beta", "gamma", "delta", "epsilon"]);
        let fragments = chunk(&input, 14);

        let rejoined: Vec<String> = fragments
            .join(" ")
            .split_whitespace()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(rejoined, input);
    }

    #[test]
    fn oversized_item_rides_alone() {
        let fragments = chunk(&ids(&["a", "this-one-is-way-too-long", "b"]), 8);
        assert_eq!(fragments, vec!["a", "this-one-is-way-too-long", "b"]);
    }

    #[test]
    fn item_exactly_at_limit_rides_alone() {
        let fragments = chunk(&ids(&["12345678", "a"]), 8);
        assert_eq!(fragments, vec!["12345678", "a"]);
    }

    #[test]
    fn deterministic_for_identical_input() {
        let input = ids(&["wisc-001", "wisc-002", "wisc-003", "wisc-004"]);
        assert_eq!(chunk(&input, 20), chunk(&input, 20));
    }

    #[test]
    fn empty_input_yields_no_fragments() {
        assert!(chunk(&[], 100).is_empty());
    }

    #[test]
    fn single_fragment_when_everything_fits() {
        let fragments = chunk(&ids(&["a", "b", "c"]), 100);
        assert_eq!(fragments, vec!["a b c"]);
    }
}
