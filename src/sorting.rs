//! Standalone sorting routines.
//!
//! Each function takes a slice and returns a freshly allocated sorted
//! vector; the input is never mutated. `quick_sort` partitions on
//! equality and is not stable; the other three are the classic stable
//! textbook algorithms.

/// Sort by recursive three-way partitioning around the middle element.
///
/// Elements equal to the pivot stay grouped between the recursively
/// sorted halves, so duplicate-heavy inputs do not degrade.
pub fn quick_sort<T: PartialOrd + Clone>(arr: &[T]) -> Vec<T> {
    if arr.len() <= 1 {
        return arr.to_vec();
    }

    let pivot = arr[arr.len() / 2].clone();
    let mut left = Vec::new();
    let mut middle = Vec::new();
    let mut right = Vec::new();
    for item in arr {
        if *item < pivot {
            left.push(item.clone());
        } else if *item > pivot {
            right.push(item.clone());
        } else {
            middle.push(item.clone());
        }
    }

    let mut sorted = quick_sort(&left);
    sorted.extend(middle);
    sorted.extend(quick_sort(&right));
    sorted
}

/// Sort by repeatedly swapping adjacent out-of-order elements.
///
/// After pass `i` the largest `i` elements sit at the end, so each
/// inner pass shrinks by one.
pub fn bubble_sort<T: PartialOrd + Clone>(arr: &[T]) -> Vec<T> {
    let mut sorted = arr.to_vec();
    let n = sorted.len();
    for i in 0..n {
        for j in 0..n.saturating_sub(i + 1) {
            if sorted[j] > sorted[j + 1] {
                sorted.swap(j, j + 1);
            }
        }
    }
    sorted
}

/// Sort by shifting each element left into its place among the
/// already-sorted prefix.
pub fn insertion_sort<T: PartialOrd + Clone>(arr: &[T]) -> Vec<T> {
    let mut sorted = arr.to_vec();
    for i in 1..sorted.len() {
        let key = sorted[i].clone();
        let mut j = i;
        while j > 0 && key < sorted[j - 1] {
            sorted[j] = sorted[j - 1].clone();
            j -= 1;
        }
        sorted[j] = key;
    }
    sorted
}

/// Sort by selecting the minimum of the unsorted suffix each round.
pub fn selection_sort<T: PartialOrd + Clone>(arr: &[T]) -> Vec<T> {
    let mut sorted = arr.to_vec();
    let n = sorted.len();
    for i in 0..n {
        let mut min_idx = i;
        for j in (i + 1)..n {
            if sorted[j] < sorted[min_idx] {
                min_idx = j;
            }
        }
        sorted.swap(i, min_idx);
    }
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quick_sort_with_duplicates() {
        assert_eq!(
            quick_sort(&[3, 6, 8, 10, 1, 2, 1]),
            vec![1, 1, 2, 3, 6, 8, 10]
        );
    }

    #[test]
    fn test_bubble_sort_reversed_input() {
        assert_eq!(bubble_sort(&[5, 4, 3, 2, 1]), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_insertion_sort_empty_input() {
        assert_eq!(insertion_sort::<i32>(&[]), Vec::<i32>::new());
    }

    #[test]
    fn test_selection_sort_floats() {
        assert_eq!(selection_sort(&[2.5, 1.1]), vec![1.1, 2.5]);
    }

    #[test]
    fn test_single_element_inputs_are_unchanged() {
        assert_eq!(quick_sort(&[7]), vec![7]);
        assert_eq!(bubble_sort(&[7]), vec![7]);
        assert_eq!(insertion_sort(&[7]), vec![7]);
        assert_eq!(selection_sort(&[7]), vec![7]);
    }

    #[test]
    fn test_sorted_input_is_a_fixed_point() {
        let input = vec![1, 2, 3, 4, 5];
        assert_eq!(quick_sort(&input), input);
        assert_eq!(bubble_sort(&input), input);
        assert_eq!(insertion_sort(&input), input);
        assert_eq!(selection_sort(&input), input);
    }

    #[test]
    fn test_output_is_a_sorted_permutation_of_the_input() {
        let input = vec![9, -3, 0, 42, 7, 7, -3, 18, 5, 1];
        for sorted in [
            quick_sort(&input),
            bubble_sort(&input),
            insertion_sort(&input),
            selection_sort(&input),
        ] {
            assert_eq!(sorted.len(), input.len());
            assert!(sorted.windows(2).all(|w| w[0] <= w[1]));

            let mut expected = input.clone();
            expected.sort();
            assert_eq!(sorted, expected);
        }
    }

    #[test]
    fn test_input_slices_are_not_mutated() {
        let input = vec![3, 1, 2];
        let _ = bubble_sort(&input);
        let _ = quick_sort(&input);
        assert_eq!(input, vec![3, 1, 2]);
    }

    #[test]
    fn test_sorts_strings_too() {
        let input = vec!["pear".to_string(), "apple".to_string(), "fig".to_string()];
        let sorted = insertion_sort(&input);
        assert_eq!(sorted, vec!["apple", "fig", "pear"]);
    }
}
