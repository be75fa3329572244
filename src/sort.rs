//! In-place binary heap sort.
//!
//! Works either on a slice of comparable elements or on a slice of elements
//! keyed by a parallel slice of priorities. Every swap is mirrored on both
//! slices so that they stay index-aligned. No allocation is performed and the
//! sort is not stable.

/// Direction of a sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Low to high.
    #[default]
    Ascending,
    /// High to low.
    Descending,
}

/// Sorts `elements` in place.
pub fn heap_sort<T: PartialOrd>(elements: &mut [T], order: SortOrder) {
    sort_heap(&mut Plain(elements), order);
}

/// Sorts `elements` in place using `priorities` as keys.
///
/// # Panics
///
/// Panics if the two slices have different lengths.
pub fn heap_sort_by_priority<T, P: PartialOrd>(
    elements: &mut [T],
    priorities: &mut [P],
    order: SortOrder,
) {
    assert_eq!(
        elements.len(),
        priorities.len(),
        "elements and priorities must have the same length"
    );
    sort_heap(
        &mut Keyed {
            elements,
            priorities,
        },
        order,
    );
}

/// Storage the heap operates on. Positions are zero based.
trait HeapSlots {
    fn len(&self) -> usize;
    /// True when the key at `a` is strictly below the key at `b`.
    fn below(&self, a: usize, b: usize) -> bool;
    fn swap(&mut self, a: usize, b: usize);
}

struct Plain<'a, T>(&'a mut [T]);

impl<T: PartialOrd> HeapSlots for Plain<'_, T> {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn below(&self, a: usize, b: usize) -> bool {
        self.0[a] < self.0[b]
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.0.swap(a, b);
    }
}

struct Keyed<'a, T, P> {
    elements: &'a mut [T],
    priorities: &'a mut [P],
}

impl<T, P: PartialOrd> HeapSlots for Keyed<'_, T, P> {
    fn len(&self) -> usize {
        self.priorities.len()
    }

    fn below(&self, a: usize, b: usize) -> bool {
        self.priorities[a] < self.priorities[b]
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.elements.swap(a, b);
        self.priorities.swap(a, b);
    }
}

// Heap positions are one based inside the algorithm: parent(p) = p / 2,
// children are 2p and 2p + 1.
fn sort_heap<H: HeapSlots>(slots: &mut H, order: SortOrder) {
    let n = slots.len();
    if n <= 1 {
        return;
    }

    // `outranks(a, b)`: a belongs closer to the heap root than b.
    let outranks = |slots: &H, a: usize, b: usize| match order {
        SortOrder::Ascending => slots.below(b - 1, a - 1),
        SortOrder::Descending => slots.below(a - 1, b - 1),
    };

    // heap construction, sift every new element up
    for new_element in 2..=n {
        let mut pos = new_element;
        while pos > 1 {
            let parent = pos / 2;
            if !outranks(&*slots, pos, parent) {
                break;
            }
            slots.swap(parent - 1, pos - 1);
            pos = parent;
        }
    }

    // heap deconstruction, move the root behind the live prefix and sift down
    for live in (2..=n).rev() {
        slots.swap(0, live - 1);
        let end = live - 1;
        let mut pos = 1;
        loop {
            let first = pos * 2;
            if first > end {
                break;
            }
            let second = first + 1;
            let child = if second <= end && outranks(&*slots, second, first) {
                second
            } else {
                first
            };
            if !outranks(&*slots, child, pos) {
                break;
            }
            slots.swap(pos - 1, child - 1);
            pos = child;
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn random_values(len: usize) -> Vec<i32> {
        let mut rng = StdRng::seed_from_u64(len as u64);
        (0..len).map(|_| rng.gen_range(0..100)).collect()
    }

    #[test]
    fn sorts_ascending_and_descending() {
        for len in [2, 3, 7, 16, 33, 100] {
            let input = random_values(len);
            let mut expected = input.clone();
            expected.sort();

            let mut asc = input.clone();
            heap_sort(&mut asc, SortOrder::Ascending);
            assert_eq!(asc, expected);

            let mut desc = input.clone();
            heap_sort(&mut desc, SortOrder::Descending);
            expected.reverse();
            assert_eq!(desc, expected);
        }
    }

    #[test]
    fn trivial_inputs_are_untouched() {
        let mut empty: Vec<f32> = Vec::new();
        heap_sort(&mut empty, SortOrder::Ascending);
        assert!(empty.is_empty());

        let mut single = vec![42.0];
        heap_sort(&mut single, SortOrder::Descending);
        assert_eq!(single, vec![42.0]);
    }

    #[test]
    fn sorted_input_stays_sorted() {
        let mut values: Vec<u32> = (0..50).collect();
        heap_sort(&mut values, SortOrder::Ascending);
        assert_eq!(values, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn priorities_stay_aligned_with_elements() {
        let mut names = vec!["d", "a", "c", "e", "b"];
        let mut keys = vec![4.0_f32, 1.0, 3.0, 5.0, 2.0];
        heap_sort_by_priority(&mut names, &mut keys, SortOrder::Ascending);
        assert_eq!(names, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(keys, vec![1.0, 2.0, 3.0, 4.0, 5.0]);

        heap_sort_by_priority(&mut names, &mut keys, SortOrder::Descending);
        assert_eq!(names, vec!["e", "d", "c", "b", "a"]);
        assert_eq!(keys, vec![5.0, 4.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn output_is_a_permutation_with_duplicates() {
        let input = vec![3, 1, 3, 2, 1, 3, 0];
        let mut sorted = input.clone();
        heap_sort(&mut sorted, SortOrder::Ascending);
        assert_eq!(sorted, vec![0, 1, 1, 2, 3, 3, 3]);
    }

    #[test]
    fn shuffled_priorities_follow_their_elements() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut elements: Vec<u32> = (0..64).collect();
        elements.shuffle(&mut rng);
        let mut keys: Vec<f32> = elements.iter().map(|&e| e as f32 * 0.5).collect();

        heap_sort_by_priority(&mut elements, &mut keys, SortOrder::Descending);
        assert_eq!(elements, (0..64).rev().collect::<Vec<_>>());
        for (element, key) in elements.iter().zip(&keys) {
            assert_eq!(*element as f32 * 0.5, *key);
        }
    }
}
