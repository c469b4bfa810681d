use super::*;
use crate::raw::fault;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use crossbeam::scope;

thread_local! {
    static CLONES_LEFT: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Counts live instances; clones can be made to panic via `CLONES_LEFT`.
#[derive(Debug)]
struct Tracked {
    value: usize,
    live: Arc<AtomicUsize>,
}

impl Tracked {
    fn new(value: usize, live: &Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Tracked {
            value,
            live: live.clone(),
        }
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        CLONES_LEFT.with(|left| match left.get() {
            Some(0) => panic!("clone failed"),
            Some(n) => left.set(Some(n - 1)),
            None => {}
        });
        Tracked::new(self.value, &self.live)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

fn tracked(n: usize, live: &Arc<AtomicUsize>) -> DynamicArray<Tracked> {
    let mut arr = DynamicArray::new();
    for i in 0..n {
        arr.push_back(Tracked::new(i, live));
    }
    arr
}

fn values(arr: &DynamicArray<Tracked>) -> Vec<usize> {
    arr.iter().map(|t| t.value).collect()
}

fn counting(n: i32) -> DynamicArray<i32> {
    (0..n).collect()
}

#[test]
fn test_default_construction() {
    let arr: DynamicArray<i32> = DynamicArray::new();
    assert_eq!(arr.len(), 0);
    assert!(arr.is_empty());
    assert_eq!(arr.capacity(), DynamicArray::<i32>::DEFAULT_CAPACITY);
    assert_eq!(arr.begin(), arr.end());

    let arr: DynamicArray<i32> = DynamicArray::default();
    assert_eq!(arr.capacity(), 16);
}

#[test]
fn test_construction_from_size() {
    for n in [0, 1, 15, 16, 17, 40] {
        let arr: DynamicArray<u64> = DynamicArray::with_size(n);
        assert_eq!(arr.len(), n);
        assert_eq!(arr.capacity(), n.max(16));
        assert_eq!(arr.end() - arr.begin(), n);
    }
}

#[test]
fn test_empty_has_no_allocation() {
    let arr: DynamicArray<String> = DynamicArray::empty();
    assert_eq!(arr.len(), 0);
    assert_eq!(arr.capacity(), 0);
    assert!(arr.as_slice().is_empty());
}

#[test]
fn test_push_within_default_capacity() {
    let mut arr = DynamicArray::new();
    for i in 0..10 {
        arr.push_back(i);
    }
    assert_eq!(arr.len(), 10);
    assert_eq!(arr.capacity(), 16);
    for i in 0..10 {
        assert_eq!(arr[i], i);
    }
}

#[test]
fn test_resize_past_capacity_doubles_request() {
    let mut arr = counting(10);
    arr.resize(20);
    assert_eq!(arr.len(), 20);
    assert_eq!(arr.capacity(), 40);
    assert_eq!(&arr.as_slice()[..10], &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
}

#[test]
fn test_resize_within_capacity_keeps_block() {
    let mut arr = counting(10);
    let block = arr.as_ptr();
    arr.resize(16);
    assert_eq!(arr.len(), 16);
    assert_eq!(arr.capacity(), 16);
    assert_eq!(arr.as_ptr(), block);

    arr.resize(3);
    assert_eq!(arr, [0, 1, 2]);
    assert_eq!(arr.capacity(), 16);
}

#[test]
fn test_shrinking_resize_drops_tail() {
    let live = Arc::new(AtomicUsize::new(0));
    let mut arr = tracked(8, &live);
    arr.resize_with(3, || unreachable!());
    assert_eq!(values(&arr), vec![0, 1, 2]);
    assert_eq!(live.load(Ordering::SeqCst), 3);
}

#[test]
fn test_erase_middle() {
    let mut arr = counting(10);
    let next = arr.erase(arr.begin() + 5);
    assert_eq!(arr, [0, 1, 2, 3, 4, 6, 7, 8, 9]);
    assert_eq!(arr.len(), 9);
    assert_eq!(next, arr.begin() + 5);
    assert_eq!(arr[next.offset()], 6);
}

#[test]
fn test_erase_last_returns_end() {
    let mut arr = counting(3);
    let next = arr.erase(arr.end() - 1);
    assert_eq!(next, arr.end());
    assert_eq!(arr, [0, 1]);
}

#[test]
fn test_erase_at_end_is_reported() {
    let mut arr = counting(3);
    assert_eq!(
        arr.try_erase(arr.end()),
        Err(ArrayError::PositionOutOfRange { position: 3, len: 3 })
    );
    assert_eq!(arr, [0, 1, 2]);
}

#[test]
#[should_panic(expected = "position out of range")]
fn test_erase_at_end_panics() {
    let mut arr = counting(3);
    arr.erase(arr.end());
}

#[test]
fn test_insert_positions() {
    let mut arr = DynamicArray::new();
    arr.push_back(1);
    arr.push_back(3);

    let at = arr.insert(arr.begin() + 1, 2);
    assert_eq!(at, arr.begin() + 1);
    assert_eq!(arr, [1, 2, 3]);

    let at = arr.insert(arr.begin(), 0);
    assert_eq!(at, arr.begin());
    let at = arr.insert(arr.end(), 4);
    assert_eq!(at, arr.end() - 1);
    assert_eq!(arr, [0, 1, 2, 3, 4]);
}

#[test]
fn test_insert_past_end_returns_item() {
    let mut arr = counting(2);
    let rejected = arr.try_insert(arr.end() + 1, 7).unwrap_err();
    assert_eq!(
        rejected.error,
        ArrayError::PositionOutOfRange { position: 3, len: 2 }
    );
    assert_eq!(rejected.into_item(), 7);
    assert_eq!(arr, [0, 1]);
}

#[test]
#[should_panic(expected = "position out of range")]
fn test_insert_past_end_panics() {
    let mut arr: DynamicArray<i32> = DynamicArray::new();
    arr.insert(Cursor::at(1), 10);
}

#[test]
fn test_insert_reallocates_when_full() {
    let mut arr = DynamicArray::with_capacity(2);
    arr.push_back('a');
    arr.push_back('b');
    assert_eq!(arr.capacity(), 2);

    // The cursor is taken before the reallocation and still names the slot.
    let pos = arr.begin() + 1;
    let at = arr.insert(pos, 'x');
    assert_eq!(arr.capacity(), 6);
    assert_eq!(at, pos);
    assert_eq!(arr, ['a', 'x', 'b']);
}

#[test]
fn test_insert_erase_round_trip() {
    let original = counting(12);
    for offset in 0..=original.len() {
        let mut arr = original.clone();
        let at = arr.insert(Cursor::at(offset), -1);
        assert_eq!(arr[at.offset()], -1);
        arr.erase(at);
        assert_eq!(arr, original);
    }
}

#[test]
fn test_push_pop_round_trip() {
    let mut arr = counting(5);
    arr.push_back(99);
    arr.pop_back();
    assert_eq!(arr, [0, 1, 2, 3, 4]);
    assert_eq!(arr.len(), 5);
}

#[test]
#[should_panic(expected = "pop_back on an empty DynamicArray")]
fn test_pop_back_empty_panics() {
    let mut arr: DynamicArray<i32> = DynamicArray::new();
    arr.pop_back();
}

#[test]
fn test_basic_push_pop() {
    let mut v = DynamicArray::new();
    v.push_back(1);
    v.push_back(2);
    v.push_back(3);
    assert_eq!(v.len(), 3);
    assert_eq!(v.pop(), Some(3));
    assert_eq!(v.pop(), Some(2));
    assert_eq!(v.pop(), Some(1));
    assert_eq!(v.pop(), None);
}

#[test]
fn test_remove() {
    let mut v = counting(4);
    assert_eq!(v.remove(1), 1);
    assert_eq!(v, [0, 2, 3]);
    assert_eq!(
        v.try_remove(3),
        Err(ArrayError::IndexOutOfRange { index: 3, len: 3 })
    );
}

#[test]
fn test_checked_access() {
    let mut arr = counting(3);
    assert_eq!(arr.at(2), Ok(&2));
    assert_eq!(
        arr.at(3),
        Err(ArrayError::IndexOutOfRange { index: 3, len: 3 })
    );
    *arr.at_mut(0).unwrap() = 10;
    arr[1] = 11;
    assert_eq!(arr, [10, 11, 2]);
    assert_eq!(arr.get(3), None);
}

#[test]
#[should_panic(expected = "index out of range: the len is 3 but the index is 3")]
fn test_index_one_past_end_panics() {
    let arr = counting(3);
    let _ = arr[3];
}

#[test]
#[should_panic(expected = "index out of range")]
fn test_index_beyond_len_within_capacity_panics() {
    let mut arr = counting(3);
    assert!(arr.capacity() > 3);
    arr[5] = 1;
}

#[test]
fn test_clone_is_independent() {
    let original = counting(5);
    let mut copy = original.clone();
    assert_eq!(copy, original);
    assert_eq!(copy.capacity(), original.capacity());

    copy[0] = 100;
    copy.push_back(5);
    assert_eq!(original, [0, 1, 2, 3, 4]);
    assert_eq!(copy, [100, 1, 2, 3, 4, 5]);
}

#[test]
fn test_clone_of_empty_state() {
    let arr: DynamicArray<i32> = DynamicArray::empty();
    let copy = arr.clone();
    assert_eq!(copy.capacity(), 0);
    assert!(copy.is_empty());
}

#[test]
fn test_copy_assignment() {
    let source = counting(4);
    let mut target = counting(30);
    target.clone_from(&source);
    assert_eq!(target, source);
    assert_eq!(target.capacity(), source.capacity());

    let mut other = DynamicArray::empty();
    other.assign_from(&source).unwrap();
    assert_eq!(other, [0, 1, 2, 3]);
}

#[test]
fn test_take_leaves_empty_state() {
    let mut source = counting(5);
    let moved = source.take();
    assert_eq!(moved, [0, 1, 2, 3, 4]);
    assert_eq!(moved.capacity(), 16);
    assert_eq!(source.len(), 0);
    assert_eq!(source.capacity(), 0);

    // The moved-from array stays usable.
    source.push_back(7);
    assert_eq!(source, [7]);
    assert_eq!(source.capacity(), 2);
}

#[test]
fn test_move_assignment_swaps() {
    let mut target = counting(2);
    let mut source: DynamicArray<i32> = DynamicArray::with_size(20);
    target.move_from(&mut source);
    assert_eq!(target.len(), 20);
    assert_eq!(target.capacity(), 20);
    assert_eq!(source, [0, 1]);
    assert_eq!(source.capacity(), 16);
}

#[test]
fn test_swap() {
    let mut a = counting(3);
    let mut b = DynamicArray::empty();
    let block = a.as_ptr();
    a.swap(&mut b);
    assert!(a.is_empty());
    assert_eq!(a.capacity(), 0);
    assert_eq!(b, [0, 1, 2]);
    assert_eq!(b.as_ptr(), block);
}

#[test]
fn test_resize_allocation_failure_keeps_state() {
    let mut arr = counting(10);
    let block = arr.as_ptr();

    fault::fail_next();
    let result = arr.try_resize(20);
    fault::reset();

    assert!(matches!(result, Err(ArrayError::AllocFailed { .. })));
    assert_eq!(arr.len(), 10);
    assert_eq!(arr.capacity(), 16);
    assert_eq!(arr.as_ptr(), block);
    assert_eq!(arr, [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
}

#[test]
fn test_insert_allocation_failure_keeps_state() {
    let mut arr = DynamicArray::with_capacity(3);
    arr.extend([1, 2, 3]);

    fault::fail_next();
    let rejected = arr.try_insert(arr.begin(), 0).unwrap_err();
    fault::reset();

    assert!(rejected.error.is_alloc_failure());
    assert_eq!(rejected.item, 0);
    assert_eq!(arr, [1, 2, 3]);
    assert_eq!(arr.capacity(), 3);

    assert!(arr.try_push_back(4).is_ok());
    assert_eq!(arr.capacity(), 8);
}

#[test]
fn test_clone_allocation_failure() {
    let source = counting(5);
    fault::fail_next();
    let result = source.try_clone();
    fault::reset();
    assert!(matches!(result, Err(ArrayError::AllocFailed { .. })));
    assert_eq!(source, [0, 1, 2, 3, 4]);

    let mut target = counting(2);
    fault::fail_next();
    assert!(target.assign_from(&source).is_err());
    fault::reset();
    assert_eq!(target, [0, 1]);
}

#[test]
fn test_construction_allocation_failure() {
    fault::fail_next();
    assert!(DynamicArray::<i32>::try_new().is_err());
    fault::fail_next();
    assert!(DynamicArray::<i32>::try_with_size(4).is_err());
    fault::reset();
    assert!(DynamicArray::<i32>::try_with_size(4).is_ok());
}

#[test]
fn test_capacity_overflow() {
    let mut arr: DynamicArray<u64> = counting(3).into_iter().map(|x| x as u64).collect();
    assert_eq!(arr.try_resize(usize::MAX), Err(ArrayError::CapacityOverflow));
    assert_eq!(
        arr.try_resize(usize::MAX / 4),
        Err(ArrayError::CapacityOverflow)
    );
    assert_eq!(arr.try_reserve(usize::MAX), Err(ArrayError::CapacityOverflow));
    assert_eq!(arr, [0, 1, 2]);
    assert_eq!(arr.capacity(), 16);
}

#[test]
fn test_oversized_request_fails_without_change() {
    let mut arr: DynamicArray<u8> = DynamicArray::new();
    arr.push_back(1);
    let err = arr.try_reserve(isize::MAX as usize / 2).unwrap_err();
    assert!(err.is_alloc_failure());
    assert_eq!(arr, [1]);
    assert_eq!(arr.capacity(), 16);
}

#[test]
fn test_panicking_clone_leaks_nothing() {
    let live = Arc::new(AtomicUsize::new(0));
    let source = tracked(5, &live);

    CLONES_LEFT.with(|left| left.set(Some(3)));
    let result = panic::catch_unwind(AssertUnwindSafe(|| source.try_clone()));
    CLONES_LEFT.with(|left| left.set(None));

    assert!(result.is_err());
    assert_eq!(live.load(Ordering::SeqCst), 5);
    assert_eq!(values(&source), vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_panicking_copy_assignment_keeps_target() {
    let live = Arc::new(AtomicUsize::new(0));
    let source = tracked(4, &live);
    let mut target = tracked(2, &live);

    CLONES_LEFT.with(|left| left.set(Some(1)));
    let result = panic::catch_unwind(AssertUnwindSafe(|| target.clone_from(&source)));
    CLONES_LEFT.with(|left| left.set(None));

    assert!(result.is_err());
    assert_eq!(values(&target), vec![0, 1]);
    assert_eq!(live.load(Ordering::SeqCst), 6);
}

#[test]
fn test_panicking_fill_keeps_state() {
    let live = Arc::new(AtomicUsize::new(0));
    let mut arr = tracked(10, &live);

    // Within capacity.
    let mut made = 0;
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        arr.resize_with(14, || {
            made += 1;
            if made == 3 {
                panic!("fill failed");
            }
            Tracked::new(100, &live)
        })
    }));
    assert!(result.is_err());
    assert_eq!(arr.len(), 10);
    assert_eq!(arr.capacity(), 16);
    assert_eq!(live.load(Ordering::SeqCst), 10);

    // Past capacity.
    let block = arr.as_ptr();
    let mut made = 0;
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        arr.resize_with(30, || {
            made += 1;
            if made == 12 {
                panic!("fill failed");
            }
            Tracked::new(100, &live)
        })
    }));
    assert!(result.is_err());
    assert_eq!(arr.len(), 10);
    assert_eq!(arr.capacity(), 16);
    assert_eq!(arr.as_ptr(), block);
    assert_eq!(values(&arr), (0..10).collect::<Vec<_>>());
    assert_eq!(live.load(Ordering::SeqCst), 10);
}

#[test]
fn test_raii_drop() {
    let live = Arc::new(AtomicUsize::new(0));
    {
        let mut arr = tracked(10, &live);
        arr.resize_with(40, || Tracked::new(0, &live));
        arr.erase(arr.begin());
        arr.pop_back();
        assert_eq!(live.load(Ordering::SeqCst), 38);
    }
    assert_eq!(live.load(Ordering::SeqCst), 0);
}

#[test]
fn test_into_iter_drops_remaining() {
    let live = Arc::new(AtomicUsize::new(0));
    let arr = tracked(6, &live);
    let mut iter = arr.into_iter();
    assert_eq!(iter.next().map(|t| t.value), Some(0));
    assert_eq!(iter.next_back().map(|t| t.value), Some(5));
    assert_eq!(iter.len(), 4);
    drop(iter);
    assert_eq!(live.load(Ordering::SeqCst), 0);
}

#[test]
fn test_iterators() {
    let mut v = DynamicArray::new();
    v.push_back(10);
    v.push_back(20);
    v.push_back(30);

    let mut sum = 0;
    for &x in &v {
        sum += x;
    }
    assert_eq!(sum, 60);

    for x in &mut v {
        *x += 1;
    }
    assert_eq!(v[0], 11);

    let collected: Vec<i32> = v.into_iter().collect();
    assert_eq!(collected, vec![11, 21, 31]);
}

#[test]
fn test_grow_and_shrink() {
    let mut v = DynamicArray::with_capacity(2);
    assert_eq!(v.capacity(), 2);
    v.push_back(1);
    v.push_back(2);
    v.push_back(3);
    assert_eq!(v.capacity(), 6);
    v.shrink_to_fit();
    assert_eq!(v.capacity(), 3);
    v.clear();
    v.shrink_to_fit();
    assert_eq!(v.capacity(), 0);
}

#[test]
fn test_try_reserve() {
    let mut v: DynamicArray<i32> = DynamicArray::empty();
    assert!(v.try_reserve(10).is_ok());
    assert_eq!(v.capacity(), 10);
    assert!(v.try_reserve(5).is_ok());
    assert_eq!(v.capacity(), 10);
}

#[test]
fn test_zero_sized_elements() {
    let mut v = DynamicArray::new();
    for _ in 0..100 {
        v.push_back(());
    }
    assert_eq!(v.len(), 100);
    v.erase(v.begin() + 50);
    assert_eq!(v.len(), 99);
    assert_eq!(v.into_iter().count(), 99);
}

#[test]
fn test_cursor_arithmetic() {
    let arr = counting(4);
    let mut pos = arr.begin();
    pos += 3;
    assert_eq!(pos, arr.end() - 1);
    pos -= 1;
    assert_eq!(pos.offset(), 2);
    assert_eq!(usize::from(pos), 2);
    assert_eq!(arr.end() - arr.begin(), arr.len());
    assert_eq!(pos.to_string(), "@2");
}

#[test]
fn test_error_messages() {
    assert_eq!(ArrayError::CapacityOverflow.to_string(), "capacity overflow");
    let layout = std::alloc::Layout::array::<u32>(4).unwrap();
    assert_eq!(
        ArrayError::AllocFailed { layout }.to_string(),
        "memory allocation of 16 bytes failed"
    );
    assert!(!ArrayError::IndexOutOfRange { index: 1, len: 0 }.is_alloc_failure());
}

#[test]
fn test_concurrency() {
    let v = counting(100);

    scope(|s| {
        s.spawn(|_| {
            let sum: i32 = v.iter().sum();
            assert_eq!(sum, 4950);
        });
        s.spawn(|_| {
            for (i, x) in v.iter().enumerate() {
                assert_eq!(*x, i as i32);
            }
        });
    })
    .unwrap();
}
