use fsarray::DynamicArray;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct Tracked(usize, Arc<AtomicUsize>);

impl Clone for Tracked {
    fn clone(&self) -> Self {
        if self.0 == 2 {
            panic!("cannot clone element {}", self.0);
        }
        Tracked(self.0, self.1.clone())
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        println!("Dropping element {}", self.0);
        self.1.fetch_add(1, Ordering::SeqCst);
    }
}

fn main() {
    println!("--- Exception Safety & RAII Example ---");
    let drop_count = Arc::new(AtomicUsize::new(0));

    {
        let mut arr = DynamicArray::new();
        for i in 0..3 {
            arr.push_back(Tracked(i, drop_count.clone()));
        }
        println!("Array created with 3 elements.");

        let mut target = DynamicArray::new();
        target.push_back(Tracked(7, drop_count.clone()));
        let result = panic::catch_unwind(AssertUnwindSafe(|| target.clone_from(&arr)));
        println!(
            "Copy assignment failed: {}, target still holds {} element(s), first is {}",
            result.is_err(),
            target.len(),
            target[0].0
        );

        match arr.try_resize_with(usize::MAX, || Tracked(99, drop_count.clone())) {
            Ok(()) => println!("unexpected success"),
            Err(e) => println!("Resize refused: {e}; len is still {}", arr.len()),
        }
    }

    // Two elements cloned before the failure, three originals, one target.
    println!("Total elements dropped: {}", drop_count.load(Ordering::SeqCst));
    assert_eq!(drop_count.load(Ordering::SeqCst), 6);
}
