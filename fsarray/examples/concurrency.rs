use fsarray::DynamicArray;
use std::thread;

fn main() {
    println!("--- Cross-thread Ownership Transfer Example ---");
    let mut arr = DynamicArray::new();
    for i in 0..10 {
        arr.push_back(i);
    }

    println!("Original array (thread main): {:?}", arr);

    // Move ownership to another thread
    let handle = thread::spawn(move || {
        println!("Array in new thread: {:?}", arr);
        arr.push_back(100);
        arr
    });

    let arr = handle.join().unwrap();
    println!("Array back in main thread: {:?}", arr);

    let shared = &arr;
    thread::scope(|s| {
        for t in 0..2 {
            s.spawn(move || {
                let sum: i32 = shared.iter().sum();
                println!("Reader {t} sees sum {sum}");
            });
        }
    });
}
