use fsarray::DynamicArray;

fn main() {
    println!("--- Basic Usage Example ---");
    let mut arr = DynamicArray::new();

    for i in 1..=5 {
        arr.push_back(i * 10);
        println!("Pushed: {}, len: {}, cap: {}", i * 10, arr.len(), arr.capacity());
    }

    arr.insert(arr.begin() + 2, 25);
    println!("After insert at 2: {:?}", arr);

    arr.resize(20);
    println!("After resize(20): len: {}, cap: {}", arr.len(), arr.capacity());

    arr.resize(6);
    let next = arr.erase(arr.begin());
    println!("Erased front, next element is {} at {}", arr[next.offset()], next);

    while let Some(val) = arr.pop() {
        println!("Popped: {}, len: {}", val, arr.len());
    }
}
