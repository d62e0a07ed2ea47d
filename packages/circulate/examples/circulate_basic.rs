//! Basic usage of `CircularBuffer`: single-item and bulk transfer, wrap-around, growth and
//! in-place sorting.

use circulate::{CircularBuffer, GrowthPolicy};

fn main() {
    let mut buffer = CircularBuffer::new(4);

    buffer.enqueue("alpha").unwrap();
    buffer.enqueue("bravo").unwrap();
    buffer.prepend("zero").unwrap();

    println!("Contents: {:?}", buffer.iter().collect::<Vec<_>>());
    println!("Front: {:?}, back: {:?}", buffer.front(), buffer.back());

    // Bulk insert only copies what fits.
    let copied = buffer.enqueue_many(&["charlie", "delta", "echo"]);
    println!("Bulk insert copied {copied} of 3 items, buffer is full: {}", buffer.is_full());

    // A full fixed-capacity buffer hands the rejected value back.
    let rejected = buffer.enqueue("foxtrot").unwrap_err();
    let reason = rejected.error();
    println!("Rejected {:?}: {reason}", rejected.into_inner());

    // Removing from the front frees room at the back, so the contents wrap around.
    let mut out = [""; 2];
    let taken = buffer.dequeue_many(&mut out);
    println!("Dequeued {:?}", out.get(..taken).unwrap_or_default());

    buffer.enqueue("golf").unwrap();
    buffer.enqueue("hotel").unwrap();
    println!("After wrapping: {:?}", buffer.iter().collect::<Vec<_>>());

    buffer.sort();
    println!("Sorted: {:?}", buffer.iter().collect::<Vec<_>>());

    // A growing buffer doubles its capacity instead of rejecting values.
    let mut growing = CircularBuffer::builder()
        .capacity(2)
        .growth_policy(GrowthPolicy::Double)
        .build();

    for i in 0..10 {
        growing.enqueue(i).unwrap();
    }

    println!(
        "Growing buffer holds {} items in capacity {}",
        growing.len(),
        growing.capacity()
    );
}
