//! Reusing preallocated connection buffers from a `FixedPool`.

use circulate::{Error, FixedPool};

fn main() {
    let pool = FixedPool::with_initializer(2, || Vec::<u8>::with_capacity(4096));

    let first = pool.create().unwrap();
    let second = pool.create().unwrap();
    println!("Assigned slots {} and {}", first.index(), second.index());

    match pool.create() {
        Err(Error::OutOfMemory) => println!("Pool is exhausted as expected"),
        other => panic!("expected exhaustion, got {other:?}"),
    }

    {
        let mut buffer = pool.get(first);
        buffer.extend_from_slice(b"GET / HTTP/1.1\r\n");
        println!("Slot {} now holds {} bytes", first.index(), buffer.len());
    }

    pool.destroy(first);

    // The slot comes back with whatever the previous user left in it.
    let reused = pool.create().unwrap();
    let mut buffer = pool.get(reused);
    println!(
        "Slot {} reused with {} stale bytes and capacity {}",
        reused.index(),
        buffer.len(),
        buffer.capacity()
    );
    buffer.clear();
    drop(buffer);

    pool.destroy_many([second, reused]);
    println!("{} of {} slots free", pool.available(), pool.capacity());
}
