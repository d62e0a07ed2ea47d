//! A producer and a consumer connected by a small `BoundedChannel`, with the consumer shutting
//! down through a `CancellationToken` once the producer is done.

use std::thread;
use std::time::Duration;

use circulate::{BoundedChannel, CancellationToken, Error};

const ITEMS: u32 = 20;

fn main() {
    let channel = BoundedChannel::new(3);
    let done = CancellationToken::new();

    thread::scope(|s| {
        let consumer = s.spawn(|| {
            let mut sum = 0;

            loop {
                match channel.try_receive(Duration::from_millis(10), Some(&done)) {
                    Ok(value) => sum += value,
                    Err(Error::Timeout) => {
                        println!("Consumer is idle, {} items buffered", channel.len());
                    }
                    Err(Error::Cancelled) => break,
                    Err(error) => panic!("unexpected channel error: {error}"),
                }
            }

            // Cancellation may arrive while items are still buffered.
            while let Ok(value) = channel.try_receive(Duration::ZERO, None) {
                sum += value;
            }

            sum
        });

        for i in 1..=ITEMS {
            // Blocks whenever the consumer falls behind by more than the channel capacity.
            channel.send(i);
        }

        done.cancel();

        let sum = consumer.join().unwrap();
        println!("Consumer received a total of {sum}");
        assert_eq!(sum, ITEMS * (ITEMS + 1) / 2);
    });
}
