//! Broadcasting a stream of events from one buffer to several consumers with different amounts
//! of free space.

use circulate::CircularBuffer;

fn main() {
    let mut events = CircularBuffer::new(16);
    events.enqueue_many(&["connect", "login", "query", "query", "logout", "disconnect"]);

    let mut audit = CircularBuffer::new(16);
    let mut metrics = CircularBuffer::new(2);

    // Lock-step: nobody gets ahead of the consumer with the least room.
    let moved = events.copy_min_to_others(&mut [&mut audit, &mut metrics]);
    println!("Lock-step broadcast moved {moved} events");
    print_state(&events, &audit, &metrics);

    metrics.clear();

    // Best-effort: the roomiest consumer sets the pace and the others get what fits.
    let moved = events.copy_max_to_others(&mut [&mut audit, &mut metrics]);
    println!("Best-effort broadcast moved {moved} events");
    print_state(&events, &audit, &metrics);
}

fn print_state(
    events: &CircularBuffer<&str>,
    audit: &CircularBuffer<&str>,
    metrics: &CircularBuffer<&str>,
) {
    println!("  pending: {:?}", events.iter().collect::<Vec<_>>());
    println!("  audit:   {:?}", audit.iter().collect::<Vec<_>>());
    println!("  metrics: {:?}", metrics.iter().collect::<Vec<_>>());
}
