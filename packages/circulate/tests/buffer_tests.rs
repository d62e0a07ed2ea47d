//! Integration tests for `CircularBuffer`.
//!
//! These compare long pseudo-random operation sequences against `VecDeque` and exercise the
//! multi-buffer operations through the public API only.

use std::collections::VecDeque;

use circulate::{CircularBuffer, Error, GrowthPolicy};
use testing::TestRng;

fn contents<T: Clone>(buffer: &CircularBuffer<T>) -> Vec<T> {
    buffer.iter().cloned().collect()
}

#[test]
fn matches_vec_deque_model() {
    const CAPACITY: usize = 7;

    let mut rng = TestRng::new(0xC0FF_EE00);
    let mut buffer = CircularBuffer::new(CAPACITY);
    let mut model = VecDeque::new();

    for step in 0..5_000_u32 {
        match rng.next_below(6) {
            0 | 1 => {
                let accepted = buffer.enqueue(step).is_ok();
                assert_eq!(accepted, model.len() < CAPACITY);
                if accepted {
                    model.push_back(step);
                }
            }
            2 => {
                let accepted = buffer.prepend(step).is_ok();
                assert_eq!(accepted, model.len() < CAPACITY);
                if accepted {
                    model.push_front(step);
                }
            }
            3 => assert_eq!(buffer.dequeue(), model.pop_front()),
            4 => {
                let batch = (0..rng.next_below(4))
                    .map(|i| step + u32::try_from(i).unwrap())
                    .collect::<Vec<_>>();
                let accepted = buffer.enqueue_many(&batch);
                assert_eq!(accepted, batch.len().min(CAPACITY - model.len()));
                model.extend(batch.iter().take(accepted));
            }
            _ => {
                let mut out = [0; 3];
                let taken = buffer.dequeue_many(&mut out);
                let expected = model.drain(..model.len().min(3)).collect::<Vec<_>>();
                assert_eq!(out.get(..taken).unwrap(), expected.as_slice());
            }
        }

        assert_eq!(buffer.len(), model.len());
        assert_eq!(buffer.len() + buffer.available(), CAPACITY);
        assert_eq!(buffer.front(), model.front());
        assert_eq!(buffer.back(), model.back());
        assert!(buffer.iter().eq(model.iter()));
    }
}

#[test]
fn growing_buffer_matches_vec_deque_model() {
    let mut rng = TestRng::new(42);
    let mut buffer = CircularBuffer::builder()
        .capacity(2)
        .growth_policy(GrowthPolicy::Double)
        .build();
    let mut model = VecDeque::new();

    for step in 0..2_000_u32 {
        if rng.chance(60) {
            buffer.enqueue(step).unwrap();
            model.push_back(step);
        } else {
            assert_eq!(buffer.dequeue(), model.pop_front());
        }

        assert!(buffer.capacity().is_power_of_two());
        assert!(buffer.len() <= buffer.capacity());
        assert!(buffer.iter().eq(model.iter()));
    }
}

#[test]
fn capacity_three_walkthrough() {
    let mut buffer = CircularBuffer::new(3);

    buffer.enqueue('a').unwrap();
    buffer.enqueue('b').unwrap();
    buffer.enqueue('c').unwrap();

    let rejected = buffer.enqueue('d').unwrap_err();
    assert_eq!(rejected.error(), Error::BufferFull);
    assert_eq!(rejected.into_inner(), 'd');

    assert_eq!(buffer.dequeue(), Some('a'));
    buffer.enqueue('d').unwrap();

    assert_eq!(contents(&buffer), vec!['b', 'c', 'd']);
}

#[test]
fn pipeline_of_buffers() {
    // Items flow source -> stage -> sink, each hop limited by the room downstream.
    let mut source = CircularBuffer::new(16);
    let mut stage = CircularBuffer::new(4);
    let mut sink = CircularBuffer::new(16);

    assert_eq!(source.enqueue_many(&(0..10).collect::<Vec<_>>()), 10);

    let mut delivered = 0;
    while !source.is_empty() || !stage.is_empty() {
        delivered += stage.concatenate_available(&mut source);
        sink.concatenate_available(&mut stage);
    }

    assert_eq!(delivered, 10);
    assert_eq!(contents(&sink), (0..10).collect::<Vec<_>>());
}

#[test]
fn fan_out_to_uneven_consumers() {
    let mut source = CircularBuffer::new(8);
    source.enqueue_many(&["a", "b", "c", "d", "e"]);

    let mut roomy = CircularBuffer::new(8);
    let mut cramped = CircularBuffer::new(2);

    // The slowest consumer limits a lock-step broadcast.
    assert_eq!(source.copy_min_to_others(&mut [&mut roomy, &mut cramped]), 2);
    assert_eq!(contents(&roomy), vec!["a", "b"]);
    assert_eq!(contents(&cramped), vec!["a", "b"]);
    assert_eq!(contents(&source), vec!["c", "d", "e"]);

    cramped.clear();
    cramped.enqueue("x").unwrap();

    // The fastest consumer sets the pace, the cramped one gets what fits.
    assert_eq!(source.copy_max_to_others(&mut [&mut roomy, &mut cramped]), 3);
    assert_eq!(contents(&roomy), vec!["a", "b", "c", "d", "e"]);
    assert_eq!(contents(&cramped), vec!["x", "c"]);
    assert!(source.is_empty());
}

#[test]
fn concatenate_is_transactional() {
    let mut target = CircularBuffer::new(4);
    target.enqueue_many(&[1, 2, 3]);

    let mut other = CircularBuffer::new(4);
    other.enqueue_many(&[4, 5]);

    assert_eq!(target.concatenate(&mut other), Err(Error::BufferFull));
    assert_eq!(contents(&target), vec![1, 2, 3]);
    assert_eq!(contents(&other), vec![4, 5]);

    assert_eq!(other.dequeue(), Some(4));
    target.concatenate(&mut other).unwrap();

    assert_eq!(contents(&target), vec![1, 2, 3, 5]);
    assert!(other.is_empty());
}

#[test]
fn copy_from_leaves_source_intact() {
    let mut source = CircularBuffer::new(3);
    source.enqueue_many(&[String::from("x"), String::from("y")]);

    let mut target = CircularBuffer::new(3);
    target.enqueue(String::from("w")).unwrap();

    target.copy_from(&source).unwrap();
    assert_eq!(contents(&target), vec!["w", "x", "y"]);
    assert_eq!(contents(&source), vec!["x", "y"]);

    assert_eq!(target.copy_from(&source), Err(Error::BufferFull));
}

#[test]
fn sort_then_resize_then_reuse() {
    let mut buffer = CircularBuffer::new(5);

    // Push the head around the ring so the contents wrap.
    buffer.enqueue_many(&[0, 0, 0]);
    assert_eq!(buffer.dequeue_many(&mut [0; 3]), 3);
    buffer.enqueue_many(&[9, 4, 7, 1]);

    buffer.sort();
    assert_eq!(contents(&buffer), vec![1, 4, 7, 9]);

    buffer.resize(10).unwrap();
    assert_eq!(buffer.fill(5), 6);
    assert!(buffer.is_full());

    assert_eq!(contents(&buffer), vec![1, 4, 7, 9, 5, 5, 5, 5, 5, 5]);
}
