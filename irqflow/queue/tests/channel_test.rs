//! Channel tests exercising several producers against one consumer

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use irqflow_queue::{EventChannel, EventKind, SendOutcome, TaskMessage, APPLICATION_QUEUE_CAPACITY};

#[test]
fn fifo_order_holds_across_interleaved_producers() {
    let channel: EventChannel<APPLICATION_QUEUE_CAPACITY> = EventChannel::new();

    // Two "interrupt sources" firing in an arbitrary interleaving.
    let gpio = |c: &EventChannel<APPLICATION_QUEUE_CAPACITY>| c.send_from_interrupt(TaskMessage::BUTTON);
    let wake = |c: &EventChannel<APPLICATION_QUEUE_CAPACITY>| c.send_from_interrupt(TaskMessage::WAKE);
    let timer = |c: &EventChannel<APPLICATION_QUEUE_CAPACITY>| c.send_from_interrupt(TaskMessage::TIMER);

    let expected = [
        EventKind::Wake,
        EventKind::Button,
        EventKind::Button,
        EventKind::Timer,
        EventKind::Wake,
        EventKind::Timer,
    ];
    for kind in expected {
        let outcome = match kind {
            EventKind::Button => gpio(&channel),
            EventKind::Wake => wake(&channel),
            EventKind::Timer => timer(&channel),
        };
        assert!(outcome.is_accepted());
    }

    let received: Vec<EventKind> = std::iter::from_fn(|| channel.try_receive())
        .map(|message| message.kind)
        .collect();
    assert_eq!(received, expected);
}

#[test]
fn capacity_plus_one_sends_drop_exactly_the_last() {
    let channel: EventChannel<APPLICATION_QUEUE_CAPACITY> = EventChannel::new();

    for _ in 0..APPLICATION_QUEUE_CAPACITY {
        assert!(channel.send_from_interrupt(TaskMessage::BUTTON).is_accepted());
    }
    assert_eq!(channel.send_from_interrupt(TaskMessage::WAKE), SendOutcome::Dropped);

    let stats = channel.stats();
    assert_eq!(stats.accepted as usize, APPLICATION_QUEUE_CAPACITY);
    assert_eq!(stats.dropped, 1);

    let mut drained = 0;
    while let Some(message) = channel.try_receive() {
        assert_eq!(message, TaskMessage::BUTTON);
        drained += 1;
    }
    assert_eq!(drained, APPLICATION_QUEUE_CAPACITY);
}

#[test]
fn concurrent_producers_never_lose_accepted_messages() {
    const PRODUCERS: usize = 4;
    const SENDS_PER_PRODUCER: usize = 250;

    let channel: Arc<EventChannel<APPLICATION_QUEUE_CAPACITY>> = Arc::new(EventChannel::new());
    let done = Arc::new(AtomicBool::new(false));

    let consumer = {
        let channel = Arc::clone(&channel);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut received = 0usize;
            loop {
                match channel.try_receive() {
                    Some(_) => received += 1,
                    None if done.load(Ordering::Acquire) => {
                        // Producers finished; drain whatever is left.
                        while channel.try_receive().is_some() {
                            received += 1;
                        }
                        return received;
                    }
                    None => thread::yield_now(),
                }
            }
        })
    };

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|idx| {
            let channel = Arc::clone(&channel);
            thread::spawn(move || {
                let message = TaskMessage::new(EventKind::ALL[idx % EventKind::ALL.len()]);
                for _ in 0..SENDS_PER_PRODUCER {
                    channel.send_from_interrupt(message);
                }
            })
        })
        .collect();

    for producer in producers {
        producer.join().expect("producer thread");
    }
    done.store(true, Ordering::Release);
    let received = consumer.join().expect("consumer thread");

    let stats = channel.stats();
    assert_eq!((stats.accepted + stats.dropped) as usize, PRODUCERS * SENDS_PER_PRODUCER);
    assert_eq!(received, stats.accepted as usize);
}
