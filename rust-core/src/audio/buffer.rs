//! Lock-free ring buffer for captured samples
//!
//! Carries mono samples from the audio driver's callback thread to the scan
//! session, which cuts them into fixed-size analysis blocks.

use ringbuf::{HeapConsumer, HeapProducer, HeapRb};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Thread-safe sample ring buffer
pub struct SampleRingBuffer {
    producer: HeapProducer<f64>,
    consumer: HeapConsumer<f64>,
    capacity: usize,
}

impl SampleRingBuffer {
    /// Create new ring buffer with given capacity
    ///
    /// # Arguments
    /// * `capacity` - Buffer capacity in samples
    pub fn new(capacity: usize) -> Self {
        let rb = HeapRb::<f64>::new(capacity);
        let (producer, consumer) = rb.split();

        Self {
            producer,
            consumer,
            capacity,
        }
    }

    /// Split into producer and consumer ends
    pub fn split(self) -> (SampleProducer, SampleConsumer) {
        let dropped = Arc::new(AtomicU64::new(0));
        (
            SampleProducer {
                producer: self.producer,
                dropped: Arc::clone(&dropped),
            },
            SampleConsumer {
                consumer: self.consumer,
                dropped,
                capacity: self.capacity,
            },
        )
    }
}

/// Writing end, owned by the driver callback
pub struct SampleProducer {
    producer: HeapProducer<f64>,
    dropped: Arc<AtomicU64>,
}

impl SampleProducer {
    /// Write samples to buffer
    ///
    /// Samples that do not fit are dropped and counted.
    ///
    /// # Returns
    /// Number of samples actually written
    pub fn write(&mut self, samples: &[f64]) -> usize {
        let written = self.producer.push_slice(samples);
        if written < samples.len() {
            self.dropped
                .fetch_add((samples.len() - written) as u64, Ordering::Relaxed);
        }
        written
    }

    /// Get number of free slots
    pub fn free_len(&self) -> usize {
        self.producer.free_len()
    }
}

/// Reading end, owned by the session
pub struct SampleConsumer {
    consumer: HeapConsumer<f64>,
    dropped: Arc<AtomicU64>,
    capacity: usize,
}

impl SampleConsumer {
    /// Fill `block` completely if enough samples are buffered
    ///
    /// Never blocks. Returns `false` and leaves the buffer untouched when fewer
    /// than `block.len()` samples are available.
    pub fn pop_block(&mut self, block: &mut [f64]) -> bool {
        if self.consumer.len() < block.len() {
            return false;
        }
        self.consumer.pop_slice(block) == block.len()
    }

    /// Get number of available samples
    pub fn len(&self) -> usize {
        self.consumer.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }

    /// Samples lost to overflow since the buffer was created
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Get buffer capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_read_waits_for_full_block() {
        let (mut producer, mut consumer) = SampleRingBuffer::new(1024).split();
        let mut block = [0.0; 4];

        producer.write(&[1.0, 2.0, 3.0]);
        assert!(!consumer.pop_block(&mut block));
        assert_eq!(consumer.len(), 3);

        producer.write(&[4.0, 5.0]);
        assert!(consumer.pop_block(&mut block));
        assert_eq!(block, [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(consumer.len(), 1);
    }

    #[test]
    fn test_overflow_is_counted() {
        let (mut producer, consumer) = SampleRingBuffer::new(10).split();

        let written = producer.write(&[1.0; 20]);
        assert!(written <= 10);
        assert_eq!(consumer.dropped(), (20 - written) as u64);
        assert_eq!(consumer.capacity(), 10);
    }

    #[test]
    fn test_empty_buffer() {
        let (_producer, mut consumer) = SampleRingBuffer::new(16).split();
        assert!(consumer.is_empty());
        assert!(!consumer.pop_block(&mut [0.0; 1]));
    }
}
