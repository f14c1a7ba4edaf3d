//! Response streaming module
//!
//! Pull-driven producers that copy a file (or parts of it) into a response.
//! The transport calls [`StaticProducer::produce_next`] whenever it can take
//! more bytes; each call pushes at most one bounded chunk to the
//! [`Consumer`]. Nothing is read ahead of demand.
//!
//! Every producer walks the same states:
//!
//! ```text
//! Idle -> Started -> Producing* -> Finished
//!           \            \
//!            +------------+----> Stopped   (consumer gone)
//! ```
//!
//! All progress (bytes written, current part) lives in the producer itself,
//! so a consumer that asks for the next chunk while a previous write is still
//! in flight only ever observes consistent state.

mod body;
mod multipart;
mod producers;
mod strategy;

pub use body::producer_body;
pub use multipart::{generate_boundary, MultipartPlan, PartPlan};
pub use producers::{MultipleRangeProducer, SingleRangeProducer, WholeFileProducer};
pub use strategy::{make_producer, Prepared};

use hyper::body::Bytes;
use tokio::io::{AsyncRead, AsyncSeek};

/// Upper bound on the bytes pushed per `produce_next` call
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Transport side of the flow-control contract
pub trait Consumer {
    /// A producer has started and will be driven by this consumer.
    fn register_producer(&mut self);
    /// The producer will not be driven any more.
    fn unregister_producer(&mut self);
    /// Queue one chunk of body bytes.
    fn write(&mut self, chunk: Bytes);
    /// The body is complete.
    fn finish(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerState {
    Idle,
    Started,
    Producing,
    Finished,
    Stopped,
}

impl ProducerState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Stopped)
    }
}

/// One of the three production strategies, chosen by range count
pub enum StaticProducer<F> {
    Whole(WholeFileProducer<F>),
    Single(SingleRangeProducer<F>),
    Multiple(MultipleRangeProducer<F>),
}

impl<F> StaticProducer<F>
where
    F: AsyncRead + AsyncSeek + Unpin,
{
    /// Position the file and register with `consumer`.
    pub async fn start<C: Consumer>(&mut self, consumer: &mut C) -> std::io::Result<()> {
        match self {
            Self::Whole(p) => {
                p.start(consumer);
                Ok(())
            }
            Self::Single(p) => p.start(consumer).await,
            Self::Multiple(p) => p.start(consumer).await,
        }
    }

    /// Push the next chunk; finishes the consumer after the last byte.
    pub async fn produce_next<C: Consumer>(&mut self, consumer: &mut C) -> std::io::Result<()> {
        match self {
            Self::Whole(p) => p.produce_next(consumer).await,
            Self::Single(p) => p.produce_next(consumer).await,
            Self::Multiple(p) => p.produce_next(consumer).await,
        }
    }
}

impl<F> StaticProducer<F> {
    pub const fn state(&self) -> ProducerState {
        match self {
            Self::Whole(p) => p.state(),
            Self::Single(p) => p.state(),
            Self::Multiple(p) => p.state(),
        }
    }

    /// Close the file and detach; safe to call any number of times.
    pub fn stop(&mut self) {
        match self {
            Self::Whole(p) => p.stop(),
            Self::Single(p) => p.stop(),
            Self::Multiple(p) => p.stop(),
        }
    }
}
