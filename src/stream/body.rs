//! Adapter that lets hyper drive a producer.
//!
//! hyper polls a response body only when the connection is ready for more
//! data. Each poll of this body pulls one chunk from the producer, so the
//! socket's backpressure reaches all the way to the file reads. Dropping the
//! body (the client went away) drops the producer and closes its file.

use futures_util::stream;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::{Bytes, Frame};
use std::collections::VecDeque;
use tokio::io::{AsyncRead, AsyncSeek};

use super::{Consumer, ProducerState, StaticProducer};
use crate::http::body::ServeBody;
use crate::logger;

/// Collects what the producer writes until the body hands it to hyper
#[derive(Default)]
struct FrameConsumer {
    pending: VecDeque<Bytes>,
    registered: bool,
    finished: bool,
}

impl Consumer for FrameConsumer {
    fn register_producer(&mut self) {
        self.registered = true;
    }

    fn unregister_producer(&mut self) {
        self.registered = false;
    }

    fn write(&mut self, chunk: Bytes) {
        if !chunk.is_empty() {
            self.pending.push_back(chunk);
        }
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

/// Wrap `producer` in a response body; the producer is started on first poll
pub fn producer_body<F>(producer: StaticProducer<F>) -> ServeBody
where
    F: AsyncRead + AsyncSeek + Unpin + Send + 'static,
{
    let frames = stream::unfold(
        Some((producer, FrameConsumer::default())),
        |state| async move {
            let (mut producer, mut consumer) = state?;

            if producer.state() == ProducerState::Idle {
                if let Err(e) = producer.start(&mut consumer).await {
                    producer.stop();
                    logger::log_error(&format!("Failed to start response body: {e}"));
                    return Some((Err(e), None));
                }
            }

            loop {
                if let Some(chunk) = consumer.pending.pop_front() {
                    return Some((Ok(Frame::data(chunk)), Some((producer, consumer))));
                }
                if consumer.finished || producer.state().is_terminal() {
                    return None;
                }
                if let Err(e) = producer.produce_next(&mut consumer).await {
                    producer.stop();
                    logger::log_error(&format!("Response body aborted: {e}"));
                    return Some((Err(e), None));
                }
            }
        },
    );

    StreamBody::new(frames).boxed_unsync()
}
