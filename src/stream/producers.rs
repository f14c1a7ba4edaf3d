//! The three producer strategies.

use hyper::body::Bytes;
use std::io::{self, SeekFrom};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

use super::multipart::PartPlan;
use super::{Consumer, ProducerState, CHUNK_SIZE};

/// File handle plus lifecycle state, shared by every strategy
struct Source<F> {
    file: Option<F>,
    state: ProducerState,
}

impl<F> Source<F> {
    const fn new(file: F) -> Self {
        Self {
            file: Some(file),
            state: ProducerState::Idle,
        }
    }

    fn begin<C: Consumer>(&mut self, consumer: &mut C) {
        if self.state == ProducerState::Idle {
            self.state = ProducerState::Started;
            consumer.register_producer();
        }
    }

    /// Enter `Producing`; false when the producer may not run.
    fn resume(&mut self) -> io::Result<bool> {
        match self.state {
            ProducerState::Idle => Err(io::Error::other("producer polled before start")),
            ProducerState::Finished | ProducerState::Stopped => Ok(false),
            ProducerState::Started | ProducerState::Producing => {
                self.state = ProducerState::Producing;
                Ok(true)
            }
        }
    }

    fn file(&mut self) -> io::Result<&mut F> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("producer file already closed"))
    }

    fn complete<C: Consumer>(&mut self, consumer: &mut C) {
        consumer.unregister_producer();
        consumer.finish();
        self.state = ProducerState::Finished;
        self.file = None;
    }

    fn stop(&mut self) {
        self.file = None;
        if self.state != ProducerState::Finished {
            self.state = ProducerState::Stopped;
        }
    }
}

/// Read at most `limit` bytes; a premature end of file is an error.
async fn read_chunk<F>(file: &mut F, limit: usize) -> io::Result<Vec<u8>>
where
    F: AsyncRead + Unpin,
{
    let mut buf = vec![0; limit];
    let n = file.read(&mut buf).await?;
    if n == 0 && limit > 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "file ended before the expected range was written",
        ));
    }
    buf.truncate(n);
    Ok(buf)
}

fn chunk_limit(remaining: u64, room: usize) -> usize {
    usize::try_from(remaining).map_or(room, |r| r.min(room))
}

/// Streams `size` bytes from the file's current position
///
/// `size` is the length taken from the request's snapshot; bytes appended
/// after it are not sent.
pub struct WholeFileProducer<F> {
    source: Source<F>,
    size: u64,
    written: u64,
}

impl<F> WholeFileProducer<F> {
    pub const fn new(file: F, size: u64) -> Self {
        Self {
            source: Source::new(file),
            size,
            written: 0,
        }
    }

    pub const fn state(&self) -> ProducerState {
        self.source.state
    }

    pub const fn bytes_written(&self) -> u64 {
        self.written
    }

    pub fn stop(&mut self) {
        self.source.stop();
    }
}

impl<F> WholeFileProducer<F>
where
    F: AsyncRead + AsyncSeek + Unpin,
{
    pub fn start<C: Consumer>(&mut self, consumer: &mut C) {
        self.source.begin(consumer);
    }

    pub async fn produce_next<C: Consumer>(&mut self, consumer: &mut C) -> io::Result<()> {
        if !self.source.resume()? {
            return Ok(());
        }
        let limit = chunk_limit(self.size - self.written, CHUNK_SIZE);
        if limit > 0 {
            let data = read_chunk(self.source.file()?, limit).await?;
            self.written += data.len() as u64;
            consumer.write(Bytes::from(data));
        }
        if self.written == self.size {
            self.source.complete(consumer);
        }
        Ok(())
    }
}

/// Streams exactly `size` bytes starting at `offset`
pub struct SingleRangeProducer<F> {
    source: Source<F>,
    offset: u64,
    size: u64,
    written: u64,
}

impl<F> SingleRangeProducer<F> {
    pub const fn new(file: F, offset: u64, size: u64) -> Self {
        Self {
            source: Source::new(file),
            offset,
            size,
            written: 0,
        }
    }

    pub const fn state(&self) -> ProducerState {
        self.source.state
    }

    pub const fn bytes_written(&self) -> u64 {
        self.written
    }

    pub fn stop(&mut self) {
        self.source.stop();
    }
}

impl<F> SingleRangeProducer<F>
where
    F: AsyncRead + AsyncSeek + Unpin,
{
    pub async fn start<C: Consumer>(&mut self, consumer: &mut C) -> io::Result<()> {
        if self.source.state != ProducerState::Idle {
            return Ok(());
        }
        self.source.file()?.seek(SeekFrom::Start(self.offset)).await?;
        self.written = 0;
        self.source.begin(consumer);
        Ok(())
    }

    pub async fn produce_next<C: Consumer>(&mut self, consumer: &mut C) -> io::Result<()> {
        if !self.source.resume()? {
            return Ok(());
        }
        let limit = chunk_limit(self.size - self.written, CHUNK_SIZE);
        if limit > 0 {
            let data = read_chunk(self.source.file()?, limit).await?;
            self.written += data.len() as u64;
            consumer.write(Bytes::from(data));
        }
        if self.written == self.size {
            self.source.complete(consumer);
        }
        Ok(())
    }
}

/// Streams a multipart/byteranges body from a prepared plan
///
/// Each part is its separator followed by its byte range; the plan's last
/// entry is the closing boundary with an empty range.
pub struct MultipleRangeProducer<F> {
    source: Source<F>,
    parts: Vec<PartPlan>,
    index: usize,
    part_written: u64,
    separator_pending: bool,
}

impl<F> MultipleRangeProducer<F> {
    pub const fn new(file: F, parts: Vec<PartPlan>) -> Self {
        Self {
            source: Source::new(file),
            parts,
            index: 0,
            part_written: 0,
            separator_pending: true,
        }
    }

    pub const fn state(&self) -> ProducerState {
        self.source.state
    }

    pub fn stop(&mut self) {
        self.source.stop();
    }
}

impl<F> MultipleRangeProducer<F>
where
    F: AsyncRead + AsyncSeek + Unpin,
{
    pub async fn start<C: Consumer>(&mut self, consumer: &mut C) -> io::Result<()> {
        if self.source.state != ProducerState::Idle {
            return Ok(());
        }
        if self.parts.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "multipart plan has no parts",
            ));
        }
        self.enter_part(0).await?;
        self.source.begin(consumer);
        Ok(())
    }

    async fn enter_part(&mut self, index: usize) -> io::Result<()> {
        self.index = index;
        self.part_written = 0;
        self.separator_pending = true;
        let offset = self.parts[index].offset;
        self.source.file()?.seek(SeekFrom::Start(offset)).await?;
        Ok(())
    }

    pub async fn produce_next<C: Consumer>(&mut self, consumer: &mut C) -> io::Result<()> {
        if !self.source.resume()? {
            return Ok(());
        }

        let mut chunk = Vec::with_capacity(CHUNK_SIZE);
        let mut done = false;
        while chunk.len() < CHUNK_SIZE {
            let part = &self.parts[self.index];
            let part_size = part.size;
            if self.separator_pending {
                chunk.extend_from_slice(part.separator.as_bytes());
                self.separator_pending = false;
            }

            let limit = chunk_limit(
                part_size - self.part_written,
                CHUNK_SIZE.saturating_sub(chunk.len()),
            );
            if limit > 0 {
                let data = read_chunk(self.source.file()?, limit).await?;
                self.part_written += data.len() as u64;
                chunk.extend_from_slice(&data);
            }

            if self.part_written == part_size {
                if self.index + 1 == self.parts.len() {
                    done = true;
                    break;
                }
                self.enter_part(self.index + 1).await?;
            }
        }

        consumer.write(Bytes::from(chunk));
        if done {
            self.source.complete(consumer);
        }
        Ok(())
    }
}
