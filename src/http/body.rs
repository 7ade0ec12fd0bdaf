//! Body interception.
//!
//! # Responsibilities
//! - Count every data byte that flows through a request or response body
//! - Optionally mirror those bytes into an in-memory buffer
//! - Forward frames, trailers, size hints and errors unchanged
//!
//! # Design Decisions
//! - One wrapper type serves both directions; the logger decides which
//!   [`Capture`] handle each side gets
//! - The buffer only exists when capture is enabled, counting is always on
//! - Buffering is unbounded here; callers put a body limit in front
//! - Frames are forwarded as soon as the inner body yields them, so
//!   streaming responses keep streaming

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use http_body::{Body as HttpBody, Frame, SizeHint};

/// Shared view of the bytes seen by a [`CaptureBody`].
///
/// Cloning is cheap; every clone observes the same counter and buffer.
#[derive(Debug, Clone)]
pub struct Capture {
    inner: Arc<CaptureState>,
}

#[derive(Debug)]
struct CaptureState {
    bytes: AtomicU64,
    buffer: Option<Mutex<BytesMut>>,
}

impl Capture {
    /// Create a capture handle. `buffered` decides whether bytes are kept.
    pub fn new(buffered: bool) -> Self {
        Self {
            inner: Arc::new(CaptureState {
                bytes: AtomicU64::new(0),
                buffer: buffered.then(|| Mutex::new(BytesMut::new())),
            }),
        }
    }

    /// Count bytes without keeping them.
    pub fn counting() -> Self {
        Self::new(false)
    }

    /// Count and keep bytes.
    pub fn buffering() -> Self {
        Self::new(true)
    }

    /// Account for one chunk that passed through.
    pub fn record(&self, chunk: &[u8]) {
        self.inner
            .bytes
            .fetch_add(chunk.len() as u64, Ordering::Relaxed);
        if let Some(buffer) = &self.inner.buffer {
            buffer
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend_from_slice(chunk);
        }
    }

    /// Total bytes recorded so far.
    pub fn bytes(&self) -> u64 {
        self.inner.bytes.load(Ordering::Relaxed)
    }

    pub fn is_buffered(&self) -> bool {
        self.inner.buffer.is_some()
    }

    /// Copy of the mirrored bytes. Empty when not buffering.
    pub fn contents(&self) -> Bytes {
        match &self.inner.buffer {
            Some(buffer) => {
                let buffer = buffer.lock().unwrap_or_else(PoisonError::into_inner);
                Bytes::copy_from_slice(&buffer)
            }
            None => Bytes::new(),
        }
    }

    /// Mirrored bytes as text, replacing invalid UTF-8.
    pub fn contents_lossy(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }
}

/// Body wrapper that reports every data frame to a [`Capture`].
#[derive(Debug)]
pub struct CaptureBody<B> {
    inner: B,
    capture: Capture,
}

impl<B> CaptureBody<B> {
    pub fn new(inner: B, capture: Capture) -> Self {
        Self { inner, capture }
    }

    pub fn capture(&self) -> &Capture {
        &self.capture
    }

    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B> HttpBody for CaptureBody<B>
where
    B: HttpBody<Data = Bytes> + Unpin,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        if let Poll::Ready(Some(Ok(frame))) = &polled {
            if let Some(data) = frame.data_ref() {
                this.capture.record(data);
            }
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
