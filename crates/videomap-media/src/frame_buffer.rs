//! Frame buffer manager - decoder-thread intake of raw frames
//!
//! Each playback slot owns one [`FrameBufferManager`]. The decoder thread
//! writes into a private back buffer between `lock` and unlock (guard drop).
//! On `display` the finished frame is copied into a separate buffer and
//! published as an immutable `Arc<FrameBuffer>` snapshot through an atomic
//! pointer swap, so the render thread never reads memory the decoder is
//! writing and the decoder never waits on a render-thread copy.
//!
//! Composites are marshaled to the UI thread through a single-slot
//! [`FrameGate`]: a display that arrives while a composite is still pending
//! is dropped. The snapshot is always replaced first, so whichever composite
//! eventually runs sees the newest frame.

use crate::decoder::FrameSink;
use crate::format::{FrameFormat, PixelFormat};
use crate::{MediaError, Result};
use arc_swap::ArcSwapOption;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use videomap_core::PolygonId;

/// Write access to the back buffer; dropping it is the unlock
pub type FrameWriteGuard<'a> = MappedMutexGuard<'a, FrameBuffer>;

/// An owned block of pixel memory tagged with its format
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    format: FrameFormat,
    data: Vec<u8>,
    sequence: u64,
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("format", &self.format)
            .field("len", &self.data.len())
            .field("sequence", &self.sequence)
            .finish()
    }
}

impl FrameBuffer {
    /// Allocate a zeroed buffer of `height * pitch` bytes.
    ///
    /// Returns `None` for an empty format or when the allocation fails.
    pub fn allocate(format: FrameFormat) -> Option<Self> {
        Self::try_allocate(format).ok()
    }

    /// Like [`allocate`](Self::allocate), reporting why no buffer exists
    pub fn try_allocate(format: FrameFormat) -> Result<Self> {
        let failed = MediaError::Allocation {
            width: format.width,
            height: format.height,
        };
        if format.is_empty() {
            return Err(failed);
        }
        let Some(len) = format.byte_len() else {
            return Err(failed);
        };

        let mut data = Vec::new();
        if data.try_reserve_exact(len).is_err() {
            return Err(failed);
        }
        data.resize(len, 0);

        Ok(Self {
            format,
            data,
            sequence: 0,
        })
    }

    /// Wrap existing pixel data. `None` if the length does not match the
    /// format or a row does not fit in the pitch.
    pub fn from_data(format: FrameFormat, data: Vec<u8>) -> Option<Self> {
        let row_bytes = (format.width as usize).checked_mul(format.pixel_format.bytes_per_pixel())?;
        if format.byte_len()? != data.len() || format.is_empty() || (format.pitch as usize) < row_bytes
        {
            return None;
        }
        Some(Self {
            format,
            data,
            sequence: 0,
        })
    }

    pub fn format(&self) -> FrameFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.format.width
    }

    pub fn height(&self) -> u32 {
        self.format.height
    }

    pub fn pitch(&self) -> u32 {
        self.format.pitch
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.format.pixel_format
    }

    /// Raw bytes, `height * pitch` long
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Raw bytes for the decoder to write into
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// One row of pixels (`pitch` bytes)
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    pub fn row(&self, y: u32) -> &[u8] {
        let pitch = self.format.pitch as usize;
        let start = y as usize * pitch;
        &self.data[start..start + pitch]
    }

    /// Mutable row of pixels
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let pitch = self.format.pitch as usize;
        let start = y as usize * pitch;
        &mut self.data[start..start + pitch]
    }

    /// Publication counter; increases with every displayed frame
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Single-slot "composite pending" flag
#[derive(Debug, Default)]
pub struct FrameGate {
    pending: AtomicBool,
}

impl FrameGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot. Returns false if a composite is already pending.
    pub fn try_arm(&self) -> bool {
        self.pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Free the slot
    pub fn clear(&self) {
        self.pending.store(false, Ordering::Release);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

/// UI-thread side of composite marshaling: collects ids of polygons whose
/// frame buffer has a new frame waiting
#[derive(Debug, Clone)]
pub struct CompositeQueue {
    tx: Sender<PolygonId>,
    rx: Receiver<PolygonId>,
}

impl Default for CompositeQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositeQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Sender handle for one polygon's frame buffer
    pub fn notifier(&self, id: PolygonId) -> CompositeNotifier {
        CompositeNotifier {
            id,
            tx: self.tx.clone(),
        }
    }

    /// Take every pending notification without blocking
    pub fn drain(&self) -> Vec<PolygonId> {
        self.rx.try_iter().collect()
    }

    /// Number of notifications waiting
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Decoder-thread side of composite marshaling
#[derive(Debug, Clone)]
pub struct CompositeNotifier {
    id: PolygonId,
    tx: Sender<PolygonId>,
}

impl CompositeNotifier {
    pub fn id(&self) -> PolygonId {
        self.id
    }

    /// Schedule a composite; false if the UI side is gone
    pub fn notify(&self) -> bool {
        self.tx.send(self.id).is_ok()
    }
}

/// Display counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Frames that scheduled a composite
    pub scheduled: u64,
    /// Frames published while a composite was already pending
    pub coalesced: u64,
}

/// Owner of one playback slot's frame memory
#[derive(Debug)]
pub struct FrameBufferManager {
    pixel_format: PixelFormat,
    /// Decoder writes here
    back: Mutex<Option<FrameBuffer>>,
    /// Last published frame
    front: ArcSwapOption<FrameBuffer>,
    /// Recycled publication target
    spare: Mutex<Option<FrameBuffer>>,
    gate: FrameGate,
    notifier: Option<CompositeNotifier>,
    sequence: AtomicU64,
    scheduled: AtomicU64,
    coalesced: AtomicU64,
}

impl Default for FrameBufferManager {
    fn default() -> Self {
        Self::new(PixelFormat::default())
    }
}

impl FrameBufferManager {
    /// Manager without UI notification (composites must be polled)
    pub fn new(pixel_format: PixelFormat) -> Self {
        Self {
            pixel_format,
            back: Mutex::new(None),
            front: ArcSwapOption::empty(),
            spare: Mutex::new(None),
            gate: FrameGate::new(),
            notifier: None,
            sequence: AtomicU64::new(0),
            scheduled: AtomicU64::new(0),
            coalesced: AtomicU64::new(0),
        }
    }

    /// Manager that notifies `notifier` when a composite is scheduled
    pub fn with_notifier(pixel_format: PixelFormat, notifier: CompositeNotifier) -> Self {
        Self {
            notifier: Some(notifier),
            ..Self::new(pixel_format)
        }
    }

    /// Replace the buffers for a new `width x height` format.
    ///
    /// Returns the pitch (`width * 4`), or `None` if the format is empty or the
    /// allocation failed. In that case no buffer exists and every later `lock`
    /// returns `None`.
    pub fn on_format_negotiated(&self, width: u32, height: u32) -> Option<u32> {
        let mut back = self.back.lock();
        *back = None;
        self.front.store(None);
        *self.spare.lock() = None;

        let Some(format) = FrameFormat::packed(width, height, self.pixel_format) else {
            warn!("Frame format {}x{} overflows", width, height);
            return None;
        };
        if format.is_empty() {
            debug!("Empty frame format {}x{}, no buffer allocated", width, height);
            return None;
        }

        match FrameBuffer::try_allocate(format) {
            Ok(buffer) => {
                info!(
                    "Frame buffer allocated: {}x{} pitch {} ({})",
                    width,
                    height,
                    format.pitch,
                    format.pixel_format.fourcc()
                );
                *back = Some(buffer);
                Some(format.pitch)
            }
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    /// Borrow the back buffer for one frame
    pub fn lock(&self) -> Option<FrameWriteGuard<'_>> {
        MutexGuard::try_map(self.back.lock(), |buffer| buffer.as_mut()).ok()
    }

    /// Publish the back buffer and schedule at most one composite.
    ///
    /// Returns true if this call scheduled a composite.
    pub fn on_frame_ready(&self) -> bool {
        if !self.publish() {
            return false;
        }

        if !self.gate.try_arm() {
            self.coalesced.fetch_add(1, Ordering::Relaxed);
            debug!("Composite already pending, frame coalesced");
            return false;
        }

        if let Some(notifier) = &self.notifier {
            if !notifier.notify() {
                self.gate.clear();
                return false;
            }
        }
        self.scheduled.fetch_add(1, Ordering::Relaxed);
        true
    }

    fn publish(&self) -> bool {
        // Held until the swap so a concurrent release cannot be overtaken
        let back = self.back.lock();
        let Some(source) = back.as_ref() else {
            return false;
        };

        let recycled = self
            .spare
            .lock()
            .take()
            .filter(|spare| spare.format == source.format);
        let mut target = match recycled.or_else(|| FrameBuffer::allocate(source.format)) {
            Some(target) => target,
            None => {
                warn!("Frame publication buffer allocation failed");
                return false;
            }
        };

        target.data.copy_from_slice(&source.data);
        target.sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;

        if let Some(previous) = self.front.swap(Some(Arc::new(target))) {
            // Still held by the renderer: let it go when the renderer drops it
            if let Ok(buffer) = Arc::try_unwrap(previous) {
                *self.spare.lock() = Some(buffer);
            }
        }
        drop(back);
        true
    }

    /// Free every buffer. Safe to call from any thread at any time.
    pub fn release(&self) {
        let mut back = self.back.lock();
        let had_buffer = back.take().is_some();
        self.front.store(None);
        *self.spare.lock() = None;
        drop(back);

        if had_buffer {
            debug!("Frame buffer released");
        }
    }

    /// Latest published frame, if any
    pub fn snapshot(&self) -> Option<Arc<FrameBuffer>> {
        self.front.load_full()
    }

    /// UI side: free the composite slot, then take the newest frame.
    ///
    /// Clearing first means a frame published during the composite schedules
    /// a fresh one instead of being lost.
    pub fn take_composite(&self) -> Option<Arc<FrameBuffer>> {
        self.gate.clear();
        self.snapshot()
    }

    pub fn is_composite_pending(&self) -> bool {
        self.gate.is_pending()
    }

    /// Current negotiated format
    pub fn format(&self) -> Option<FrameFormat> {
        self.back.lock().as_ref().map(|b| b.format)
    }

    /// True when a buffer is allocated
    pub fn has_buffer(&self) -> bool {
        self.back.lock().is_some()
    }

    pub fn stats(&self) -> FrameStats {
        FrameStats {
            scheduled: self.scheduled.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
        }
    }
}

impl FrameSink for FrameBufferManager {
    fn format(&self, width: u32, height: u32) -> Option<u32> {
        self.on_format_negotiated(width, height)
    }

    fn lock(&self) -> Option<FrameWriteGuard<'_>> {
        FrameBufferManager::lock(self)
    }

    fn display(&self) {
        self.on_frame_ready();
    }

    fn cleanup(&self) {
        self.release();
    }
}
