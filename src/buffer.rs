// ABOUTME: Bounded pool of fixed-capacity buffers in three size classes (§4.1)
// ABOUTME: Acquire suspends on a per-class semaphore; release is automatic via Buffer's Drop

use std::sync::Arc;

use bytes::BytesMut;
use crossbeam_queue::SegQueue;
use tokio::sync::Semaphore;
use tracing::trace;

use crate::error::FrameError;
use crate::frame::{LARGE, MEDIUM, SMALL};

/// One of the three buffer capacities that exist in this system. No other capacity is
/// ever allocated, and buffers never migrate between classes (§4.1 policy).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SizeClass {
    Small,
    Medium,
    Large,
}

impl SizeClass {
    pub const ALL: [SizeClass; 3] = [SizeClass::Small, SizeClass::Medium, SizeClass::Large];

    pub const fn capacity(self) -> usize {
        match self {
            SizeClass::Small => SMALL,
            SizeClass::Medium => MEDIUM,
            SizeClass::Large => LARGE,
        }
    }

    /// The smallest class whose capacity is `>= requested`, or `None` if it exceeds LARGE.
    fn smallest_fitting(requested: usize) -> Option<SizeClass> {
        Self::ALL.into_iter().find(|class| class.capacity() >= requested)
    }

    fn index(self) -> usize {
        match self {
            SizeClass::Small => 0,
            SizeClass::Medium => 1,
            SizeClass::Large => 2,
        }
    }

    fn from_capacity(capacity: usize) -> Option<SizeClass> {
        Self::ALL.into_iter().find(|class| class.capacity() == capacity)
    }
}

#[derive(Debug)]
struct ClassPool {
    class: SizeClass,
    free: SegQueue<BytesMut>,
    permits: Semaphore,
}

impl ClassPool {
    fn new(class: SizeClass, count: usize) -> Self {
        let free = SegQueue::new();
        for _ in 0..count {
            free.push(BytesMut::with_capacity(class.capacity()));
        }
        ClassPool {
            class,
            free,
            permits: Semaphore::new(count),
        }
    }
}

/// Process-wide (in practice, per-application-root) collection of pre-allocated buffers.
///
/// Holds `P` buffers per size class. Capacity never changes after construction: nothing
/// in this type ever allocates a buffer beyond what `new` pre-allocates, and nothing ever
/// frees one early. A starved class blocks its caller in `acquire` until a sibling buffer
/// of that class is released, which is the pool's only form of back-pressure.
#[derive(Debug)]
pub struct BufferPool {
    classes: [ClassPool; 3],
}

impl BufferPool {
    /// Pre-allocate `buffers_per_class` buffers in each of the three size classes.
    pub fn new(buffers_per_class: usize) -> Arc<Self> {
        Arc::new(BufferPool {
            classes: [
                ClassPool::new(SizeClass::Small, buffers_per_class),
                ClassPool::new(SizeClass::Medium, buffers_per_class),
                ClassPool::new(SizeClass::Large, buffers_per_class),
            ],
        })
    }

    fn class_pool(&self, class: SizeClass) -> &ClassPool {
        &self.classes[class.index()]
    }

    /// Acquire a buffer whose capacity is at least `size`, suspending until one is free.
    ///
    /// Chooses the smallest size class that fits; never migrates a buffer from a larger
    /// class to satisfy a smaller request. Returns `BufferTooLarge` immediately (no
    /// suspension) if `size` exceeds the LARGE class.
    pub async fn acquire(self: &Arc<Self>, size: usize) -> Result<Buffer, FrameError> {
        let class = SizeClass::smallest_fitting(size).ok_or(FrameError::BufferTooLarge {
            requested: size,
            max: LARGE,
        })?;
        let pool = self.class_pool(class);
        let permit = pool
            .permits
            .acquire()
            .await
            .map_err(|_| FrameError::ResourceInterrupted)?;
        permit.forget();

        let mut data = pool.free.pop().expect("semaphore permit without a free buffer");
        data.clear();
        trace!(?class, "buffer acquired");

        Ok(Buffer {
            data,
            class,
            pool: Arc::clone(self),
        })
    }
}

/// A leased, fixed-capacity buffer.
///
/// Returning it to its pool is automatic: [`Buffer`] is consumed by `Drop`, which pushes
/// the underlying storage back onto its class's free queue and releases the matching
/// semaphore permit. This is the guard the spec's "release on every exit path" invariant
/// is built on — a caller cannot forget to release short of calling `mem::forget`, and
/// early returns via `?` release correctly because the unwind runs the destructor.
///
/// Dereferences to [`bytes::BytesMut`]: writing through `BufMut` and reading the written
/// range back are the same buffer with no separate "flip" step, unlike a raw NIO-style
/// byte buffer with independent position/limit cursors.
#[derive(Debug)]
pub struct Buffer {
    data: BytesMut,
    class: SizeClass,
    pool: Arc<BufferPool>,
}

impl Buffer {
    pub fn size_class(&self) -> SizeClass {
        self.class
    }

    pub fn capacity(&self) -> usize {
        self.class.capacity()
    }
}

impl std::ops::Deref for Buffer {
    type Target = BytesMut;
    fn deref(&self) -> &BytesMut {
        &self.data
    }
}

impl std::ops::DerefMut for Buffer {
    fn deref_mut(&mut self) -> &mut BytesMut {
        &mut self.data
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        let mut data = std::mem::replace(&mut self.data, BytesMut::new());
        data.clear();
        let class = self.class;
        debug_assert_eq!(
            SizeClass::from_capacity(data.capacity()),
            Some(class),
            "buffer capacity drifted from its size class"
        );
        let pool = self.pool.class_pool(class);
        pool.free.push(data);
        pool.permits.add_permits(1);
        trace!(?class, "buffer released");
    }
}
