use std::sync::{Arc, Mutex};

/// Snapshot of a WRITE memory leaf's live backing buffer: the address of
/// its first byte and how many bytes have been written so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EndPtr {
    pub addr: usize,
    pub len: usize,
}

/// Handle an external caller attaches to a WRITE `Mem` leaf via
/// [`crate::Format::attach_end_ptr_tracker`]. The leaf updates the shared
/// snapshot on every write, overwrite, and auto-extend reallocation, so a
/// holder of this handle always observes the buffer's current address and
/// length even after the backing `Vec` moves.
#[derive(Clone, Default)]
pub struct EndPtrTracker(Arc<Mutex<EndPtr>>);

impl EndPtrTracker {
    pub fn new() -> Self {
        EndPtrTracker(Arc::new(Mutex::new(EndPtr::default())))
    }

    /// Current address/length snapshot.
    pub fn get(&self) -> EndPtr {
        *self.0.lock().expect("end ptr tracker lock poisoned")
    }

    pub fn update(&self, addr: usize, len: usize) {
        *self.0.lock().expect("end ptr tracker lock poisoned") = EndPtr { addr, len };
    }
}
