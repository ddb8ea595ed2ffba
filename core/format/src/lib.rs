//! Stackable binary-format pipeline: byte sources and the `Format` trait
//! that every decoder/encoder in this workspace is built on.

mod end_ptr;
mod error;
mod format;
mod mode;
pub mod source;

pub use end_ptr::{EndPtr, EndPtrTracker};
pub use error::{FormatError, Result};
pub use format::{chain_lookup, get, Format};
pub use mode::Mode;

/// Runs `ready_format` on a WRITE stack, then returns the backing memory of
/// whichever leaf is below it: higher layers get a chance to back-patch
/// deferred header fields (WAV sizes, a trailing Ogg page) before the final
/// bytes are read out.
pub fn get_memory(top: &mut dyn Format) -> Result<&[u8]> {
    top.ready_format()?;
    top.get_memory()
}

/// Closes a stack top-down: `ready_format` then drop. Rust's ownership
/// chain (`Box<dyn Format>` owning the next layer down) does the recursive
/// teardown for free once the top node is dropped; this just guarantees
/// `ready_format` runs first.
pub fn close(mut top: Box<dyn Format>) -> Result<()> {
    top.ready_format()?;
    drop(top);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use source::Mem;

    #[test]
    fn get_memory_finalizes_then_reads() {
        let mut mem = Mem::write_auto_extend(4).unwrap();
        mem.write_chunk(b"hi").unwrap();
        assert_eq!(get_memory(&mut mem).unwrap(), b"hi");
    }

    #[test]
    fn get_on_leaf_matches_self() {
        let mut mem = Mem::from_bytes(vec![1, 2, 3]);
        assert!(get(&mut mem, "mem").is_some());
        assert!(get(&mut mem, "nope").is_none());
    }
}
