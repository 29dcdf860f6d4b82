//! Call-stack capture.
//!
//! Frame numbering starts at [`callers`] itself: frame 0 is `callers`, frame 1
//! is whoever called it, and so on outward. Frames the unwinder adds below
//! `callers` are not counted.

/// Walks outward, counting from the first frame `is_anchor` accepts. Returns
/// 0 when the anchor is never seen or the stack ends first.
fn walk(skip: usize, mut is_anchor: impl FnMut(&backtrace::Frame) -> bool) -> usize {
    let mut anchored = false;
    let mut remaining = skip;
    let mut pc = 0;

    backtrace::trace(|frame| {
        if !anchored {
            if !is_anchor(frame) {
                return true;
            }
            anchored = true;
        }
        if remaining == 0 {
            pc = frame.ip() as usize;
            return false;
        }
        remaining -= 1;
        true
    });

    pc
}

/// Program counter of the frame `skip` levels out from this function, or 0 when
/// the stack is shallower than that.
///
/// Counting is anchored on this function's own frame. Platforms whose unwinder
/// cannot report function start addresses never match the anchor, and every
/// capture there yields 0, so records carry no source.
#[inline(never)]
pub fn callers(skip: usize) -> usize {
    #[cfg(test)]
    walks::record();

    let anchor = callers as usize;
    // Not a tail call: this frame has to be on the stack while it is walked.
    std::hint::black_box(walk(skip, |frame| frame.symbol_address() as usize == anchor))
}

#[cfg(test)]
pub(crate) mod walks {
    use std::cell::Cell;

    thread_local! {
        static WALKS: Cell<usize> = const { Cell::new(0) };
    }

    pub(crate) fn record() {
        WALKS.with(|w| w.set(w.get() + 1));
    }

    /// Stack walks performed on the current thread.
    pub(crate) fn count() -> usize {
        WALKS.with(Cell::get)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calldepth_core::Source;

    // Passing the result through black_box keeps `callers` out of tail
    // position, so this frame survives optimized builds.
    #[inline(never)]
    fn capture_one_out() -> usize {
        std::hint::black_box(callers(1))
    }

    #[test]
    fn skip_one_is_the_direct_caller() {
        let source = Source::resolve(capture_one_out()).expect("resolvable frame");
        assert!(source.file.ends_with("stack.rs"), "{source:?}");
        let function = source.function.unwrap_or_default();
        assert!(function.contains("capture_one_out"), "{function}");
    }

    #[test]
    fn skip_beyond_stack_is_sentinel() {
        assert_eq!(callers(100_000), 0);
    }

    #[test]
    fn missing_anchor_is_sentinel() {
        assert_eq!(walk(0, |_| false), 0);
        assert_eq!(walk(1, |_| false), 0);
    }

    #[test]
    fn walks_are_counted_per_thread() {
        let before = walks::count();
        let _ = callers(1);
        assert_eq!(walks::count(), before + 1);
    }
}
