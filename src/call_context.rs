//! Call context and stack (spec §4.7)
//!
//! Threaded through function invocations for recursion tracking and error location.
//! Bounded only by a configured maximum; overflow is fatal, not retryable. Each
//! concurrent substitution evaluation gets its own stack via
//! [`crate::registry::function::FunctionRegistry::for_call_context`], so frames never
//! interleave across contexts even though the underlying caches are shared.

use parking_lot::Mutex;

use crate::error::Error;

/// The default maximum call stack depth (spec §4.7).
pub const DEFAULT_CALL_STACK_LIMIT: usize = 1_000;

/// One frame of the call stack: the function being invoked and where the call
/// originated, e.g. `"blueprint.yaml:42:10"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFrame {
    /// The name of the function being invoked.
    pub function_name: String,
    /// The origin location of the call, as reported by the out-of-scope substitution
    /// resolver (file/line/column or similar).
    pub location: String,
}

/// A bounded call stack, pushed before a function invocation and popped after it returns
/// or fails.
#[derive(Debug, Clone)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    limit: usize,
}

impl CallStack {
    /// Creates an empty stack bounded at `limit` frames.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            frames: Vec::new(),
            limit,
        }
    }

    /// Pushes a new frame, returning [`Error::CallStackOverflow`] if this would exceed
    /// the configured limit.
    pub fn push(&mut self, frame: CallFrame) -> Result<(), Error> {
        if self.frames.len() >= self.limit {
            return Err(Error::CallStackOverflow { limit: self.limit });
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Pops the innermost frame, if any. Called unconditionally once a function call
    /// returns or fails, regardless of outcome.
    pub fn pop(&mut self) -> Option<CallFrame> {
        self.frames.pop()
    }

    /// The innermost frame's call origin, if the stack is non-empty.
    #[must_use]
    pub fn current_location(&self) -> Option<&str> {
        self.frames.last().map(|f| f.location.as_str())
    }

    /// Current stack depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Configured maximum depth.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// All frames, outermost first.
    #[must_use]
    pub fn frames(&self) -> &[CallFrame] {
        &self.frames
    }
}

/// RAII guard that pops a [`CallStack`] frame on drop, so a failing call still unwinds
/// the stack even if the caller returns early with `?`.
///
/// Holds a reference to the `Mutex` itself rather than a `MutexGuard`: the frame is
/// pushed and the lock released immediately, so callers may hold `_guard` across an
/// `.await` (e.g. the invocation the frame describes) without holding a lock over it.
pub struct CallStackGuard<'a> {
    stack: &'a Mutex<CallStack>,
}

impl<'a> CallStackGuard<'a> {
    /// Pushes `frame` onto `stack`, returning a guard that pops it on drop.
    pub fn push(stack: &'a Mutex<CallStack>, frame: CallFrame) -> Result<Self, Error> {
        stack.lock().push(frame)?;
        Ok(Self { stack })
    }
}

impl Drop for CallStackGuard<'_> {
    fn drop(&mut self) {
        self.stack.lock().pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_pop_track_depth() {
        let mut stack = CallStack::new(DEFAULT_CALL_STACK_LIMIT);
        stack
            .push(CallFrame {
                function_name: "concat".to_string(),
                location: "blueprint.yaml:1:1".to_string(),
            })
            .unwrap();
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.current_location(), Some("blueprint.yaml:1:1"));

        stack.pop();
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.current_location(), None);
    }

    #[test]
    fn overflow_is_fatal_not_retryable() {
        let mut stack = CallStack::new(2);
        stack
            .push(CallFrame {
                function_name: "a".to_string(),
                location: "x:1".to_string(),
            })
            .unwrap();
        stack
            .push(CallFrame {
                function_name: "b".to_string(),
                location: "x:2".to_string(),
            })
            .unwrap();

        let err = stack
            .push(CallFrame {
                function_name: "c".to_string(),
                location: "x:3".to_string(),
            })
            .unwrap_err();

        assert!(!err.is_retryable());
        assert!(matches!(err, Error::CallStackOverflow { limit: 2 }));
    }

    #[test]
    fn guard_pops_frame_on_drop_even_on_early_return() {
        let stack = Mutex::new(CallStack::new(DEFAULT_CALL_STACK_LIMIT));
        {
            let _guard = CallStackGuard::push(
                &stack,
                CallFrame {
                    function_name: "concat".to_string(),
                    location: "x:1".to_string(),
                },
            )
            .unwrap();
            assert_eq!(stack.lock().depth(), 1);
        }
        assert_eq!(stack.lock().depth(), 0);
    }
}
