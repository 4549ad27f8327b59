/// Nested user function calls allowed before a call fails with a stack overflow error.
pub const MAX_CALL_DEPTH: usize = 200;
