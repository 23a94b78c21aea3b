//! Recursion limits shared by the converter and both serializers.

/// Default maximum nesting depth. Matches the recursion limit serde_json
/// applies when parsing.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Bounds applied to every recursive walk over a value tree.
///
/// Depth counts container levels: every `Struct` or `List` (map, sequence or
/// record on the native side) adds one, the root container sits at level 1 and
/// scalars add nothing. Entering a container whose level exceeds `max_depth`
/// fails with a `DepthLimitExceeded` error instead of recursing further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_depth: usize,
}

impl Limits {
    pub const fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Limits with no practical depth bound. Only for trusted input.
    pub const fn unbounded() -> Self {
        Self {
            max_depth: usize::MAX,
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}
