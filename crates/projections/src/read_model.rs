//! Read model trait for inspecting projected state.

/// A read model exposing the size of a projection's view.
///
/// `count` must not block; implementations report 0 while the view is being
/// written.
pub trait ReadModel: Send + Sync {
    /// Returns the name of this read model.
    fn name(&self) -> &'static str;

    /// Returns the number of entries in this read model.
    fn count(&self) -> usize;
}
