/// An event whose name contains this marker only accepts game changes from its creator.
pub const LOCK_MARKER: &str = "🔒";

pub fn is_locked(name: &str) -> bool {
    name.contains(LOCK_MARKER)
}
