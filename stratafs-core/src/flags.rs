//! Conflict-resolution flags for copy and move

use bitflags::bitflags;

bitflags! {
    /// Flag set controlling conflict resolution for a single transfer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct OperationFlags: u32 {
        /// Fail when the destination exists in a conflicting form.
        /// This is also the behavior when no flag is set.
        const REJECT = 1 << 0;
        /// Delete and overwrite a conflicting destination.
        const REPLACE = 1 << 1;
        /// Nest a file inside an existing destination directory.
        const MERGE = 1 << 2;
        /// Process directory trees recursively.
        const RECURSIVE = 1 << 3;
        /// Create missing destination ancestor directories.
        const PARENTS = 1 << 4;
    }
}

impl OperationFlags {
    /// Whether a conflicting destination may be replaced.
    /// REJECT wins over REPLACE; neither set means reject.
    pub fn replace_allowed(self) -> bool {
        !self.contains(Self::REJECT) && self.contains(Self::REPLACE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_reject() {
        assert!(!OperationFlags::default().replace_allowed());
    }

    #[test]
    fn test_replace_allowed() {
        assert!(OperationFlags::REPLACE.replace_allowed());
        assert!((OperationFlags::REPLACE | OperationFlags::RECURSIVE).replace_allowed());
    }

    #[test]
    fn test_reject_wins_over_replace() {
        let flags = OperationFlags::REJECT | OperationFlags::REPLACE;
        assert!(!flags.replace_allowed());
    }

    #[test]
    fn test_compose() {
        let flags = OperationFlags::MERGE | OperationFlags::PARENTS;
        assert!(flags.contains(OperationFlags::MERGE));
        assert!(flags.contains(OperationFlags::PARENTS));
        assert!(!flags.contains(OperationFlags::RECURSIVE));
    }
}
