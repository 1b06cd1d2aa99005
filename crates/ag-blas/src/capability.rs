use std::fmt;

/// Hardware generation of an accelerator, as `major.minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComputeCapability {
    pub major: u32,
    pub minor: u32,
}

impl ComputeCapability {
    /// Consumer Pascal (arch 61). No native int8 tensor-core path.
    pub const SM_61: ComputeCapability = ComputeCapability::new(6, 1);

    pub const fn new(major: u32, minor: u32) -> Self {
        ComputeCapability { major, minor }
    }

    /// Builds a capability from a packed arch number such as `61` or `86`.
    pub fn from_arch(arch: u32) -> Self {
        ComputeCapability::new(arch / 10, arch % 10)
    }

    /// Packed arch number, `major * 10 + minor`.
    pub fn arch(&self) -> u32 {
        self.major * 10 + self.minor
    }
}

impl fmt::Display for ComputeCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
