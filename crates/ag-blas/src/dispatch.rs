use crate::backend::{EntryPoint, ToolchainVersion};
use crate::capability::ComputeCapability;

/// Backend entry point used for an i8 x i8 -> f32 multiply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Int8Route {
    GemmEx,
    SgemmEx,
}

impl Int8Route {
    pub fn entry(&self) -> EntryPoint {
        match self {
            Int8Route::GemmEx => EntryPoint::GemmEx,
            Int8Route::SgemmEx => EntryPoint::SgemmEx,
        }
    }
}

/// How one capability class picks its int8 route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Int8Rule {
    /// Always the same route.
    Fixed(Int8Route),
    /// `preferred` when the backend toolchain major version is at least
    /// `min_major`, `fallback` otherwise.
    ToolchainGated {
        min_major: u32,
        preferred: Int8Route,
        fallback: Int8Route,
    },
}

impl Int8Rule {
    fn resolve(&self, toolchain: ToolchainVersion) -> Int8Route {
        match *self {
            Int8Rule::Fixed(route) => route,
            Int8Rule::ToolchainGated {
                min_major,
                preferred,
                fallback,
            } => {
                if toolchain.major >= min_major {
                    preferred
                } else {
                    fallback
                }
            }
        }
    }
}

/// Capability -> int8 entry point decision table.
///
/// Rows are matched on exact capability; capabilities without a row use the
/// default route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchTable {
    rules: Vec<(ComputeCapability, Int8Rule)>,
    default_route: Int8Route,
}

impl DispatchTable {
    /// An empty table that routes every capability to `default_route`.
    pub fn new(default_route: Int8Route) -> Self {
        DispatchTable {
            rules: Vec::new(),
            default_route,
        }
    }

    /// Adds or replaces the rule for `capability`.
    pub fn with_rule(mut self, capability: ComputeCapability, rule: Int8Rule) -> Self {
        match self.rules.iter_mut().find(|(cap, _)| *cap == capability) {
            Some(row) => row.1 = rule,
            None => self.rules.push((capability, rule)),
        }
        self
    }

    /// Resolves the entry point for an int8 multiply on `capability`.
    pub fn int8_route(
        &self,
        capability: ComputeCapability,
        toolchain: ToolchainVersion,
    ) -> Int8Route {
        self.rules
            .iter()
            .find(|(cap, _)| *cap == capability)
            .map(|(_, rule)| rule.resolve(toolchain))
            .unwrap_or(self.default_route)
    }
}

impl Default for DispatchTable {
    /// Arch 61 uses `gemm_ex` when built with toolchain 9 or newer and
    /// `sgemm_ex` before that; everything else uses `sgemm_ex`.
    fn default() -> Self {
        DispatchTable::new(Int8Route::SgemmEx).with_rule(
            ComputeCapability::SM_61,
            Int8Rule::ToolchainGated {
                min_major: 9,
                preferred: Int8Route::GemmEx,
                fallback: Int8Route::SgemmEx,
            },
        )
    }
}
