//! Engine-side reordering codes.
//!
//! The numbering follows the classic `Cudd_ReorderingType` enumeration, so
//! that the codes read back from an engine match what C-side tooling prints.
use std::fmt;

/// Heuristic used to choose a new variable order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u32)]
pub enum ReorderingType {
    /// Use whatever method automatic reordering is configured with.
    Same = 0,
    /// Leave the order unchanged.
    None = 1,
    /// Swap random pairs of levels, keeping improvements.
    Random = 2,
    /// Like [`Random`][Self::Random], but one level of each pair is the widest level.
    RandomPivot = 3,
    /// Rudell's sifting.
    Sift = 4,
    /// Sifting repeated until the size stops improving.
    SiftConverge = 5,
    /// Permute every window of two adjacent levels.
    Window2 = 9,
    /// Permute every window of three adjacent levels.
    Window3 = 10,
    /// [`Window2`][Self::Window2] repeated until convergence.
    Window2Conv = 12,
    /// [`Window3`][Self::Window3] repeated until convergence.
    Window3Conv = 13,
}

impl ReorderingType {
    pub const ALL: [ReorderingType; 10] = [
        ReorderingType::Same,
        ReorderingType::None,
        ReorderingType::Random,
        ReorderingType::RandomPivot,
        ReorderingType::Sift,
        ReorderingType::SiftConverge,
        ReorderingType::Window2,
        ReorderingType::Window3,
        ReorderingType::Window2Conv,
        ReorderingType::Window3Conv,
    ];

    /// Numeric engine code.
    pub const fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }
}

impl fmt::Display for ReorderingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReorderingType::Same => "SAME",
            ReorderingType::None => "NONE",
            ReorderingType::Random => "RANDOM",
            ReorderingType::RandomPivot => "RANDOM_PIVOT",
            ReorderingType::Sift => "SIFT",
            ReorderingType::SiftConverge => "SIFT_CONVERGE",
            ReorderingType::Window2 => "WINDOW2",
            ReorderingType::Window3 => "WINDOW3",
            ReorderingType::Window2Conv => "WINDOW2_CONV",
            ReorderingType::Window3Conv => "WINDOW3_CONV",
        };
        write!(f, "{}", name)
    }
}
