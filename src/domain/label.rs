//! The closed class set produced by the screening classifier.

use serde::{Deserialize, Serialize};

/// One of the two classes the classifier distinguishes.
///
/// The indices mirror the training layout of the deployed model:
/// class 0 is the indicator class, class 1 is normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassLabel {
    /// Facial features consistent with a Down syndrome indicator.
    #[serde(rename = "Down Syndrome")]
    DownSyndrome,
    /// No indicator detected.
    Normal,
}

impl ClassLabel {
    /// Number of classes in the closed set.
    pub const COUNT: usize = 2;

    /// All classes in index order.
    pub fn all() -> [ClassLabel; Self::COUNT] {
        [ClassLabel::DownSyndrome, ClassLabel::Normal]
    }

    /// The class at the given model output index.
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(ClassLabel::DownSyndrome),
            1 => Some(ClassLabel::Normal),
            _ => None,
        }
    }

    /// The model output index of this class.
    pub fn index(self) -> usize {
        match self {
            ClassLabel::DownSyndrome => 0,
            ClassLabel::Normal => 1,
        }
    }

    /// Human-readable name used in reports.
    pub fn display_name(self) -> &'static str {
        match self {
            ClassLabel::DownSyndrome => "Down Syndrome",
            ClassLabel::Normal => "Normal",
        }
    }

    /// Compact name used in archival filenames (no spaces).
    pub fn archival_tag(self) -> &'static str {
        match self {
            ClassLabel::DownSyndrome => "DownSyndrome",
            ClassLabel::Normal => "Normal",
        }
    }
}

impl std::fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
