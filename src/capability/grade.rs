//! Capability grade: a coarse classification of Cpk for dashboards and
//! alert summaries.
//!
//! | Cpk | Grade |
//! |-----|-------|
//! | >= 1.67 | Excellent |
//! | >= 1.33 | Good |
//! | >= 1.00 | Acceptable |
//! | >= 0.67 | NeedsImprovement |
//! | < 0.67 | Critical |
//! | null | NotAvailable |

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse Cpk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityGrade {
    Critical,
    NeedsImprovement,
    Acceptable,
    Good,
    Excellent,
    /// Cpk could not be computed. Rendered as "N/A", never as a number.
    NotAvailable,
}

impl CapabilityGrade {
    /// Classifies a Cpk value.
    ///
    /// # Examples
    ///
    /// ```
    /// use spc_core::capability::CapabilityGrade;
    ///
    /// assert_eq!(CapabilityGrade::from_cpk(Some(1.5)), CapabilityGrade::Good);
    /// assert_eq!(CapabilityGrade::from_cpk(Some(0.5)), CapabilityGrade::Critical);
    /// assert_eq!(CapabilityGrade::from_cpk(None), CapabilityGrade::NotAvailable);
    /// ```
    pub fn from_cpk(cpk: Option<f64>) -> Self {
        match cpk {
            None => Self::NotAvailable,
            Some(v) if v >= 1.67 => Self::Excellent,
            Some(v) if v >= 1.33 => Self::Good,
            Some(v) if v >= 1.0 => Self::Acceptable,
            Some(v) if v >= 0.67 => Self::NeedsImprovement,
            Some(_) => Self::Critical,
        }
    }

    /// One step worse. `Critical` and `NotAvailable` are unchanged.
    pub fn downgraded(self) -> Self {
        match self {
            Self::Excellent => Self::Good,
            Self::Good => Self::Acceptable,
            Self::Acceptable => Self::NeedsImprovement,
            Self::NeedsImprovement | Self::Critical => Self::Critical,
            Self::NotAvailable => Self::NotAvailable,
        }
    }
}

impl fmt::Display for CapabilityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Acceptable => "acceptable",
            Self::NeedsImprovement => "needs improvement",
            Self::Critical => "critical",
            Self::NotAvailable => "N/A",
        };
        f.write_str(label)
    }
}
