use serde::Serialize;

use crate::quantity::power::Watts;

/// Net grid power split into its draw and injection parts.
///
/// The whole signed value goes into a single bucket, and the injection keeps its negative sign.
#[must_use]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct GridSplit {
    /// Power drawn from the grid, «prélèvement».
    #[serde(rename = "pre")]
    pub draw: Watts,

    /// Power injected into the grid, non-positive.
    #[serde(rename = "inj")]
    pub injection: Watts,
}

impl From<Watts> for GridSplit {
    fn from(total: Watts) -> Self {
        // Raw comparisons: `OrderedFloat` would rank NaN above zero.
        if total.0 > 0.0 {
            Self { draw: total, injection: Watts::ZERO }
        } else if total.0 < 0.0 {
            Self { draw: Watts::ZERO, injection: total }
        } else {
            Self::default()
        }
    }
}

pub fn split_total(total: Watts) -> GridSplit {
    GridSplit::from(total)
}
