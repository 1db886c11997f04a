//! Clamp/wrap policy for the knob value.
//!
//! The value is taken as `i32` so a step past `i16::MIN`/`i16::MAX` is seen as
//! out of bounds instead of overflowing. A jump of any size is evaluated once
//! against both limits; it lands exactly on the clamp or wrap target.

use crate::config::EdgePolicy;

/// Result of one bounds evaluation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Bounded {
    pub value: i16,
    /// A limit was crossed by this evaluation.
    pub alert: bool,
}

/// Bring `value` back inside `min..=max` according to `edge`.
///
/// With `min > max` both limits can be crossed at once; the `below` branch is
/// applied last and wins.
pub fn enforce(value: i32, min: i16, max: i16, edge: EdgePolicy) -> Bounded {
    let above = value > i32::from(max);
    let below = value < i32::from(min);

    let mut out = value;
    if above {
        out = match edge {
            EdgePolicy::Clamp => i32::from(max),
            EdgePolicy::Wrap => i32::from(min),
        };
    }
    if below {
        out = match edge {
            EdgePolicy::Clamp => i32::from(min),
            EdgePolicy::Wrap => i32::from(max),
        };
    }

    Bounded {
        // In range, or replaced by one of the i16 limits above.
        value: out as i16,
        alert: above || below,
    }
}
