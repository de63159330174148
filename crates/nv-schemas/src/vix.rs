/// Coarse volatility bucket derived from the latest VIX close (spec §3).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub enum VixRegime {
    Low,
    Mid,
    High,
    Extreme,
}

impl VixRegime {
    /// Thresholds: `<15, 15-22, 22-35, >=35`.
    pub fn from_value(vix: f64) -> VixRegime {
        if vix < 15.0 {
            VixRegime::Low
        } else if vix < 22.0 {
            VixRegime::Mid
        } else if vix < 35.0 {
            VixRegime::High
        } else {
            VixRegime::Extreme
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VixRegime::Low => "LOW",
            VixRegime::Mid => "MID",
            VixRegime::High => "HIGH",
            VixRegime::Extreme => "EXTREME",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_inclusive_lower() {
        assert_eq!(VixRegime::from_value(14.99), VixRegime::Low);
        assert_eq!(VixRegime::from_value(15.0), VixRegime::Mid);
        assert_eq!(VixRegime::from_value(22.0), VixRegime::High);
        assert_eq!(VixRegime::from_value(35.0), VixRegime::Extreme);
    }
}
