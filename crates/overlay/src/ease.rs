use serde::{Deserialize, Serialize};

/// Easing curves. Every curve maps `0 -> 0` and `1 -> 1` and is strictly
/// increasing in between.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ease {
    Linear,
    #[default]
    Power1Out,
    Power2Out,
    Power1InOut,
    Power2InOut,
    SineInOut,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::Power1Out => 1.0 - (1.0 - t).powi(2),
            Ease::Power2Out => 1.0 - (1.0 - t).powi(3),
            Ease::Power1InOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Ease::Power2InOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Ease::SineInOut => -((std::f32::consts::PI * t).cos() - 1.0) / 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Ease; 6] = [
        Ease::Linear,
        Ease::Power1Out,
        Ease::Power2Out,
        Ease::Power1InOut,
        Ease::Power2InOut,
        Ease::SineInOut,
    ];

    #[test]
    fn endpoints_are_fixed() {
        for ease in ALL {
            assert!(ease.apply(0.0).abs() < 1e-6, "{ease:?}");
            assert!((ease.apply(1.0) - 1.0).abs() < 1e-6, "{ease:?}");
        }
    }

    #[test]
    fn curves_are_strictly_increasing() {
        for ease in ALL {
            let mut last = ease.apply(0.0);
            for step in 1..=100 {
                let v = ease.apply(step as f32 / 100.0);
                assert!(v > last, "{ease:?} not increasing at step {step}");
                last = v;
            }
        }
    }

    #[test]
    fn input_is_clamped() {
        assert_eq!(Ease::Power1Out.apply(-1.0), 0.0);
        assert_eq!(Ease::Power1Out.apply(2.0), 1.0);
    }

    #[test]
    fn out_curves_lead_linear() {
        assert!(Ease::Power1Out.apply(0.25) > 0.25);
        assert!(Ease::Power2Out.apply(0.25) > Ease::Power1Out.apply(0.25));
    }
}
