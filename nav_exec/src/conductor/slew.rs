//! Slew rate limiting of controller outputs

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Limits how fast an output may grow in magnitude. Reductions in magnitude pass straight
/// through, and a change of sign restarts the ramp from zero.
#[derive(Debug, Copy, Clone, Default)]
pub struct SlewLimiter {
    /// Largest magnitude increase per call, 0 for no limiting.
    max_step: f64,

    last: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SlewLimiter {
    pub fn new(max_step: f64) -> Self {
        Self {
            max_step,
            last: 0.0,
        }
    }

    pub fn limit(&mut self, target: f64) -> f64 {
        let same_sign = target * self.last > 0.0;

        let out = if self.max_step == 0.0
            || target == 0.0
            || (same_sign && target.abs() <= self.last.abs())
        {
            target
        } else {
            let base = if same_sign { self.last } else { 0.0 };
            base + target.signum() * (target.abs() - base.abs()).min(self.max_step)
        };

        self.last = out;
        out
    }

    pub fn reset(&mut self) {
        self.last = 0.0;
    }

    pub fn last(&self) -> f64 {
        self.last
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ramp() {
        let mut s = SlewLimiter::new(1.0);

        assert_eq!(s.limit(3.5), 1.0);
        assert_eq!(s.limit(3.5), 2.0);
        assert_eq!(s.limit(3.5), 3.0);
        assert_eq!(s.limit(3.5), 3.5);
        assert_eq!(s.limit(3.5), 3.5);
    }

    #[test]
    fn test_decrease_passes() {
        let mut s = SlewLimiter::new(1.0);
        for _ in 0..5 {
            s.limit(5.0);
        }

        assert_eq!(s.limit(0.5), 0.5);
        assert_eq!(s.limit(0.0), 0.0);
    }

    #[test]
    fn test_sign_change() {
        let mut s = SlewLimiter::new(1.0);
        for _ in 0..5 {
            s.limit(5.0);
        }

        assert_eq!(s.limit(-4.0), -1.0);
        assert_eq!(s.limit(-4.0), -2.0);
    }

    #[test]
    fn test_unlimited() {
        let mut s = SlewLimiter::new(0.0);
        assert_eq!(s.limit(12.0), 12.0);
        assert_eq!(s.limit(-12.0), -12.0);

        let mut s = SlewLimiter::new(2.0);
        s.limit(2.0);
        s.reset();
        assert_eq!(s.last(), 0.0);
        assert_eq!(s.limit(5.0), 2.0);
    }
}
