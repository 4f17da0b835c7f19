//! Log-factorials
//!
//! `ln n!` via the Lanczos approximation of log-gamma, accurate to around
//! 1e-13 relative error over the range used by the multinomial scorer.

const LANCZOS_G: f64 = 7.0;
const LANCZOS_COEFFS: [f64; 9] = [
    0.999_999_999_999_809_93,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_13,
    -176.615_029_162_140_59,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

/// Natural log of the gamma function for positive arguments.
fn ln_gamma(x: f64) -> f64 {
    let z = x - 1.0;
    let mut sum = LANCZOS_COEFFS[0];
    for (i, c) in LANCZOS_COEFFS.iter().enumerate().skip(1) {
        sum += c / (z + i as f64);
    }
    let t = z + LANCZOS_G + 0.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (z + 0.5) * t.ln() - t + sum.ln()
}

/// Natural log of `n!`.
pub fn ln_factorial(n: u64) -> f64 {
    if n < 2 {
        return 0.0;
    }
    ln_gamma(n as f64 + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_values() {
        assert_eq!(ln_factorial(0), 0.0);
        assert_eq!(ln_factorial(1), 0.0);
        assert!((ln_factorial(2) - 2.0f64.ln()).abs() < 1e-12);
        assert!((ln_factorial(5) - 120.0f64.ln()).abs() < 1e-10);
        assert!((ln_factorial(10) - 3_628_800.0f64.ln()).abs() < 1e-9);
    }

    #[test]
    fn test_recurrence() {
        // ln((n+1)!) - ln(n!) == ln(n+1)
        for n in [5u64, 50, 500, 5000] {
            let diff = ln_factorial(n + 1) - ln_factorial(n);
            assert!(
                (diff - ((n + 1) as f64).ln()).abs() < 1e-8,
                "recurrence failed at n = {n}"
            );
        }
    }
}
