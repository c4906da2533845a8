// Copyright (c) 2022-2024, Richard Lincoln. All rights reserved.

use num_complex::Complex64;

pub const J: Complex64 = Complex64 { re: 0.0, im: 1.0 };

/// Number of phase slots reserved for every bus and every branch.
pub const NPHASE: usize = 3;

#[macro_export]
macro_rules! cmplx {
    () => {
        num_complex::Complex64::new(0.0, 0.0)
    };
    ($arg1:expr) => {
        num_complex::Complex64::new($arg1, 0.0)
    };
    ($arg1:expr, $arg2:expr) => {
        num_complex::Complex64::new($arg1, $arg2)
    };
}

/// Global phase slots `[3k, 3k+1, 3k+2]` of the `k`-th bus or branch.
pub fn phase_slots(k: usize) -> [usize; NPHASE] {
    [k * NPHASE, k * NPHASE + 1, k * NPHASE + 2]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_slots() {
        assert_eq!(phase_slots(0), [0, 1, 2]);
        assert_eq!(phase_slots(4), [12, 13, 14]);
        assert_eq!(cmplx!(1.0, -2.0) * J, cmplx!(2.0, 1.0));
    }
}
