/*!
cover_lut.rs - Precomputed cross-state compatibility table.

Overview
========
A `CoverLUT` answers, for every possible *observed operation* key, which
*stored TP* keys it is compatible with. Compatibility is digit-wise: a TP
digit of `X` matches anything, a concrete TP digit must equal the op's digit
(an op digit can never be `X` — `X` is a wildcard only on the TP side).

Built once at startup (729 x up to 729 entries) and shared read-only for the
remainder of the process.
*/

use crate::cross::KEY_SPACE;
use crate::val::Val;

pub struct CoverLUT {
    // compatible_tp_keys[op_key] = all tp_keys compatible with op_key
    compatible_tp_keys: Vec<Vec<u16>>,
}

fn digit_is_compatible(tp_digit: u32, op_digit: u32) -> bool {
    tp_digit == Val::X.digit() || (op_digit != Val::X.digit() && op_digit == tp_digit)
}

fn key_digits(key: u16) -> [u32; 6] {
    let mut digits = [0u32; 6];
    let mut k = key as u32;
    for d in digits.iter_mut().rev() {
        *d = k % 3;
        k /= 3;
    }
    digits
}

impl CoverLUT {
    pub fn build() -> Self {
        let all_digits: Vec<[u32; 6]> = (0..KEY_SPACE as u16).map(key_digits).collect();
        let mut compatible_tp_keys = vec![Vec::new(); KEY_SPACE];
        for op_key in 0..KEY_SPACE {
            let op_digits = &all_digits[op_key];
            for tp_key in 0..KEY_SPACE {
                let tp_digits = &all_digits[tp_key];
                let compatible =
                    (0..6).all(|i| digit_is_compatible(tp_digits[i], op_digits[i]));
                if compatible {
                    compatible_tp_keys[op_key].push(tp_key as u16);
                }
            }
        }
        CoverLUT { compatible_tp_keys }
    }

    pub fn compatible_tp_keys(&self, op_key: u16) -> &[u16] {
        &self.compatible_tp_keys[op_key as usize]
    }
}
