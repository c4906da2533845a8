use crate::dense::Mat;
use num_complex::Complex64;
use pretty_dtoa::{dtoa, FmtFloatConfig};

const FLOAT_CONFIG: FmtFloatConfig = FmtFloatConfig::default()
    .add_point_zero(false)
    .max_significant_digits(6);

pub fn format_complex(z: &Complex64) -> String {
    format!(
        "{}{}j{}",
        dtoa(z.re, FLOAT_CONFIG),
        if z.im.signum() < 0.0 { "-" } else { "+" },
        dtoa(z.im.abs(), FLOAT_CONFIG)
    )
}

/// Formats a complex matrix one row per line.
pub fn format_block(m: &Mat<Complex64>) -> String {
    (0..m.rows())
        .map(|r| {
            let a: Vec<String> = m.row(r).map(format_complex).collect();
            format!("[{}]", a.join(", "))
        })
        .collect::<Vec<String>>()
        .join("\n")
}
