/// Least-squares linear fit of `data` against x = 1..N, evaluated at every x.
///
/// Values are rounded to two decimals and never negative. A single point has
/// no slope, so it is returned as-is.
pub fn trendline(data: &[f64]) -> Vec<f64> {
    match data.len() {
        0 => Vec::new(),
        1 => vec![clamp(round_to(data[0], 2))],
        n => {
            let n_f = n as f64;
            let x_mean = (n_f + 1.0) / 2.0;
            let y_mean = data.iter().sum::<f64>() / n_f;

            let mut numerator = 0.0;
            let mut denominator = 0.0;
            for (i, &y) in data.iter().enumerate() {
                let dx = (i + 1) as f64 - x_mean;
                numerator += dx * (y - y_mean);
                denominator += dx * dx;
            }

            let slope = numerator / denominator;
            let intercept = y_mean - slope * x_mean;

            (1..=n)
                .map(|x| clamp(round_to(intercept + slope * x as f64, 2)))
                .collect()
        }
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn clamp(value: f64) -> f64 {
    if value.is_nan() || value <= 0.0 {
        0.0
    } else {
        value
    }
}
