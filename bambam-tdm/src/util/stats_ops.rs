use itertools::Itertools;

/// median of the finite values in the collection, or None if there are none.
/// for an even count, the mean of the two central values.
pub fn median<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let sorted = values
        .into_iter()
        .filter(|v| v.is_finite())
        .sorted_by(|a, b| a.total_cmp(b))
        .collect_vec();
    let n = sorted.len();
    match n {
        0 => None,
        _ if n % 2 == 1 => Some(sorted[n / 2]),
        _ => Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0),
    }
}

/// relative deviation |observed - target| / target. callers must skip
/// targets of zero.
pub fn relative_deviation(observed: f64, target: f64) -> f64 {
    (observed - target).abs() / target
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd_even_empty() {
        assert_eq!(median(vec![3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(vec![4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(Vec::<f64>::new()), None);
        assert_eq!(median(vec![f64::NAN, 5.0]), Some(5.0));
    }
}
