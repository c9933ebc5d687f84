use nalgebra::{DMatrix, DVector};

/// singular values below this fraction of the largest are treated as zero.
const RANK_TOLERANCE: f64 = 1e-10;

/// coefficients of an ordinary least squares fit with intercept.
#[derive(Clone, Debug)]
pub struct OlsFit {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    pub r_squared: f64,
}

/// fits `y = b0 + X b` by least squares, solving through the singular value
/// decomposition of the design matrix. a rank-deficient design (e.g. a
/// predictor constant across all households) is rejected rather than
/// returning an arbitrary minimum-norm solution.
///
/// # Arguments
/// * `rows` - one row of predictor values per observation, without intercept
/// * `y` - observed response per row
pub fn ordinary_least_squares(rows: &[Vec<f64>], y: &[f64]) -> Result<OlsFit, String> {
    let n = rows.len();
    if n != y.len() {
        return Err(format!(
            "design has {n} rows but {} observations were provided",
            y.len()
        ));
    }
    let k = rows.first().map(|r| r.len()).unwrap_or_default();
    if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != k) {
        return Err(format!(
            "design row {idx} has {} predictors, expected {k}",
            row.len()
        ));
    }
    let p = k + 1;
    if n < p {
        return Err(format!(
            "{n} observations cannot identify {p} coefficients"
        ));
    }
    if rows.iter().flatten().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(String::from("design contains non-finite values"));
    }

    let x = DMatrix::from_fn(n, p, |r, c| if c == 0 { 1.0 } else { rows[r][c - 1] });
    let y_vec = DVector::from_column_slice(y);
    let svd = x.clone().svd(true, true);
    let max_sv = svd.singular_values.max();
    let eps = max_sv * RANK_TOLERANCE;
    let rank = svd.rank(eps);
    if rank < p {
        return Err(format!(
            "design matrix is rank deficient (rank {rank} of {p} coefficients)"
        ));
    }
    let beta = svd.solve(&y_vec, eps).map_err(|e| e.to_string())?;

    let fitted = &x * &beta;
    let mean = y_vec.mean();
    let ss_res: f64 = (&y_vec - &fitted).iter().map(|r| r * r).sum();
    let ss_tot: f64 = y_vec.iter().map(|v| (v - mean) * (v - mean)).sum();
    let r_squared = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res <= eps {
        1.0
    } else {
        0.0
    };

    Ok(OlsFit {
        intercept: beta[0],
        coefficients: beta.iter().skip(1).copied().collect(),
        r_squared,
    })
}
