use crosscat_stats::rv::misc::ln_pflip;
use rand::Rng;

use crate::error::NumericalError;

/// Draw an index from un-normalized log weights, failing on weights that
/// cannot be normalized
pub fn checked_ln_pflip<R: Rng>(
    logps: &[f64],
    kernel: &'static str,
    rng: &mut R,
) -> Result<usize, NumericalError> {
    if logps.is_empty() {
        return Err(NumericalError::EmptyWeights { kernel });
    }

    if let Some((ix, &logp)) = logps
        .iter()
        .enumerate()
        .find(|(_, logp)| logp.is_nan() || **logp == f64::INFINITY)
    {
        return Err(NumericalError::NonFiniteWeight { kernel, ix, logp });
    }

    if logps.iter().all(|&logp| logp == f64::NEG_INFINITY) {
        return Err(NumericalError::AllWeightsZero { kernel });
    }

    Ok(ln_pflip(logps, 1, false, rng)[0])
}
