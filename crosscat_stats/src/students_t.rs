//! The location-scale Student's t distribution
//!
//! rv only ships the standard t without a cdf. Continuous queries need the
//! cdf of the Normal-Gamma posterior predictive, which is this distribution.
use crate::rv::dist::{NormalGamma, StudentsT as StandardT};
use crate::rv::traits::Rv;
use rand::Rng;
use serde::{Deserialize, Serialize};
use special::{Beta, Gamma};
use std::f64::consts::PI;
use thiserror::Error;

/// Student's t with `nu` degrees of freedom, shifted by `loc` and scaled by
/// `scale`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StudentT {
    nu: f64,
    loc: f64,
    scale: f64,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum StudentTError {
    #[error("degrees of freedom must be positive and finite, got {0}")]
    Nu(f64),
    #[error("location must be finite, got {0}")]
    Loc(f64),
    #[error("scale must be positive and finite, got {0}")]
    Scale(f64),
}

impl StudentT {
    pub fn new(nu: f64, loc: f64, scale: f64) -> Result<Self, StudentTError> {
        if !(nu.is_finite() && nu > 0.0) {
            Err(StudentTError::Nu(nu))
        } else if !loc.is_finite() {
            Err(StudentTError::Loc(loc))
        } else if !(scale.is_finite() && scale > 0.0) {
            Err(StudentTError::Scale(scale))
        } else {
            Ok(Self { nu, loc, scale })
        }
    }

    /// Create without checking the parameters
    #[inline]
    pub fn new_unchecked(nu: f64, loc: f64, scale: f64) -> Self {
        Self { nu, loc, scale }
    }

    /// The predictive distribution of a new datum under the Normal-Gamma
    /// `ng`, which is usually a posterior
    pub fn predictive(ng: &NormalGamma) -> Self {
        let (m, r, s, v) = ng.params();
        let scale = (s * (r + 1.0) / (v * r)).sqrt();
        Self::new_unchecked(v, m, scale)
    }

    #[inline]
    pub fn nu(&self) -> f64 {
        self.nu
    }

    #[inline]
    pub fn loc(&self) -> f64 {
        self.loc
    }

    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[inline]
    fn standardize(&self, x: f64) -> f64 {
        (x - self.loc) / self.scale
    }

    pub fn ln_pdf(&self, x: f64) -> f64 {
        let t = self.standardize(x);
        let nu = self.nu;
        let half_nu_plus_1 = (nu + 1.0) / 2.0;
        half_nu_plus_1.ln_gamma().0
            - (nu / 2.0).ln_gamma().0
            - 0.5 * (nu * PI).ln()
            - self.scale.ln()
            - half_nu_plus_1 * (t * t / nu).ln_1p()
    }

    pub fn pdf(&self, x: f64) -> f64 {
        self.ln_pdf(x).exp()
    }

    pub fn cdf(&self, x: f64) -> f64 {
        if x == f64::INFINITY {
            return 1.0;
        } else if x == f64::NEG_INFINITY {
            return 0.0;
        }
        let t = self.standardize(x);
        let nu = self.nu;
        let xb = nu / (nu + t * t);
        let ln_beta = (nu / 2.0).ln_beta(0.5);
        let ib = xb.inc_beta(nu / 2.0, 0.5, ln_beta);
        if t < 0.0 {
            0.5 * ib
        } else {
            1.0 - 0.5 * ib
        }
    }

    pub fn draw<R: Rng>(&self, rng: &mut R) -> f64 {
        let t: f64 = StandardT::new_unchecked(self.nu).draw(rng);
        self.scale.mul_add(t, self.loc)
    }

}
