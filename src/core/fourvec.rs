//! Cartesian four-momentum type and the angular metrics used throughout
//! candidate construction.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// A four-momentum in Cartesian components (px, py, pz, E), in GeV.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FourMomentum {
    pub px: f64,
    pub py: f64,
    pub pz: f64,
    pub e: f64,
}

impl FourMomentum {
    /// The null four-vector, used wherever an object has no counterpart
    /// (e.g. missing generator match).
    pub const ZERO: Self = Self {
        px: 0.0,
        py: 0.0,
        pz: 0.0,
        e: 0.0,
    };

    #[must_use]
    pub fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        Self { px, py, pz, e }
    }

    /// Build from collider coordinates (pT, eta, phi, mass).
    #[must_use]
    pub fn from_ptetaphim(pt: f64, eta: f64, phi: f64, m: f64) -> Self {
        let px = pt * phi.cos();
        let py = pt * phi.sin();
        let pz = pt * eta.sinh();
        let e = (px * px + py * py + pz * pz + m * m).sqrt();
        Self { px, py, pz, e }
    }

    /// Transverse momentum.
    #[must_use]
    pub fn pt(&self) -> f64 {
        self.px.hypot(self.py)
    }

    /// Magnitude of the three-momentum.
    #[must_use]
    pub fn p(&self) -> f64 {
        (self.px * self.px + self.py * self.py + self.pz * self.pz).sqrt()
    }

    /// Pseudorapidity. Zero for a vanishing transverse momentum.
    #[must_use]
    pub fn eta(&self) -> f64 {
        let pt = self.pt();
        if pt == 0.0 {
            0.0
        } else {
            (self.pz / pt).asinh()
        }
    }

    /// Azimuthal angle in (-pi, pi].
    #[must_use]
    pub fn phi(&self) -> f64 {
        if self.px == 0.0 && self.py == 0.0 {
            0.0
        } else {
            self.py.atan2(self.px)
        }
    }

    /// Invariant mass, clamped at zero for space-like vectors.
    #[must_use]
    pub fn mass(&self) -> f64 {
        let m2 = self.e * self.e - self.p() * self.p();
        m2.max(0.0).sqrt()
    }

    /// Transverse mass of this vector, sqrt(E^2 - pz^2), clamped at zero.
    #[must_use]
    pub fn mt(&self) -> f64 {
        let mt2 = self.e * self.e - self.pz * self.pz;
        mt2.max(0.0).sqrt()
    }

    /// Spatial part as a 3-vector.
    #[must_use]
    pub fn spatial(&self) -> Vector3<f64> {
        Vector3::new(self.px, self.py, self.pz)
    }

    /// Signed azimuthal separation, wrapped into (-pi, pi].
    #[must_use]
    pub fn delta_phi(&self, other: &Self) -> f64 {
        let mut dphi = self.phi() - other.phi();
        while dphi > std::f64::consts::PI {
            dphi -= 2.0 * std::f64::consts::PI;
        }
        while dphi <= -std::f64::consts::PI {
            dphi += 2.0 * std::f64::consts::PI;
        }
        dphi
    }

    /// Angular separation in the eta-phi plane.
    #[must_use]
    pub fn delta_r(&self, other: &Self) -> f64 {
        let deta = self.eta() - other.eta();
        let dphi = self.delta_phi(other);
        deta.hypot(dphi)
    }

    /// Active Lorentz boost with velocity `beta` (in units of c).
    ///
    /// Boosting by the negative velocity of a system takes momenta into
    /// that system's rest frame.
    #[must_use]
    pub fn boosted(&self, beta: Vector3<f64>) -> Self {
        let b2 = beta.norm_squared();
        if b2 == 0.0 {
            return *self;
        }
        let gamma = 1.0 / (1.0 - b2).sqrt();
        let p = self.spatial();
        let bp = beta.dot(&p);
        let k = (gamma - 1.0) / b2 * bp + gamma * self.e;
        let boosted = p + k * beta;
        Self {
            px: boosted.x,
            py: boosted.y,
            pz: boosted.z,
            e: gamma * (self.e + bp),
        }
    }
}

impl Add for FourMomentum {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            px: self.px + rhs.px,
            py: self.py + rhs.py,
            pz: self.pz + rhs.pz,
            e: self.e + rhs.e,
        }
    }
}

impl AddAssign for FourMomentum {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for FourMomentum {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// Cosine of the polar angle of `h1` in the Collins-Soper frame of the
/// `h1 + h2` system, for a symmetric beam of energy `ebeam` per proton.
///
/// The frame axis bisects the boosted beam directions; the sign of the
/// returned cosine depends on which system is passed first.
#[must_use]
pub fn cos_theta_star_cs(h1: &FourMomentum, h2: &FourMomentum, ebeam: f64) -> f64 {
    let beam1 = FourMomentum::new(0.0, 0.0, ebeam, ebeam);
    let beam2 = FourMomentum::new(0.0, 0.0, -ebeam, ebeam);

    let combined = *h1 + *h2;
    let beta = -Vector3::new(combined.px, combined.py, combined.pz) / combined.e;

    let b1 = beam1.boosted(beta).spatial().normalize();
    let b2 = beam2.boosted(beta).spatial().normalize();
    let axis = (b1 - b2).normalize();

    axis.dot(&h1.boosted(beta).spatial().normalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mass_of_known_vector() {
        // E^2 - p^2 = 25 - 9 = 16
        let p = FourMomentum::new(3.0, 0.0, 0.0, 5.0);
        assert!((p.mass() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_from_collider_coordinates() {
        let p = FourMomentum::from_ptetaphim(40.0, 1.2, -0.7, 0.105);
        assert!((p.pt() - 40.0).abs() < 1e-9);
        assert!((p.eta() - 1.2).abs() < 1e-9);
        assert!((p.phi() + 0.7).abs() < 1e-9);
        assert!((p.mass() - 0.105).abs() < 1e-6);
    }

    #[test]
    fn test_delta_phi_wraps() {
        let a = FourMomentum::from_ptetaphim(10.0, 0.0, 3.0, 0.0);
        let b = FourMomentum::from_ptetaphim(10.0, 0.0, -3.0, 0.0);
        // Going the short way around: |3 - (-3)| wraps to 2pi - 6
        let dphi = a.delta_phi(&b);
        assert!((dphi.abs() - (2.0 * std::f64::consts::PI - 6.0)).abs() < 1e-9);
    }

    #[test]
    fn test_delta_r_is_symmetric() {
        let a = FourMomentum::from_ptetaphim(30.0, 0.5, 1.0, 0.0);
        let b = FourMomentum::from_ptetaphim(50.0, -0.5, 2.0, 0.0);
        assert!((a.delta_r(&b) - b.delta_r(&a)).abs() < 1e-12);
        assert!((a.delta_r(&b) - (1.0f64.powi(2) + 1.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_boost_to_rest_frame() {
        let p = FourMomentum::from_ptetaphim(80.0, 0.3, 1.1, 91.2);
        let beta = -p.spatial() / p.e;
        let rest = p.boosted(beta);
        assert!(rest.p() < 1e-6);
        assert!((rest.e - p.mass()).abs() < 1e-6);
    }

    #[test]
    fn test_boost_preserves_mass() {
        let p = FourMomentum::from_ptetaphim(55.0, -1.4, 0.2, 125.0);
        let boosted = p.boosted(Vector3::new(0.2, -0.1, 0.4));
        assert!((boosted.mass() - p.mass()).abs() < 1e-6);
    }

    #[test]
    fn test_cos_theta_star_bounded() {
        let h1 = FourMomentum::from_ptetaphim(90.0, 0.7, 0.3, 125.0);
        let h2 = FourMomentum::from_ptetaphim(70.0, -0.2, 2.5, 125.0);
        let cos = cos_theta_star_cs(&h1, &h2, 6500.0);
        assert!((-1.0..=1.0).contains(&cos));
    }

    #[test]
    fn test_cos_theta_star_back_to_back_on_axis() {
        // A system at rest along the beam axis: the Collins-Soper axis is
        // the beam axis itself.
        let h1 = FourMomentum::new(0.0, 0.0, 50.0, 130.0);
        let h2 = FourMomentum::new(0.0, 0.0, -50.0, 130.0);
        let cos = cos_theta_star_cs(&h1, &h2, 6500.0);
        assert!((cos.abs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_sum_of_four_momenta() {
        let parts = vec![
            FourMomentum::new(1.0, 2.0, 3.0, 10.0),
            FourMomentum::new(-1.0, 0.5, 0.0, 5.0),
        ];
        let total: FourMomentum = parts.into_iter().sum();
        assert!((total.px - 0.0).abs() < 1e-12);
        assert!((total.e - 15.0).abs() < 1e-12);
    }
}
