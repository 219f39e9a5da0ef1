use std::f64::consts::TAU;

/// Transverse momentum from the momentum components.
pub fn transverse_momentum(px: f64, py: f64) -> f64 {
    px.hypot(py)
}

/// Pseudorapidity, `-ln(tan(theta/2))`, written as `asinh(pz/pt)`.
/// Returns +/- infinity for tracks along the beam axis.
pub fn pseudorapidity(px: f64, py: f64, pz: f64) -> f64 {
    let pt = transverse_momentum(px, py);
    if pt == 0.0 {
        if pz >= 0.0 {
            return f64::INFINITY;
        }
        return f64::NEG_INFINITY;
    }
    (pz / pt).asinh()
}

/// Azimuth in [0, 2pi).
pub fn azimuth(px: f64, py: f64) -> f64 {
    normalize_phi(py.atan2(px))
}

pub fn normalize_phi(phi: f64) -> f64 {
    let wrapped = phi.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// (pt, eta, phi) of a momentum vector.
pub fn pt_eta_phi(px: f64, py: f64, pz: f64) -> (f64, f64, f64) {
    (
        transverse_momentum(px, py),
        pseudorapidity(px, py, pz),
        azimuth(px, py),
    )
}
