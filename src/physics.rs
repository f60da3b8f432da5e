//! Physical constants and the empirical water-viscosity model.

/// Boltzmann constant in J/K.
pub const BOLTZMANN: f64 = 1.38064852e-23;

/// Offset between degrees Celsius and Kelvin.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Kelvin temperature at which the viscosity relation diverges. Configured
/// temperatures must stay strictly above this floor (> -133.15 C).
pub const VISCOSITY_SINGULARITY_K: f64 = 140.0;

/// Dynamic viscosity of water at the given temperature.
///
/// Empirical Vogel-type relation mu = A * 10^(B / (T_K - C)) with
/// A = 2.414e-5 mPa*s, B = 247.8 K, C = 140 K, scaled x1000 into the
/// simulation's viscosity units. Pure and deterministic; the caller keeps
/// T_K above [`VISCOSITY_SINGULARITY_K`].
pub fn water_viscosity(temp_celsius: f64) -> f64 {
    let t_kelvin = temp_celsius + KELVIN_OFFSET;
    let a = 2.414e-5; // mPa*s
    let b = 247.8; // K
    let viscosity = a * 10f64.powf(b / (t_kelvin - VISCOSITY_SINGULARITY_K));
    viscosity * 1e3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viscosity_at_room_temperature() {
        // Known value for water at 25 C under this relation
        let mu = water_viscosity(25.0);
        assert!((mu - 0.8906).abs() < 1e-3, "unexpected viscosity {}", mu);
    }

    #[test]
    fn viscosity_decreases_with_temperature() {
        let mut previous = water_viscosity(-50.0);
        for t in [-20.0, 0.0, 10.0, 25.0, 40.0, 60.0, 90.0] {
            let mu = water_viscosity(t);
            assert!(
                mu < previous,
                "viscosity did not decrease between {} C ({}) and colder ({})",
                t,
                mu,
                previous
            );
            assert!(mu > 0.0);
            previous = mu;
        }
    }
}
