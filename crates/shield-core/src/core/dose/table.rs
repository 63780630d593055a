/// An ordered flux-to-dose conversion table.
///
/// Energies are in MeV and strictly increasing; factors are in
/// (rem/hr)/(photons/cm²·s). Both slices always have the same, non-zero length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoseTable {
    energies: &'static [f64],
    factors: &'static [f64],
}

impl DoseTable {
    pub const fn energies(&self) -> &'static [f64] {
        self.energies
    }

    pub const fn factors(&self) -> &'static [f64] {
        self.factors
    }

    pub const fn len(&self) -> usize {
        self.energies.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.energies.is_empty()
    }

    pub fn lowest(&self) -> (f64, f64) {
        (self.energies[0], self.factors[0])
    }

    pub fn highest(&self) -> (f64, f64) {
        let last = self.len() - 1;
        (self.energies[last], self.factors[last])
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.energies
            .iter()
            .copied()
            .zip(self.factors.iter().copied())
    }
}

const NCRP_38_ENERGIES: [f64; 38] = [
    0.01, 0.03, 0.05, 0.07, 0.1, 0.15, 0.2, 0.25, 0.3, 0.35, 0.4, 0.45, 0.5, 0.55, 0.6, 0.65,
    0.7, 0.8, 1.0, 1.4, 1.8, 2.2, 2.6, 2.8, 3.25, 3.75, 4.25, 4.75, 5.0, 5.25, 5.75, 6.25, 6.75,
    7.5, 9.0, 11.0, 13.0, 15.0,
];

const NCRP_38_FACTORS: [f64; 38] = [
    3.96e-6, 5.82e-7, 2.90e-7, 2.58e-7, 2.83e-7, 3.79e-7, 5.01e-7, 6.31e-7, 7.59e-7, 8.78e-7,
    9.85e-7, 1.08e-6, 1.17e-6, 1.27e-6, 1.36e-6, 1.44e-6, 1.52e-6, 1.68e-6, 1.98e-6, 2.51e-6,
    2.99e-6, 3.42e-6, 3.82e-6, 4.01e-6, 4.41e-6, 4.83e-6, 5.23e-6, 5.60e-6, 5.80e-6, 6.01e-6,
    6.37e-6, 6.74e-6, 7.11e-6, 7.66e-6, 8.77e-6, 1.03e-5, 1.18e-5, 1.33e-5,
];

/// NCRP-38 / ANS-6.1.1-1977 photon flux-to-dose conversion factors.
pub static NCRP_38: DoseTable = DoseTable {
    energies: &NCRP_38_ENERGIES,
    factors: &NCRP_38_FACTORS,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ncrp_38_energies_are_strictly_increasing() {
        assert!(
            NCRP_38
                .energies()
                .windows(2)
                .all(|pair| pair[0] < pair[1])
        );
    }

    #[test]
    fn ncrp_38_factors_are_positive_and_paired_with_energies() {
        assert_eq!(NCRP_38.energies().len(), NCRP_38.factors().len());
        assert!(NCRP_38.factors().iter().all(|&f| f > 0.0 && f.is_finite()));
    }

    #[test]
    fn lowest_and_highest_points_match_the_table_ends() {
        assert_eq!(NCRP_38.lowest(), (0.01, 3.96e-6));
        assert_eq!(NCRP_38.highest(), (15.0, 1.33e-5));
        assert_eq!(NCRP_38.points().count(), 38);
    }
}
