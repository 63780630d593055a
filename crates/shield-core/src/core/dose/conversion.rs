use super::table::{DoseTable, NCRP_38};

/// Converts photon flux into dose rate using a tabulated, energy-dependent factor.
///
/// Between tabulated points the factor is linearly interpolated; outside the table
/// it is clamped to the nearest end point.
#[derive(Debug, Clone, Copy)]
pub struct DoseConverter {
    table: &'static DoseTable,
}

impl Default for DoseConverter {
    fn default() -> Self {
        Self::ncrp_38()
    }
}

impl DoseConverter {
    pub fn new(table: &'static DoseTable) -> Self {
        Self { table }
    }

    pub fn ncrp_38() -> Self {
        Self::new(&NCRP_38)
    }

    pub fn table(&self) -> &'static DoseTable {
        self.table
    }

    /// Returns the flux-to-dose factor, in (rem/hr)/(photons/cm²·s), for a photon
    /// energy in MeV.
    ///
    /// Any real energy is accepted. Energies at or below the first tabulated point
    /// (including zero, negative values and NaN) map to the first factor, energies at
    /// or above the last point map to the last factor.
    pub fn factor_for_energy(&self, energy_mev: f64) -> f64 {
        let energies = self.table.energies();
        let factors = self.table.factors();
        let (lowest_energy, lowest_factor) = self.table.lowest();
        let (highest_energy, highest_factor) = self.table.highest();

        if !(energy_mev > lowest_energy) {
            return lowest_factor;
        }
        if energy_mev >= highest_energy {
            return highest_factor;
        }

        // First index whose energy exceeds the query; the bracket is [upper - 1, upper)
        // so an exact tabulated energy interpolates with a zero fraction.
        let upper = energies.partition_point(|&e| e <= energy_mev);
        let lower = upper - 1;

        let fraction = (energy_mev - energies[lower]) / (energies[upper] - energies[lower]);
        factors[lower] + fraction * (factors[upper] - factors[lower])
    }

    /// Dose rate in rem/hr for a total flux in photons/cm²·s.
    pub fn dose_from_flux(&self, energy_mev: f64, total_flux: f64) -> f64 {
        total_flux * self.factor_for_energy(energy_mev)
    }
}

/// Factor lookup against the NCRP-38 table.
pub fn factor_for_energy(energy_mev: f64) -> f64 {
    DoseConverter::ncrp_38().factor_for_energy(energy_mev)
}

/// Flux-to-dose conversion against the NCRP-38 table.
pub fn dose_from_flux(energy_mev: f64, total_flux: f64) -> f64 {
    DoseConverter::ncrp_38().dose_from_flux(energy_mev, total_flux)
}
