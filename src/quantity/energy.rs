quantity!(KilowattHours, via: f64, suffix: "kWh", precision: 3);

impl KilowattHours {
    /// Round to whole kilowatt-hours.
    ///
    /// Not-a-number and negative energies collapse to zero.
    #[must_use]
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn round_to_units(self) -> u64 {
        if self.0.is_finite() && self.0 > 0.0 { self.0.round() as u64 } else { 0 }
    }
}
