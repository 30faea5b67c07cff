//! Store-imposed seven-day phased release schedule.

use super::{DistributionDomainError, ExposurePercent};

/// Number of days in the store's phased release.
pub const PHASED_RELEASE_DAYS: u8 = 7;

const EXPOSURE_BY_DAY: [u8; 7] = [1, 2, 5, 10, 20, 50, 100];

/// Returns the exposure the store applies on `day` of a phased release.
///
/// # Errors
///
/// Returns [`DistributionDomainError::InvalidRolloutDay`] unless `day` is
/// within `1..=7`.
pub fn phased_exposure(day: u8) -> Result<ExposurePercent, DistributionDomainError> {
    usize::from(day)
        .checked_sub(1)
        .and_then(|index| EXPOSURE_BY_DAY.get(index))
        .ok_or(DistributionDomainError::InvalidRolloutDay(day))
        .and_then(|percent| ExposurePercent::new(*percent))
}
