//! Maximum-information item selection for computerized adaptive testing.

use ndarray::Array1;

use crate::bank::ItemBank;
use crate::error::{ensure_finite, Result};
use crate::item::ItemId;
use crate::model::information_at;
use crate::utils::MIN_INFORMATION;

/// Fisher information of every item in `pool` at `theta`, in pool order.
pub fn information_profile(theta: f64, pool: &ItemBank) -> Result<Array1<f64>> {
    ensure_finite("theta", theta)?;
    let info = pool
        .iter()
        .map(|item| information_at(item, theta))
        .collect::<Result<Vec<_>>>()?;
    Ok(Array1::from_vec(info))
}

/// Pick the remaining item with maximum information at `theta`.
///
/// Ties go to the earliest item in pool order. `Ok(None)` means nothing
/// informative is left: the pool is empty or every item carries at most
/// [`MIN_INFORMATION`]. That is a normal stopping condition.
pub fn select_next_question(theta: f64, remaining: &ItemBank) -> Result<Option<ItemId>> {
    let info = information_profile(theta, remaining)?;

    let mut best_item: Option<ItemId> = None;
    let mut best_info = MIN_INFORMATION;

    for (item, &value) in remaining.iter().zip(info.iter()) {
        if value > best_info {
            best_info = value;
            best_item = Some(item.id());
        }
    }

    Ok(best_item)
}
