//! Synthetic item banks.

use std::collections::HashSet;

use ndarray::Array2;
use rand::prelude::*;
use rand_distr::Uniform;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::error::{CatError, Result};
use crate::item::{Item, ItemId};

pub const DISCRIMINATION_RANGE: (f64, f64) = (0.2, 1.5);
pub const DIFFICULTY_RANGE: (f64, f64) = (-2.0, 2.0);
pub const GUESSING_RANGE: (f64, f64) = (0.1, 0.25);

/// An ordered pool of items with unique ids.
///
/// Cloning a bank gives an independent pool; a simulation run removes
/// administered items from its own clone only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Item>", into = "Vec<Item>")]
pub struct ItemBank {
    items: Vec<Item>,
}

impl TryFrom<Vec<Item>> for ItemBank {
    type Error = CatError;

    fn try_from(items: Vec<Item>) -> Result<Self> {
        ItemBank::new(items)
    }
}

impl From<ItemBank> for Vec<Item> {
    fn from(bank: ItemBank) -> Self {
        bank.items
    }
}

impl ItemBank {
    pub fn new(items: Vec<Item>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.id()) {
                return Err(CatError::DuplicateItemId(item.id()));
            }
        }
        Ok(Self { items })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.items.iter()
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.get(id).is_some()
    }

    /// Take an item out of the pool, keeping the order of the rest.
    pub fn remove(&mut self, id: ItemId) -> Option<Item> {
        let idx = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(idx))
    }

    /// Item parameters as an `(n_items, 3)` matrix with columns `a, b, c`.
    pub fn parameter_matrix(&self) -> Array2<f64> {
        let mut params = Array2::zeros((self.items.len(), 3));
        for (j, item) in self.items.iter().enumerate() {
            params[[j, 0]] = item.a();
            params[[j, 1]] = item.b();
            params[[j, 2]] = item.c();
        }
        params
    }
}

impl<'a> IntoIterator for &'a ItemBank {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

fn uniform(range: (f64, f64)) -> Result<Uniform<f64>> {
    Uniform::new(range.0, range.1).map_err(|e| CatError::InvalidConfig(e.to_string()))
}

/// Draw `count` items from `rng` with `a ~ U(0.2, 1.5)`, `b ~ U(-2, 2)`
/// and `c ~ U(0.1, 0.25)`. Ids run from `0` to `count - 1`.
pub fn generate_with_rng<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Result<ItemBank> {
    if count == 0 {
        return Err(CatError::BankInitialization { count });
    }
    let id_limit = u32::try_from(count).map_err(|_| CatError::BankInitialization { count })?;

    let disc = uniform(DISCRIMINATION_RANGE)?;
    let diff = uniform(DIFFICULTY_RANGE)?;
    let guess = uniform(GUESSING_RANGE)?;

    let items = (0..id_limit)
        .map(|id| {
            let a = disc.sample(rng);
            let b = diff.sample(rng);
            let c = guess.sample(rng);
            Item::new(ItemId(id), a, b, c)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(ItemBank { items })
}

/// Reproducible bank: the same `seed` always yields the same items.
pub fn initialize_question_bank(count: usize, seed: u64) -> Result<ItemBank> {
    let mut rng = Pcg64::seed_from_u64(seed);
    let bank = generate_with_rng(count, &mut rng)?;
    tracing::debug!(count, seed, "initialized item bank");
    Ok(bank)
}
