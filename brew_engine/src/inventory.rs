/// Bottled Inventory
///
/// Bottle counts per beer. Persisted as `{"Organic Pilsner": "10", ...}`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::{Beer, PerBeer};
use crate::error::EngineError;
use crate::serde_fields;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BottledInventory {
    counts: PerBeer<u64>,
}

/// Direction and size of a stock change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    Add(u64),
    Remove(u64),
}

impl BottledInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bottles(&self, beer: Beer) -> u64 {
        *self.counts.get(beer)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Beer, u64)> + '_ {
        self.counts.iter().map(|(beer, n)| (beer, *n))
    }
}

/// Apply `adjustment` to one beer and return the new inventory.
///
/// Removing more bottles than are in stock is `NegativeQuantity`.
pub fn adjust_bottle_count(
    inventory: &BottledInventory,
    beer: Beer,
    adjustment: Adjustment,
) -> Result<BottledInventory, EngineError> {
    let available = inventory.bottles(beer);
    let updated = match adjustment {
        Adjustment::Add(n) => available.checked_add(n).ok_or_else(|| {
            EngineError::Overflow(format!("{} + {} bottles of {}", available, n, beer))
        })?,
        Adjustment::Remove(n) => {
            available
                .checked_sub(n)
                .ok_or(EngineError::NegativeQuantity {
                    beer,
                    requested: n,
                    available,
                })?
        }
    };

    let mut next = inventory.clone();
    *next.counts.get_mut(beer) = updated;
    Ok(next)
}

impl fmt::Display for BottledInventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (beer, n) in self.iter() {
            writeln!(f, "{} : {}", beer, n)?;
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(transparent)]
struct Quantity(#[serde(with = "serde_fields::quantity_string")] u64);

impl Serialize for BottledInventory {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let map: BTreeMap<Beer, Quantity> =
            self.iter().map(|(beer, n)| (beer, Quantity(n))).collect();
        map.serialize(s)
    }
}

impl<'de> Deserialize<'de> for BottledInventory {
    /// Beers absent from the blob hold zero bottles.
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let map = BTreeMap::<Beer, Quantity>::deserialize(d)?;
        Ok(Self {
            counts: PerBeer::from_fn(|beer| map.get(&beer).map(|q| q.0).unwrap_or(0)),
        })
    }
}
