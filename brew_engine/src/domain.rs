/// Core Domain Types
///
/// Pure data. No transition logic.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::serde_fields;

// ── Beer ───────────────────────────────────────────────────────────

/// The three beers the brewery produces.
///
/// Declaration order is the allocation priority order and the
/// iteration order of every per-beer table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Beer {
    #[serde(rename = "Organic Pilsner")]
    Pilsner,
    #[serde(rename = "Organic Red Helles")]
    RedHelles,
    #[serde(rename = "Organic Dunkel")]
    Dunkel,
}

impl Beer {
    pub const ALL: [Beer; 3] = [Beer::Pilsner, Beer::RedHelles, Beer::Dunkel];

    /// Full name as it appears in sales files and stores.
    pub fn name(self) -> &'static str {
        match self {
            Beer::Pilsner => "Organic Pilsner",
            Beer::RedHelles => "Organic Red Helles",
            Beer::Dunkel => "Organic Dunkel",
        }
    }

    fn index(self) -> usize {
        match self {
            Beer::Pilsner => 0,
            Beer::RedHelles => 1,
            Beer::Dunkel => 2,
        }
    }
}

impl fmt::Display for Beer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Beer {
    type Err = EngineError;

    /// Accepts the full name or a short alias (`pilsner`, `red-helles`,
    /// `dunkel`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        let key = normalized
            .strip_prefix("organic")
            .unwrap_or(normalized.as_str());
        match key {
            "pilsner" => Ok(Beer::Pilsner),
            "redhelles" => Ok(Beer::RedHelles),
            "dunkel" => Ok(Beer::Dunkel),
            _ => Err(EngineError::UnknownName {
                kind: "beer",
                value: s.to_string(),
            }),
        }
    }
}

/// One value per beer, indexed by [`Beer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PerBeer<T> {
    values: [T; 3],
}

impl<T> PerBeer<T> {
    pub fn from_fn(f: impl FnMut(Beer) -> T) -> Self {
        Self {
            values: Beer::ALL.map(f),
        }
    }

    pub fn get(&self, beer: Beer) -> &T {
        &self.values[beer.index()]
    }

    pub fn get_mut(&mut self, beer: Beer) -> &mut T {
        &mut self.values[beer.index()]
    }

    /// Iterate in priority order.
    pub fn iter(&self) -> impl Iterator<Item = (Beer, &T)> {
        Beer::ALL.into_iter().zip(self.values.iter())
    }
}

// ── Tanks ──────────────────────────────────────────────────────────

/// Vessel identity. Declaration order is the store's scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TankId {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    R,
}

impl TankId {
    pub const ALL: [TankId; 9] = [
        TankId::A,
        TankId::B,
        TankId::C,
        TankId::D,
        TankId::E,
        TankId::F,
        TankId::G,
        TankId::H,
        TankId::R,
    ];

    /// R is the dedicated fermenter.
    pub fn ferments_only(self) -> bool {
        self == TankId::R
    }

    /// G and H are the dedicated conditioning tanks.
    pub fn conditions_only(self) -> bool {
        matches!(self, TankId::G | TankId::H)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TankId::A => "A",
            TankId::B => "B",
            TankId::C => "C",
            TankId::D => "D",
            TankId::E => "E",
            TankId::F => "F",
            TankId::G => "G",
            TankId::H => "H",
            TankId::R => "R",
        }
    }
}

impl fmt::Display for TankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TankId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        TankId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| EngineError::UnknownName {
                kind: "tank",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TankStatus {
    Idle,
    Fermenting,
    #[serde(rename = "Finished Fermenting")]
    FinishedFermenting,
    Conditioning,
}

impl TankStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TankStatus::Idle => "Idle",
            TankStatus::Fermenting => "Fermenting",
            TankStatus::FinishedFermenting => "Finished Fermenting",
            TankStatus::Conditioning => "Conditioning",
        }
    }
}

impl fmt::Display for TankStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TankStatus {
    type Err = EngineError;

    /// Accepts `Finished Fermenting`, `finished-fermenting`,
    /// `finished_fermenting` and so on.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "idle" => Ok(TankStatus::Idle),
            "fermenting" => Ok(TankStatus::Fermenting),
            "finishedfermenting" => Ok(TankStatus::FinishedFermenting),
            "conditioning" => Ok(TankStatus::Conditioning),
            _ => Err(EngineError::UnknownName {
                kind: "tank status",
                value: s.to_string(),
            }),
        }
    }
}

/// A single vessel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tank {
    pub name: TankId,
    pub status: TankStatus,
    #[serde(rename = "beer_name", with = "serde_fields::beer_or_na")]
    pub beer: Option<Beer>,
    #[serde(deserialize_with = "serde_fields::lenient_u32")]
    pub current_volume: u32,
    #[serde(deserialize_with = "serde_fields::lenient_u32")]
    pub capacity: u32,
    /// Only ever set on tank R while it is fermenting. Other tanks may
    /// omit the key.
    #[serde(rename = "date", default, with = "serde_fields::timestamp_or_na")]
    pub fermentation_start: Option<NaiveDateTime>,
}

impl Tank {
    pub fn is_empty_idle(&self) -> bool {
        self.status == TankStatus::Idle && self.current_volume == 0
    }
}

impl fmt::Display for Tank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let beer = self.beer.map(Beer::name).unwrap_or(serde_fields::NOT_APPLICABLE);
        write!(
            f,
            "Tank {}: {}  {} {}/{} Litres",
            self.name, self.status, beer, self.current_volume, self.capacity
        )
    }
}

/// The full fleet, kept in [`TankId::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TankStore {
    pub tanks: Vec<Tank>,
}

impl TankStore {
    pub fn get(&self, id: TankId) -> Option<&Tank> {
        self.tanks.iter().find(|t| t.name == id)
    }

    pub(crate) fn get_mut(&mut self, id: TankId) -> Option<&mut Tank> {
        self.tanks.iter_mut().find(|t| t.name == id)
    }

    /// Tanks with the given status, in scan order.
    pub fn with_status(&self, status: TankStatus) -> Vec<&Tank> {
        self.tanks.iter().filter(|t| t.status == status).collect()
    }
}

impl fmt::Display for TankStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CURRENT TANK STATUS:")?;
        for tank in &self.tanks {
            writeln!(f, "{}", tank)?;
        }
        Ok(())
    }
}

/// Lowercase and drop everything that isn't alphanumeric.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
