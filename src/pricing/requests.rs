//! Inputs for package and route quotes.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::RouteSegment;
use crate::pricing::rates::TripWay;

/// What an operator finalized for a point of a day.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "ids", rename_all = "snake_case")]
pub enum PointSelection {
    #[default]
    Unset,
    Sightseeing(Uuid),
    Hotel(Uuid),
    /// Add-ons attached directly to the point.
    Other(Vec<Uuid>),
}

/// A point on a day's itinerary, in visiting order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPoint {
    pub id: Uuid,
    pub selected: bool,
}

/// One day of a package.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DayPlan {
    pub day_number: u32,
    pub points: Vec<DayPoint>,
    /// Finalized selections keyed by point id.
    #[serde(default)]
    pub selections: BTreeMap<Uuid, PointSelection>,
}

impl DayPlan {
    pub fn selected_points(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.points.iter().filter(|p| p.selected).map(|p| p.id)
    }

    /// Selections that belong to a selected point of this day, in point order.
    pub fn active_selections(&self) -> impl Iterator<Item = &PointSelection> + '_ {
        self.selected_points()
            .filter_map(move |id| self.selections.get(&id))
    }

    /// Kilometres driven between consecutive selected points.
    pub fn travelled_km(&self, legs: &LegTable) -> Decimal {
        let selected: Vec<Uuid> = self.selected_points().collect();
        selected
            .windows(2)
            .map(|pair| legs.distance_km(pair[0], pair[1]).unwrap_or(Decimal::ZERO))
            .sum()
    }
}

/// Serialized form of one leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub from: Uuid,
    pub to: Uuid,
    pub distance_km: Decimal,
}

/// Driving distances between points, looked up in either direction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Leg>", into = "Vec<Leg>")]
pub struct LegTable {
    legs: HashMap<(Uuid, Uuid), Decimal>,
}

impl LegTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: Uuid, to: Uuid, distance_km: Decimal) {
        self.legs.insert((from, to), distance_km);
    }

    pub fn with_leg(mut self, from: Uuid, to: Uuid, distance_km: Decimal) -> Self {
        self.insert(from, to, distance_km);
        self
    }

    pub fn distance_km(&self, from: Uuid, to: Uuid) -> Option<Decimal> {
        self.legs
            .get(&(from, to))
            .or_else(|| self.legs.get(&(to, from)))
            .copied()
    }
}

impl From<Vec<Leg>> for LegTable {
    fn from(legs: Vec<Leg>) -> Self {
        Self {
            legs: legs
                .into_iter()
                .map(|leg| ((leg.from, leg.to), leg.distance_km))
                .collect(),
        }
    }
}

impl From<LegTable> for Vec<Leg> {
    fn from(table: LegTable) -> Self {
        let mut legs: Vec<Leg> = table
            .legs
            .into_iter()
            .map(|((from, to), distance_km)| Leg { from, to, distance_km })
            .collect();
        legs.sort_by_key(|leg| (leg.from, leg.to));
        legs
    }
}

/// Request to price a multi-day package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageQuoteRequest {
    pub vehicle_model_id: Uuid,
    pub days: Vec<DayPlan>,
    #[serde(default)]
    pub legs: LegTable,
    /// Package-level add-ons.
    #[serde(default)]
    pub add_on_ids: Vec<Uuid>,
}

impl PackageQuoteRequest {
    pub fn sightseeing_ids(&self) -> Vec<Uuid> {
        self.collect_ids(|s| match s {
            PointSelection::Sightseeing(id) => vec![*id],
            _ => vec![],
        })
    }

    pub fn hotel_ids(&self) -> Vec<Uuid> {
        self.collect_ids(|s| match s {
            PointSelection::Hotel(id) => vec![*id],
            _ => vec![],
        })
    }

    /// Package-level and point-level add-ons.
    pub fn all_add_on_ids(&self) -> Vec<Uuid> {
        let mut ids = self.collect_ids(|s| match s {
            PointSelection::Other(ids) => ids.clone(),
            _ => vec![],
        });
        ids.extend(self.add_on_ids.iter().copied());
        ids.sort();
        ids.dedup();
        ids
    }

    fn collect_ids<F>(&self, pick: F) -> Vec<Uuid>
    where
        F: Fn(&PointSelection) -> Vec<Uuid>,
    {
        let mut ids: Vec<Uuid> = self
            .days
            .iter()
            .flat_map(|day| day.active_selections().flat_map(&pick).collect::<Vec<_>>())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

/// Request to price a standalone route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteQuoteRequest {
    #[serde(default)]
    pub route_id: Option<Uuid>,
    pub vehicle_model_id: Uuid,
    pub trip_way: TripWay,
    pub segments: Vec<RouteSegment>,
}
