//! Tariff calculator.
//!
//! Pure pricing math lives in `calculators`, `package` and `route`; the
//! `services` functions load what a quote needs from the store first.

pub mod calculators;
pub mod package;
pub mod rates;
pub mod requests;
pub mod responses;
pub mod route;
pub mod services;

// Re-export commonly used items
pub use calculators::{city_segment_cost, day_vehicle_cost, round_money};
pub use package::{compute_package_price, PricingCatalog};
pub use rates::{PricingContext, RateTable, Rates, TripWay};
pub use requests::{DayPlan, DayPoint, LegTable, PackageQuoteRequest, PointSelection, RouteQuoteRequest};
pub use responses::{DayBreakdown, PricingResult, RoutePricing, SegmentPrice};
pub use route::price_route;
pub use services::{estimate_transfer, quote_package, quote_route, save_route_quote};
