//! Ayudas del lado cliente
//!
//! Normalización de respuestas, puerta de acceso por rol y cupo de cambios de
//! ubicación.

pub mod access_gate;
pub mod location_quota;
pub mod normalizer;

pub use access_gate::{home_route, AccessState, ProfileFetch, RouteGuard};
pub use location_quota::{LocationQuota, QuotaStatus};
pub use normalizer::{normalize_vehicle, normalize_vehicle_list, NormalizedVehicle};
