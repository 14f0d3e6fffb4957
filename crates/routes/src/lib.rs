//! Route authoring and rendering core.
//!
//! Leaf-first: [`waypoint`] → [`draft`] / [`stops`] → [`surface`],
//! [`geometry`] → [`overview`]. External collaborators are reached only
//! through the traits in [`providers`] and [`gateway`].

pub mod deep_link;
pub mod draft;
pub mod edit_mode;
pub mod gateway;
pub mod geometry;
pub mod markers;
pub mod overview;
pub mod providers;
pub mod record;
pub mod roles;
pub mod stops;
pub mod surface;
pub mod waypoint;

pub use draft::*;
pub use edit_mode::*;
pub use geometry::*;
pub use markers::*;
pub use overview::*;
pub use providers::*;
pub use record::*;
pub use roles::*;
pub use stops::*;
pub use surface::*;
pub use waypoint::*;
