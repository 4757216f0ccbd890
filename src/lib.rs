//! Render-agnostic core of the method atlas: catalog loading, relationship
//! graph construction, force layout, cluster geometry, semantic zoom and the
//! surface handle that ties them together.

pub mod catalog;
pub mod cluster;
pub mod graph;
pub mod interaction;
pub mod layout;
pub mod schedule;
pub mod surface;
pub mod theme;
pub mod util;
pub mod zoom;
