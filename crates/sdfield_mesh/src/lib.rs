//! Triangle meshes and signed distance queries against them.

pub mod canonical;
pub mod io;
pub mod mesh;
pub mod oracle;
pub mod query;

pub use canonical::{MeshCentering, centered, centered_on_principal_axes};
pub use mesh::{AxisAlignedBox, TriangleMesh};
pub use oracle::MeshDistanceOracle;
