//! Grid problems over `Z[√2]` and `Z[ω]`.

pub mod grid_op;
pub mod odgp;
pub mod region;
pub mod tdgp;
pub mod upright;

pub use self::grid_op::GridOp;
pub use self::odgp::OdgpSolutions;
pub use self::region::{ConvexRegion, Ellipse, EpsilonRegion, Interval, UnitDisk};
pub use self::tdgp::GridPoints;
pub use self::upright::{to_upright_pair, UprightPair};
