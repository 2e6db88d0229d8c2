mod interpolator;
mod registry;
mod session;

pub use interpolator::{PositionInterpolator, PositionSnapshot};
pub use registry::{PlayerHandle, PlayerRegistry};
pub use session::TrackSession;
