mod geo;
mod info;
mod port;
mod user_agent;

pub use geo::*;
pub use info::*;
pub use port::*;
pub use user_agent::*;
