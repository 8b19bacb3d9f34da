pub mod ids;
pub mod objects;
pub mod position;
pub mod terrain;
pub mod world;

pub use ids::*;
pub use objects::*;
pub use position::*;
pub use terrain::*;
pub use world::*;
