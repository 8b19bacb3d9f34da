pub mod link;
pub mod tower;
