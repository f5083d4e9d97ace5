pub mod capacity;
pub mod defrost;
pub mod efficiency;
pub mod heat_pump;
