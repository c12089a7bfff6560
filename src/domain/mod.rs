pub mod allow_list;
pub mod detection;
pub mod errors;
pub mod model;
