pub mod edit;
pub mod episode;
