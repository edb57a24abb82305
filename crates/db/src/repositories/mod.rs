//! Repository layer: one struct of associated query fns per table.

pub mod reading_repo;

pub use reading_repo::ReadingRepo;
