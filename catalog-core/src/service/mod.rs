//! Application-level services built on the repository ports.

pub mod associations;

pub use associations::MediaFileAssociations;
