pub mod profile_controller;

pub use profile_controller::{ProfileController, ProfileControllerMessage};
