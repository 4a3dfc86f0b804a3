pub mod controller;
pub mod presenter;
pub mod registry;
pub mod render;

pub use controller::{ApplicationForm, FormSnapshot, SubmitAttempt};
pub use registry::FormRegistry;
