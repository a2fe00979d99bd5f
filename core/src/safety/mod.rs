pub mod advisor;
pub mod classifier;
pub mod denylist;

pub use advisor::SafetyAdvisor;
pub use classifier::SafetyClassifier;
