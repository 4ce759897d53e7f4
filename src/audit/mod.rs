pub mod color;
pub mod contrast;
pub mod engine;
pub mod page;

// Re-export common types
pub use color::{contrast_ratio, contrast_ratio_str, to_luminance, Color};
pub use contrast::ContrastAuditor;
pub use engine::{AccessibilityEngine, AxeEngine};
pub use page::PageAuditor;
