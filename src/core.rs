pub mod area;
pub mod clock;
pub mod document;
pub mod error;
pub mod selector;
pub mod window;
