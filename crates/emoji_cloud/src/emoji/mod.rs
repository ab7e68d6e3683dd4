pub mod assets;
pub mod codepoint;
pub mod item;
pub mod vendor;
