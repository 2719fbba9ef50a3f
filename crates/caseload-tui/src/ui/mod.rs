//! Terminal UI module using ratatui.
//!
//! - `render`: Main frame rendering, layout and overlays
//! - `input`: Keyboard event handling
//! - `styles`: Color schemes and text styling
//! - `tabs`: Students dashboard and teacher management panel

pub mod input;
pub mod render;
pub mod styles;
pub mod tabs;
