//! UI module - Rendering and layout for the TUI

pub mod layout;
pub mod renderer;
pub mod text;
pub mod theme;
pub mod widgets;
