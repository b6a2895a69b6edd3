//! UI Widgets

pub mod container_panel;
pub mod detail_panel;
pub mod footer;
pub mod header;
pub mod logs_panel;
pub mod too_small;

pub use container_panel::ContainerPanel;
pub use detail_panel::DetailPanel;
pub use footer::Footer;
pub use header::Header;
pub use logs_panel::LogsPanel;
pub use too_small::TooSmall;
