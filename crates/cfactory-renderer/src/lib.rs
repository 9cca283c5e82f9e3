pub mod error;
pub mod fonts;
pub mod package;
pub mod slide;
pub mod theme;

pub use error::RenderError;
pub use fonts::FontSet;
pub use package::{package_carousel, PackagedCarousel};
pub use slide::{SlideRenderer, FOOTER_TEXT, HEIGHT, WIDTH};
pub use theme::Palette;
