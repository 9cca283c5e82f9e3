//! Draws a single 1080×1350 slide.

use ab_glyph::PxScale;
use cfactory_core::{SlideDescriptor, Theme};
use image::RgbImage;
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::fonts::FontSet;
use crate::theme::Palette;

pub const WIDTH: u32 = 1080;
pub const HEIGHT: u32 = 1350;
pub const FOOTER_TEXT: &str = "CONTENT FACTORY | WILDBERRIES";

const MARGIN: i32 = 100;

const HEADLINE_SIZE: f32 = 80.0;
const NUMBER_SIZE: f32 = 60.0;
const BODY_SIZE: f32 = 45.0;
const FOOTER_SIZE: f32 = 30.0;

const HEADLINE_WRAP: usize = 18;
const BODY_WRAP: usize = 35;
const HEADLINE_TOP: i32 = 150;
const HEADLINE_LINE_HEIGHT: i32 = 100;
const BODY_LINE_HEIGHT: i32 = 60;
const SECTION_GAP: i32 = 50;

#[derive(Debug, Clone)]
pub struct SlideRenderer {
    palette: Palette,
    fonts: FontSet,
}

impl SlideRenderer {
    #[must_use]
    pub fn new(theme: Theme, fonts: FontSet) -> Self {
        Self {
            palette: Palette::for_theme(theme),
            fonts,
        }
    }

    #[must_use]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    #[must_use]
    pub fn render_slide(&self, slide: &SlideDescriptor) -> RgbImage {
        let mut img = RgbImage::new(WIDTH, HEIGHT);
        self.draw_background(&mut img);

        // Accent bar above the headline.
        draw_filled_rect_mut(
            &mut img,
            Rect::at(MARGIN, 50).of_size(150, 10),
            self.palette.accent,
        );

        let mut y = HEADLINE_TOP;
        let headline = slide.headline.trim().to_uppercase();
        for line in textwrap::wrap(&headline, HEADLINE_WRAP) {
            draw_text_mut(
                &mut img,
                self.palette.text,
                MARGIN,
                y,
                PxScale::from(HEADLINE_SIZE),
                &self.fonts.bold,
                &line,
            );
            y += HEADLINE_LINE_HEIGHT;
        }

        if let Some(body) = slide.body_text.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
            y += SECTION_GAP;
            draw_filled_rect_mut(
                &mut img,
                Rect::at(MARGIN, y - 1).of_size(100, 3),
                self.palette.accent,
            );
            y += SECTION_GAP;

            for line in textwrap::wrap(body, BODY_WRAP) {
                draw_text_mut(
                    &mut img,
                    self.palette.text,
                    MARGIN,
                    y,
                    PxScale::from(BODY_SIZE),
                    &self.fonts.regular,
                    &line,
                );
                y += BODY_LINE_HEIGHT;
            }
        }

        self.draw_footer(&mut img, slide.number);
        img
    }

    fn draw_background(&self, img: &mut RgbImage) {
        for y in 0..HEIGHT {
            let colour = self.palette.gradient_row(y, HEIGHT);
            for x in 0..WIDTH {
                img.put_pixel(x, y, colour);
            }
        }
    }

    fn draw_footer(&self, img: &mut RgbImage, number: u32) {
        let bottom = HEIGHT.cast_signed() - MARGIN;

        draw_text_mut(
            img,
            self.palette.accent,
            WIDTH.cast_signed() - MARGIN - 50,
            bottom,
            PxScale::from(NUMBER_SIZE),
            &self.fonts.bold,
            &number.to_string(),
        );
        draw_text_mut(
            img,
            self.palette.muted,
            MARGIN,
            bottom,
            PxScale::from(FOOTER_SIZE),
            &self.fonts.regular,
            FOOTER_TEXT,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::{DARK, LIGHT};

    fn slide(headline: &str, body: Option<&str>) -> SlideDescriptor {
        SlideDescriptor {
            number: 3,
            kind: "body".to_string(),
            headline: headline.to_string(),
            body_text: body.map(str::to_string),
            visual_hint: None,
        }
    }

    fn renderer(theme: Theme) -> SlideRenderer {
        SlideRenderer::new(theme, FontSet::embedded().expect("embedded font"))
    }

    #[test]
    fn slide_has_fixed_dimensions() {
        let img = renderer(Theme::Dark).render_slide(&slide("Hello", Some("World")));
        assert_eq!(img.dimensions(), (WIDTH, HEIGHT));
    }

    #[test]
    fn background_uses_theme_gradient() {
        let dark = renderer(Theme::Dark).render_slide(&slide("x", None));
        assert_eq!(*dark.get_pixel(WIDTH - 1, 0), DARK.bg_start);

        let light = renderer(Theme::Light).render_slide(&slide("x", None));
        assert_eq!(*light.get_pixel(WIDTH - 1, 0), LIGHT.bg_start);
    }

    #[test]
    fn accent_bar_is_drawn() {
        let img = renderer(Theme::Dark).render_slide(&slide("x", None));
        assert_eq!(*img.get_pixel(120, 55), DARK.accent);
    }

    #[test]
    fn divider_only_drawn_with_body_text() {
        // One headline line: divider sits at 150 + 100 + 50 = 300.
        let with_body = renderer(Theme::Dark).render_slide(&slide("short", Some("body")));
        assert_eq!(*with_body.get_pixel(150, 300), DARK.accent);

        let without = renderer(Theme::Dark).render_slide(&slide("short", None));
        assert_ne!(*without.get_pixel(150, 300), DARK.accent);
    }

    #[test]
    fn headline_text_changes_pixels() {
        let blank = renderer(Theme::Dark).render_slide(&slide("", None));
        let titled = renderer(Theme::Dark).render_slide(&slide("Заголовок", None));
        assert_ne!(blank, titled);
    }
}
