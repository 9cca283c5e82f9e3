use cfactory_core::Theme;
use image::Rgb;

/// Colours used to draw one slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub bg_start: Rgb<u8>,
    pub bg_end: Rgb<u8>,
    pub text: Rgb<u8>,
    pub accent: Rgb<u8>,
    pub muted: Rgb<u8>,
}

const ACCENT: Rgb<u8> = Rgb([0xcb, 0x11, 0xab]);

pub const DARK: Palette = Palette {
    bg_start: Rgb([0x1a, 0x1a, 0x1a]),
    bg_end: Rgb([0x2d, 0x0b, 0x31]),
    text: Rgb([0xff, 0xff, 0xff]),
    accent: ACCENT,
    muted: Rgb([0xa0, 0xa0, 0xa0]),
};

pub const LIGHT: Palette = Palette {
    bg_start: Rgb([0xff, 0xff, 0xff]),
    bg_end: Rgb([0xf0, 0xf0, 0xf0]),
    text: Rgb([0x00, 0x00, 0x00]),
    accent: ACCENT,
    muted: Rgb([0x66, 0x66, 0x66]),
};

impl Palette {
    #[must_use]
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => DARK,
            Theme::Light => LIGHT,
        }
    }

    /// Background colour of row `y` in a vertical gradient of `height` rows.
    #[must_use]
    pub fn gradient_row(&self, y: u32, height: u32) -> Rgb<u8> {
        let Rgb(start) = self.bg_start;
        let Rgb(end) = self.bg_end;
        let mut out = [0u8; 3];
        for (i, channel) in out.iter_mut().enumerate() {
            *channel = lerp(start[i], end[i], y, height);
        }
        Rgb(out)
    }
}

fn lerp(from: u8, to: u8, step: u32, steps: u32) -> u8 {
    if steps == 0 {
        return from;
    }
    let from = i64::from(from);
    let to = i64::from(to);
    let value = from + (to - from) * i64::from(step) / i64::from(steps);
    u8::try_from(value.clamp(0, 255)).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_starts_at_start_colour() {
        assert_eq!(DARK.gradient_row(0, 1350), DARK.bg_start);
        assert_eq!(LIGHT.gradient_row(0, 1350), LIGHT.bg_start);
    }

    #[test]
    fn gradient_approaches_end_colour() {
        let last = DARK.gradient_row(1349, 1350);
        let Rgb(end) = DARK.bg_end;
        let Rgb(got) = last;
        for i in 0..3 {
            assert!(got[i].abs_diff(end[i]) <= 1, "channel {i}: {got:?} vs {end:?}");
        }
    }

    #[test]
    fn gradient_midpoint_is_between_endpoints() {
        let Rgb(mid) = LIGHT.gradient_row(675, 1350);
        assert!(mid[0] < 0xff && mid[0] > 0xf0);
    }

    #[test]
    fn theme_selects_palette() {
        assert_eq!(Palette::for_theme(Theme::Dark), DARK);
        assert_eq!(Palette::for_theme(Theme::Light), LIGHT);
    }
}
