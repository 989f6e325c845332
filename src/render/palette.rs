use plotters::style::{Color, RGBColor};

/// Sequential colour ramp, sampled by linear interpolation between stops.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    stops: &'static [RGBColor],
}

pub const BU_PU: Palette = Palette {
    stops: &[
        RGBColor(0xf7, 0xfc, 0xfd),
        RGBColor(0xe0, 0xec, 0xf4),
        RGBColor(0xbf, 0xd3, 0xe6),
        RGBColor(0x9e, 0xbc, 0xda),
        RGBColor(0x8c, 0x96, 0xc6),
        RGBColor(0x8c, 0x6b, 0xb1),
        RGBColor(0x88, 0x41, 0x9d),
        RGBColor(0x81, 0x0f, 0x7c),
        RGBColor(0x4d, 0x00, 0x4b),
    ],
};

pub const ORANGES: Palette = Palette {
    stops: &[
        RGBColor(0xff, 0xf5, 0xeb),
        RGBColor(0xfe, 0xe6, 0xce),
        RGBColor(0xfd, 0xd0, 0xa2),
        RGBColor(0xfd, 0xae, 0x6b),
        RGBColor(0xfd, 0x8d, 0x3c),
        RGBColor(0xf1, 0x69, 0x13),
        RGBColor(0xd9, 0x48, 0x01),
        RGBColor(0xa6, 0x36, 0x03),
        RGBColor(0x7f, 0x27, 0x04),
    ],
};

/// Land-use classes in ascending code order: dark green, green, orange,
/// blue, light sea green, yellow, white.
pub const LAND_USE: [RGBColor; 7] = [
    RGBColor(0x00, 0x64, 0x00),
    RGBColor(0x00, 0x80, 0x00),
    RGBColor(0xff, 0xa5, 0x00),
    RGBColor(0x00, 0x00, 0xff),
    RGBColor(0x20, 0xb2, 0xaa),
    RGBColor(0xff, 0xff, 0x00),
    RGBColor(0xff, 0xff, 0xff),
];

/// Colour of the `index`th category, repeating past the end of the list.
pub fn category(index: usize) -> RGBColor {
    LAND_USE[index % LAND_USE.len()]
}

/// Fill for cells without a value.
pub const NO_DATA: RGBColor = RGBColor(0xd3, 0xd3, 0xd3);

impl Palette {
    /// Colour at `t` in [0, 1]; values outside are clamped.
    pub fn sample(&self, t: f64) -> RGBColor {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let last = self.stops.len() - 1;
        let position = t * last as f64;
        let lower = (position.floor() as usize).min(last);
        let upper = (lower + 1).min(last);
        let weight = position - lower as f64;

        let (r0, g0, b0) = self.stops[lower].rgb();
        let (r1, g1, b1) = self.stops[upper].rgb();
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * weight).round() as u8;
        RGBColor(mix(r0, r1), mix(g0, g1), mix(b0, b1))
    }

    pub fn sample_or_no_data(&self, t: Option<f64>) -> RGBColor {
        t.map_or(NO_DATA, |t| self.sample(t))
    }
}

pub fn hex(color: RGBColor) -> String {
    let (r, g, b) = color.rgb();
    format!("#{r:02x}{g:02x}{b:02x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ends_of_the_ramp_are_its_stops() {
        assert_eq!(hex(BU_PU.sample(0.0)), "#f7fcfd");
        assert_eq!(hex(BU_PU.sample(1.0)), "#4d004b");
        assert_eq!(hex(ORANGES.sample(7.5)), "#7f2704");
    }

    #[test]
    fn interpolates_between_stops() {
        // halfway between the first two stops
        assert_eq!(hex(ORANGES.sample(0.0625)), "#ffeedd");
        assert_eq!(hex(ORANGES.sample_or_no_data(None)), "#d3d3d3");
    }

    #[test]
    fn categories_wrap_around() {
        assert_eq!(hex(category(0)), "#006400");
        assert_eq!(hex(category(6)), "#ffffff");
        assert_eq!(category(7), category(0));
    }
}
