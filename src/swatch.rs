use palette::Srgb;

/// A single palette entry: a color and the share of the analyzed pixels it stands for.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Swatch {
    red: u8,
    green: u8,
    blue: u8,
    ratio: f64,
}

impl Swatch {
    pub fn new((red, green, blue): (u8, u8, u8), ratio: f64) -> Swatch {
        Self {
            red,
            green,
            blue,
            ratio,
        }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        (self.red, self.green, self.blue)
    }

    /// The color as a lowercase `#rrggbb` string.
    pub fn hex(self) -> String {
        format!("#{:x}", Srgb::new(self.red, self.green, self.blue))
    }

    /// The weight of the swatch's cluster relative to the analysis' pixel count.
    pub fn ratio(self) -> f64 {
        self.ratio
    }
}
