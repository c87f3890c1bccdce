use std::fmt;
use std::str::FromStr;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};
use serde::{Deserialize, Serialize};

use crate::analysis::Distribution;

// ---------------------------------------------------------------------------
// Color schemes
// ---------------------------------------------------------------------------

/// Sequential colour schemes offered for the value colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Viridis,
    Plasma,
    Inferno,
    Magma,
    Cividis,
    Rainbow,
}

// Ten evenly spaced samples of each perceptual map.
const VIRIDIS: [[u8; 3]; 10] = [
    [0x44, 0x01, 0x54], [0x48, 0x28, 0x78], [0x3e, 0x49, 0x89], [0x31, 0x68, 0x8e], [0x26, 0x82, 0x8e],
    [0x1f, 0x9e, 0x89], [0x35, 0xb7, 0x79], [0x6e, 0xce, 0x58], [0xb5, 0xde, 0x2b], [0xfd, 0xe7, 0x25],
];
const PLASMA: [[u8; 3]; 10] = [
    [0x0d, 0x08, 0x87], [0x46, 0x03, 0x9f], [0x72, 0x01, 0xa8], [0x9c, 0x17, 0x9e], [0xbd, 0x37, 0x86],
    [0xd8, 0x57, 0x6b], [0xed, 0x79, 0x53], [0xfb, 0x9f, 0x3a], [0xfd, 0xca, 0x26], [0xf0, 0xf9, 0x21],
];
const INFERNO: [[u8; 3]; 10] = [
    [0x00, 0x00, 0x04], [0x1b, 0x0c, 0x41], [0x4a, 0x0c, 0x6b], [0x78, 0x1c, 0x6d], [0xa5, 0x2c, 0x60],
    [0xcf, 0x44, 0x46], [0xed, 0x69, 0x25], [0xfb, 0x9b, 0x06], [0xf7, 0xd1, 0x3d], [0xfc, 0xff, 0xa4],
];
const MAGMA: [[u8; 3]; 10] = [
    [0x00, 0x00, 0x04], [0x18, 0x0f, 0x3d], [0x44, 0x0f, 0x76], [0x72, 0x1f, 0x81], [0x9e, 0x2f, 0x7f],
    [0xcd, 0x40, 0x71], [0xf1, 0x60, 0x5d], [0xfd, 0x96, 0x68], [0xfe, 0xca, 0x8d], [0xfc, 0xfd, 0xbf],
];
const CIVIDIS: [[u8; 3]; 10] = [
    [0x00, 0x22, 0x4e], [0x12, 0x35, 0x70], [0x3b, 0x49, 0x6c], [0x57, 0x5d, 0x6d], [0x70, 0x71, 0x73],
    [0x8a, 0x87, 0x79], [0xa6, 0x9d, 0x75], [0xc4, 0xb5, 0x6c], [0xe4, 0xcf, 0x5b], [0xfe, 0xe8, 0x38],
];

impl ColorScheme {
    pub const ALL: [ColorScheme; 6] = [
        ColorScheme::Viridis,
        ColorScheme::Plasma,
        ColorScheme::Inferno,
        ColorScheme::Magma,
        ColorScheme::Cividis,
        ColorScheme::Rainbow,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ColorScheme::Viridis => "viridis",
            ColorScheme::Plasma => "plasma",
            ColorScheme::Inferno => "inferno",
            ColorScheme::Magma => "magma",
            ColorScheme::Cividis => "cividis",
            ColorScheme::Rainbow => "rainbow",
        }
    }

    fn stops(self) -> Option<&'static [[u8; 3]; 10]> {
        match self {
            ColorScheme::Viridis => Some(&VIRIDIS),
            ColorScheme::Plasma => Some(&PLASMA),
            ColorScheme::Inferno => Some(&INFERNO),
            ColorScheme::Magma => Some(&MAGMA),
            ColorScheme::Cividis => Some(&CIVIDIS),
            ColorScheme::Rainbow => None,
        }
    }

    /// Colour at position `t` in `[0, 1]` (clamped).
    pub fn sample(self, t: f32) -> Color32 {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };

        let rgb: Srgb = match self.stops() {
            Some(stops) => {
                let pos = t * (stops.len() - 1) as f32;
                let lower = (pos.floor() as usize).min(stops.len() - 2);
                let frac = pos - lower as f32;
                let a = stop_linear(stops[lower]);
                let b = stop_linear(stops[lower + 1]);
                a.mix(b, frac).into_color()
            }
            // Violet through to red, like the classic rainbow map.
            None => Hsl::new(270.0 * (1.0 - t), 1.0, 0.5).into_color(),
        };

        let rgb = rgb.into_format::<u8>();
        Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
    }

    /// A scheme that reads apart from `self`, for a second table drawn in
    /// the same view.
    pub fn contrasting(self) -> Self {
        match self {
            ColorScheme::Viridis => ColorScheme::Plasma,
            _ => ColorScheme::Viridis,
        }
    }

    /// `n` colours evenly spaced over the whole scheme.
    pub fn generate_palette(self, n: usize) -> Vec<Color32> {
        match n {
            0 => Vec::new(),
            1 => vec![self.sample(0.0)],
            _ => (0..n)
                .map(|i| self.sample(i as f32 / (n - 1) as f32))
                .collect(),
        }
    }
}

fn stop_linear([r, g, b]: [u8; 3]) -> LinSrgb {
    Srgb::new(r, g, b).into_format::<f32>().into_linear()
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColorScheme::ALL
            .into_iter()
            .find(|scheme| scheme.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown color scheme '{s}'"))
    }
}

// ---------------------------------------------------------------------------
// Color mapping: value → bin → Color32
// ---------------------------------------------------------------------------

/// Maps values to the colour of the distribution bin they fall into.
#[derive(Debug, Clone)]
pub struct BinColorMap {
    pub scheme: ColorScheme,
    distribution: Distribution,
    colors: Vec<Color32>,
}

impl BinColorMap {
    /// One colour per bin, spread evenly over the scheme.
    pub fn new(scheme: ColorScheme, distribution: &Distribution) -> Self {
        BinColorMap {
            scheme,
            colors: scheme.generate_palette(distribution.num_bins()),
            distribution: distribution.clone(),
        }
    }

    pub fn bin_color(&self, bin: usize) -> Color32 {
        self.colors.get(bin).copied().unwrap_or(Color32::GRAY)
    }

    /// Return the legend entries (range label with count → colour) for the UI.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        self.distribution
            .bins
            .iter()
            .zip(self.colors.iter())
            .map(|(bin, c)| (format!("{} ({})", bin.label, bin.count), *c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;

    #[test]
    fn sample_hits_scheme_endpoints() {
        assert_eq!(ColorScheme::Viridis.sample(0.0), Color32::from_rgb(0x44, 0x01, 0x54));
        assert_eq!(ColorScheme::Viridis.sample(1.0), Color32::from_rgb(0xfd, 0xe7, 0x25));
        assert_eq!(ColorScheme::Magma.sample(-3.0), ColorScheme::Magma.sample(0.0));
    }

    #[test]
    fn rainbow_runs_violet_to_red() {
        let first = ColorScheme::Rainbow.sample(0.0);
        let last = ColorScheme::Rainbow.sample(1.0);
        assert!(first.b() > first.g());
        assert_eq!(last, Color32::from_rgb(255, 0, 0));
    }

    #[test]
    fn palette_sizes() {
        for scheme in ColorScheme::ALL {
            assert!(scheme.generate_palette(0).is_empty());
            assert_eq!(scheme.generate_palette(1).len(), 1);
            assert_eq!(scheme.generate_palette(7).len(), 7);
        }
    }

    #[test]
    fn scheme_names_round_trip() {
        for scheme in ColorScheme::ALL {
            assert_eq!(scheme.name().parse::<ColorScheme>(), Ok(scheme));
        }
        assert_eq!("  PLASMA ".parse::<ColorScheme>(), Ok(ColorScheme::Plasma));
        assert!("jet".parse::<ColorScheme>().is_err());
    }

    #[test]
    fn contrasting_scheme_differs() {
        for scheme in ColorScheme::ALL {
            assert_ne!(scheme.contrasting(), scheme);
        }
        assert_eq!(ColorScheme::Viridis.contrasting(), ColorScheme::Plasma);
    }

    #[test]
    fn values_take_their_bin_colour() {
        let dist = analyze(&[0.0, 10.0, 20.0, 30.0], 3, false).unwrap();
        let map = BinColorMap::new(ColorScheme::Viridis, &dist);

        let color_for = |v: f64| map.bin_color(dist.bin_index(v));
        assert_eq!(color_for(0.0), map.bin_color(0));
        assert_eq!(color_for(15.0), map.bin_color(1));
        assert_eq!(color_for(30.0), map.bin_color(2));
        assert_eq!(map.bin_color(0), ColorScheme::Viridis.sample(0.0));
        assert_eq!(map.bin_color(2), ColorScheme::Viridis.sample(1.0));
        assert_eq!(map.bin_color(9), Color32::GRAY);

        let legend = map.legend_entries();
        assert_eq!(legend.len(), 3);
        assert!(legend[0].0.ends_with("(1)"));
        assert!(legend[2].0.ends_with("(2)"));
    }
}
