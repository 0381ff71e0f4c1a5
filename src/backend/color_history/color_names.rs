use rand::seq::SliceRandom;

/// Nearest-name lookup over a table of named colors.
pub trait ColorNameSource: Send + Sync {
    /// `hex` is `#rrggbb`. Returns `None` when it cannot be parsed.
    fn nearest(&self, hex: &str) -> Option<ColorMatch>;
    /// A random table entry as `#rrggbb`.
    fn random_hex(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorMatch {
    pub hex: String,
    pub name: String,
    pub exact: bool,
}

impl ColorMatch {
    /// Names carrying a `:` are diagnostic placeholders from the table, not
    /// color names.
    pub fn confident_name(&self) -> Option<&str> {
        let name = self.name.trim();
        if name.is_empty() || name.contains(':') {
            None
        } else {
            Some(name)
        }
    }
}

const NAMED_COLORS: [(&str, &str); 139] = [
    ("F0F8FF", "Alice Blue"),
    ("FAEBD7", "Antique White"),
    ("00FFFF", "Aqua"),
    ("7FFFD4", "Aquamarine"),
    ("F0FFFF", "Azure"),
    ("F5F5DC", "Beige"),
    ("FFE4C4", "Bisque"),
    ("000000", "Black"),
    ("FFEBCD", "Blanched Almond"),
    ("0000FF", "Blue"),
    ("8A2BE2", "Blue Violet"),
    ("A52A2A", "Brown"),
    ("DEB887", "Burly Wood"),
    ("5F9EA0", "Cadet Blue"),
    ("7FFF00", "Chartreuse"),
    ("D2691E", "Chocolate"),
    ("FF7F50", "Coral"),
    ("6495ED", "Cornflower Blue"),
    ("FFF8DC", "Cornsilk"),
    ("DC143C", "Crimson"),
    ("00008B", "Dark Blue"),
    ("008B8B", "Dark Cyan"),
    ("B8860B", "Dark Goldenrod"),
    ("A9A9A9", "Dark Gray"),
    ("006400", "Dark Green"),
    ("BDB76B", "Dark Khaki"),
    ("8B008B", "Dark Magenta"),
    ("556B2F", "Dark Olive Green"),
    ("FF8C00", "Dark Orange"),
    ("9932CC", "Dark Orchid"),
    ("8B0000", "Dark Red"),
    ("E9967A", "Dark Salmon"),
    ("8FBC8F", "Dark Sea Green"),
    ("483D8B", "Dark Slate Blue"),
    ("2F4F4F", "Dark Slate Gray"),
    ("00CED1", "Dark Turquoise"),
    ("9400D3", "Dark Violet"),
    ("FF1493", "Deep Pink"),
    ("00BFFF", "Deep Sky Blue"),
    ("696969", "Dim Gray"),
    ("1E90FF", "Dodger Blue"),
    ("B22222", "Fire Brick"),
    ("FFFAF0", "Floral White"),
    ("228B22", "Forest Green"),
    ("DCDCDC", "Gainsboro"),
    ("F8F8FF", "Ghost White"),
    ("FFD700", "Gold"),
    ("DAA520", "Goldenrod"),
    ("808080", "Gray"),
    ("008000", "Green"),
    ("ADFF2F", "Green Yellow"),
    ("F0FFF0", "Honeydew"),
    ("FF69B4", "Hot Pink"),
    ("CD5C5C", "Indian Red"),
    ("4B0082", "Indigo"),
    ("FFFFF0", "Ivory"),
    ("F0E68C", "Khaki"),
    ("E6E6FA", "Lavender"),
    ("FFF0F5", "Lavender Blush"),
    ("7CFC00", "Lawn Green"),
    ("FFFACD", "Lemon Chiffon"),
    ("ADD8E6", "Light Blue"),
    ("F08080", "Light Coral"),
    ("E0FFFF", "Light Cyan"),
    ("FAFAD2", "Light Goldenrod Yellow"),
    ("D3D3D3", "Light Gray"),
    ("90EE90", "Light Green"),
    ("FFB6C1", "Light Pink"),
    ("FFA07A", "Light Salmon"),
    ("20B2AA", "Light Sea Green"),
    ("87CEFA", "Light Sky Blue"),
    ("778899", "Light Slate Gray"),
    ("B0C4DE", "Light Steel Blue"),
    ("FFFFE0", "Light Yellow"),
    ("00FF00", "Lime"),
    ("32CD32", "Lime Green"),
    ("FAF0E6", "Linen"),
    ("FF00FF", "Magenta"),
    ("800000", "Maroon"),
    ("66CDAA", "Medium Aquamarine"),
    ("0000CD", "Medium Blue"),
    ("BA55D3", "Medium Orchid"),
    ("9370DB", "Medium Purple"),
    ("3CB371", "Medium Sea Green"),
    ("7B68EE", "Medium Slate Blue"),
    ("00FA9A", "Medium Spring Green"),
    ("48D1CC", "Medium Turquoise"),
    ("C71585", "Medium Violet Red"),
    ("191970", "Midnight Blue"),
    ("F5FFFA", "Mint Cream"),
    ("FFE4E1", "Misty Rose"),
    ("FFE4B5", "Moccasin"),
    ("FFDEAD", "Navajo White"),
    ("000080", "Navy"),
    ("FDF5E6", "Old Lace"),
    ("808000", "Olive"),
    ("6B8E23", "Olive Drab"),
    ("FFA500", "Orange"),
    ("FF4500", "Orange Red"),
    ("DA70D6", "Orchid"),
    ("EEE8AA", "Pale Goldenrod"),
    ("98FB98", "Pale Green"),
    ("AFEEEE", "Pale Turquoise"),
    ("DB7093", "Pale Violet Red"),
    ("FFEFD5", "Papaya Whip"),
    ("FFDAB9", "Peach Puff"),
    ("CD853F", "Peru"),
    ("FFC0CB", "Pink"),
    ("DDA0DD", "Plum"),
    ("B0E0E6", "Powder Blue"),
    ("800080", "Purple"),
    ("663399", "Rebecca Purple"),
    ("FF0000", "Red"),
    ("BC8F8F", "Rosy Brown"),
    ("4169E1", "Royal Blue"),
    ("8B4513", "Saddle Brown"),
    ("FA8072", "Salmon"),
    ("F4A460", "Sandy Brown"),
    ("2E8B57", "Sea Green"),
    ("FFF5EE", "Seashell"),
    ("A0522D", "Sienna"),
    ("C0C0C0", "Silver"),
    ("87CEEB", "Sky Blue"),
    ("6A5ACD", "Slate Blue"),
    ("708090", "Slate Gray"),
    ("FFFAFA", "Snow"),
    ("00FF7F", "Spring Green"),
    ("4682B4", "Steel Blue"),
    ("D2B48C", "Tan"),
    ("008080", "Teal"),
    ("D8BFD8", "Thistle"),
    ("FF6347", "Tomato"),
    ("40E0D0", "Turquoise"),
    ("EE82EE", "Violet"),
    ("F5DEB3", "Wheat"),
    ("FFFFFF", "White"),
    ("F5F5F5", "White Smoke"),
    ("FFFF00", "Yellow"),
    ("9ACD32", "Yellow Green"),
];

#[derive(Debug, Clone)]
struct NamedColor {
    hex: &'static str,
    name: &'static str,
    rgb: [i64; 3],
    hsl: [i64; 3],
}

/// The built-in table. Distance mixes RGB and HSL, with HSL weighted twice.
#[derive(Debug, Clone)]
pub struct NamedColorTable {
    entries: Vec<NamedColor>,
}

impl Default for NamedColorTable {
    fn default() -> Self {
        let entries = NAMED_COLORS
            .iter()
            .filter_map(|&(hex, name)| {
                let rgb = parse_hex_rgb(hex)?;
                Some(NamedColor {
                    hex,
                    name,
                    rgb: rgb.map(i64::from),
                    hsl: rgb_to_scaled_hsl(rgb),
                })
            })
            .collect();
        Self { entries }
    }
}

impl NamedColorTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ColorNameSource for NamedColorTable {
    fn nearest(&self, hex: &str) -> Option<ColorMatch> {
        let digits = hex.trim().trim_start_matches('#').to_uppercase();
        let rgb = parse_hex_rgb(&digits)?;
        let target_rgb = rgb.map(i64::from);
        let target_hsl = rgb_to_scaled_hsl(rgb);

        let mut best: Option<(&NamedColor, i64)> = None;
        for entry in &self.entries {
            if entry.hex == digits {
                return Some(ColorMatch {
                    hex: format!("#{}", entry.hex),
                    name: entry.name.to_string(),
                    exact: true,
                });
            }

            let rgb_distance = squared_distance(target_rgb, entry.rgb);
            let hsl_distance = squared_distance(target_hsl, entry.hsl);
            let distance = rgb_distance + hsl_distance * 2;
            if best.map_or(true, |(_, current)| distance < current) {
                best = Some((entry, distance));
            }
        }

        best.map(|(entry, _)| ColorMatch {
            hex: format!("#{}", entry.hex),
            name: entry.name.to_string(),
            exact: false,
        })
    }

    fn random_hex(&self) -> String {
        self.entries
            .choose(&mut rand::thread_rng())
            .map(|entry| format!("#{}", entry.hex.to_lowercase()))
            .unwrap_or_else(|| "#000000".to_string())
    }
}

pub(crate) fn parse_hex_rgb(digits: &str) -> Option<[u8; 3]> {
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let channel = |start: usize| u8::from_str_radix(&digits[start..start + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

fn squared_distance(left: [i64; 3], right: [i64; 3]) -> i64 {
    left.iter()
        .zip(right.iter())
        .map(|(a, b)| (a - b).pow(2))
        .sum()
}

// Hue, saturation and lightness, each scaled to 0..=255 and truncated.
fn rgb_to_scaled_hsl(rgb: [u8; 3]) -> [i64; 3] {
    let [r, g, b] = rgb.map(|channel| f64::from(channel) / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let lightness = (max + min) / 2.0;

    let mut saturation = 0.0;
    if lightness > 0.0 && lightness < 1.0 {
        saturation = delta
            / if lightness < 0.5 {
                2.0 * lightness
            } else {
                2.0 - 2.0 * lightness
            };
    }

    let mut hue = 0.0;
    if delta > 0.0 {
        if max == r && max != g {
            hue += (g - b) / delta;
        }
        if max == g && max != b {
            hue += 2.0 + (b - r) / delta;
        }
        if max == b && max != r {
            hue += 4.0 + (r - g) / delta;
        }
        hue /= 6.0;
    }

    [
        (hue * 255.0) as i64,
        (saturation * 255.0) as i64,
        (lightness * 255.0) as i64,
    ]
}
