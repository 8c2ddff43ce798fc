//! Branch colors, drawn from the X11 color names Graphviz understands.

use rand::Rng;

/// Color of edges leaving the crawl root for root-level providers.
pub const ROOT_COLOR: &str = "black";

/// X11 colors used for top-level branches. Black is reserved for the root and
/// the palest tints are left out so edges stay visible on a white canvas.
pub const PALETTE: &[&str] = &[
    "aquamarine4",
    "blue",
    "blue4",
    "blueviolet",
    "brown",
    "brown3",
    "burlywood4",
    "cadetblue",
    "chartreuse3",
    "chocolate",
    "chocolate4",
    "coral",
    "coral3",
    "cornflowerblue",
    "crimson",
    "cyan3",
    "darkgoldenrod",
    "darkgreen",
    "darkkhaki",
    "darkmagenta",
    "darkolivegreen",
    "darkorange",
    "darkorange3",
    "darkorchid",
    "darkred",
    "darksalmon",
    "darkseagreen4",
    "darkslateblue",
    "darkslategray",
    "darkturquoise",
    "darkviolet",
    "deeppink",
    "deeppink4",
    "deepskyblue3",
    "dimgray",
    "dodgerblue",
    "dodgerblue4",
    "firebrick",
    "forestgreen",
    "gold3",
    "goldenrod",
    "goldenrod4",
    "green3",
    "hotpink3",
    "indianred",
    "indigo",
    "khaki4",
    "lightcoral",
    "lightseagreen",
    "lightslateblue",
    "limegreen",
    "magenta3",
    "maroon",
    "mediumblue",
    "mediumorchid",
    "mediumpurple",
    "mediumseagreen",
    "mediumslateblue",
    "mediumvioletred",
    "midnightblue",
    "navy",
    "olivedrab",
    "orange3",
    "orangered",
    "orchid4",
    "palevioletred",
    "peru",
    "plum4",
    "purple",
    "red",
    "red4",
    "rosybrown",
    "royalblue",
    "saddlebrown",
    "salmon",
    "seagreen",
    "sienna",
    "slateblue",
    "slategray",
    "springgreen4",
    "steelblue",
    "tan4",
    "teal",
    "tomato",
    "turquoise4",
    "violetred",
    "yellow4",
];

/// Pick a palette color not in `used`, by rejection sampling.
///
/// Once every color is taken, colors repeat.
pub fn pick_color<R: Rng>(rng: &mut R, used: &[&str]) -> &'static str {
    let exhausted = PALETTE.iter().all(|color| used.contains(color));
    loop {
        let color = PALETTE[rng.random_range(0..PALETTE.len())];
        if exhausted || !used.contains(&color) {
            return color;
        }
    }
}
