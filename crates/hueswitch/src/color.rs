//! Color values and their numeric-components form.
//!
//! Palette attributes are free-form strings, but color attributes can be
//! projected into a second, numeric form (`"r, g, b"`) so that style
//! consumers can compose them with an alpha channel, e.g.
//! `rgba(var(--color-scheme-accent-color-rgb), 0.5)`.
//!
//! Supported inputs:
//!
//! - Hex: `#fff`, `#ff6b35`
//! - Functional: `rgb(255, 107, 53)`, `rgb(255 107 53)`, `rgba(...)` (alpha ignored)
//! - Components: `255, 107, 53`
//! - Named: `black`, `white`, `red`, `green`, `blue`, `gray`
//!
//! Tokenizing is done with `cssparser`, so comments and whitespace behave
//! the way they do in a stylesheet.
//!
//! ```rust
//! use hueswitch::color::Rgb;
//!
//! let accent = Rgb::parse("#ff6b35").unwrap();
//! assert_eq!(accent.components(), "255, 107, 53");
//! assert_eq!(Rgb::parse("255, 107, 53").unwrap(), accent);
//! ```

use cssparser::{Parser, ParserInput, Token};

use crate::error::{Result, SchemeError};

/// A simple RGB color triplet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parses a color value from any of the supported notations.
    pub fn parse(value: &str) -> Result<Self> {
        let mut input = ParserInput::new(value);
        let mut parser = Parser::new(&mut input);

        parse_color(&mut parser)
            .and_then(|rgb| {
                parser
                    .expect_exhausted()
                    .map_err(|_| "unexpected trailing input".to_string())?;
                Ok(rgb)
            })
            .map_err(|message| SchemeError::InvalidColor {
                value: value.to_string(),
                message,
            })
    }

    /// Returns the numeric-components form, `"r, g, b"`.
    pub fn components(&self) -> String {
        format!("{}, {}, {}", self.0, self.1, self.2)
    }

    /// Returns the functional CSS form, `rgb(r, g, b)`.
    pub fn to_css(&self) -> String {
        format!("rgb({}, {}, {})", self.0, self.1, self.2)
    }

    /// Returns the 6-digit hex form, `#rrggbb`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    /// Nearest ANSI 256-color palette index, for terminal previews.
    pub fn to_ansi256(&self) -> u8 {
        let Rgb(r, g, b) = *self;
        if r == g && g == b {
            if r < 8 {
                16
            } else if r > 248 {
                231
            } else {
                232 + ((r as u16 - 8) * 24 / 247) as u8
            }
        } else {
            let red = (r as u16 * 5 / 255) as u8;
            let green = (g as u16 * 5 / 255) as u8;
            let blue = (b as u16 * 5 / 255) as u8;
            16 + 36 * red + 6 * green + blue
        }
    }
}

fn parse_color(parser: &mut Parser<'_, '_>) -> std::result::Result<Rgb, String> {
    let token = parser
        .next()
        .map_err(|_| "empty color value".to_string())?
        .clone();

    match token {
        Token::Hash(ref hex) | Token::IDHash(ref hex) => parse_hex(hex),
        Token::Function(ref name)
            if name.eq_ignore_ascii_case("rgb") || name.eq_ignore_ascii_case("rgba") =>
        {
            parser
                .parse_nested_block(|block| {
                    parse_components(block).map_err(|_| block.new_custom_error::<(), ()>(()))
                })
                .map_err(|_| format!("invalid {}() arguments", name))
        }
        Token::Number { value, .. } => {
            let first = channel(value)?;
            parser
                .expect_comma()
                .map_err(|_| "expected ',' between components".to_string())?;
            let rest = parse_remaining(parser)?;
            Ok(Rgb(first, rest.0, rest.1))
        }
        Token::Ident(ref ident) => parse_named(ident),
        other => Err(format!("unexpected token {:?}", other)),
    }
}

/// Parses `r, g, b` or `r g b`, with an optional trailing alpha.
fn parse_components(parser: &mut Parser<'_, '_>) -> std::result::Result<Rgb, String> {
    let mut channels = Vec::with_capacity(4);
    while !parser.is_exhausted() {
        match parser.next().map_err(|_| "truncated components".to_string())? {
            Token::Number { value, .. } => channels.push(channel(*value)?),
            Token::Percentage { unit_value, .. } => {
                channels.push(channel((unit_value * 255.0).round())?)
            }
            Token::Comma | Token::Delim('/') => {}
            other => return Err(format!("unexpected token {:?}", other)),
        }
    }

    match channels.as_slice() {
        [r, g, b] | [r, g, b, _] => Ok(Rgb(*r, *g, *b)),
        _ => Err(format!("expected 3 components, got {}", channels.len())),
    }
}

fn parse_remaining(parser: &mut Parser<'_, '_>) -> std::result::Result<(u8, u8), String> {
    let green = parser
        .expect_number()
        .map_err(|_| "expected green component".to_string())?;
    parser
        .expect_comma()
        .map_err(|_| "expected ',' between components".to_string())?;
    let blue = parser
        .expect_number()
        .map_err(|_| "expected blue component".to_string())?;
    Ok((channel(green)?, channel(blue)?))
}

fn channel(value: f32) -> std::result::Result<u8, String> {
    if !(0.0..=255.0).contains(&value) {
        return Err(format!("component {} out of range (0-255)", value));
    }
    Ok(value.round() as u8)
}

fn parse_hex(hex: &str) -> std::result::Result<Rgb, String> {
    if !hex.is_ascii() {
        return Err(format!("invalid hex: #{}", hex));
    }
    let digit = |s: &str| u8::from_str_radix(s, 16).map_err(|_| format!("invalid hex: #{}", hex));
    match hex.len() {
        3 => Ok(Rgb(
            digit(&hex[0..1])? * 17,
            digit(&hex[1..2])? * 17,
            digit(&hex[2..3])? * 17,
        )),
        6 => Ok(Rgb(
            digit(&hex[0..2])?,
            digit(&hex[2..4])?,
            digit(&hex[4..6])?,
        )),
        _ => Err(format!("invalid hex color: #{} (must be 3 or 6 digits)", hex)),
    }
}

fn parse_named(name: &str) -> std::result::Result<Rgb, String> {
    let rgb = match name.to_ascii_lowercase().as_str() {
        "black" => Rgb(0, 0, 0),
        "white" => Rgb(255, 255, 255),
        "red" => Rgb(255, 0, 0),
        "green" => Rgb(0, 128, 0),
        "blue" => Rgb(0, 0, 255),
        "gray" | "grey" => Rgb(128, 128, 128),
        _ => return Err(format!("unknown color name: {}", name)),
    };
    Ok(rgb)
}
