//! Palettes defined in CSS.
//!
//! Each class selector names a palette, and custom properties in its block
//! become the palette's attributes:
//!
//! ```css
//! .light {
//!     --accent-color: #005ab4;
//!     --color-scheme: light;
//! }
//!
//! .dark, .dim {
//!     --accent-color-rgb: 120, 180, 255;
//!     --color-scheme: dark;
//! }
//! ```
//!
//! Values are kept as written (trimmed), so anything the style consumer
//! understands can be used. Several rules for the same class merge, later
//! declarations winning. Palettes are returned in order of first
//! appearance.
//!
//! The parser is built on `cssparser`, so comments, escapes and nested
//! function values are handled by the tokenizer.

use std::path::Path;

use cssparser::{
    AtRuleParser, CowRcStr, DeclarationParser, ParseError, Parser, ParserInput, ParserState,
    QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser, Token,
};

use crate::error::{Result, SchemeError};
use crate::palette::Palette;

/// Parses palettes from CSS text.
///
/// ```rust
/// use hueswitch::config::parse_palettes_css;
///
/// let palettes = parse_palettes_css(".dark { --color-scheme: dark; }").unwrap();
/// assert_eq!(palettes[0].name(), "dark");
/// assert_eq!(palettes[0].get("color-scheme"), Some("dark"));
/// ```
pub fn parse_palettes_css(css: &str) -> Result<Vec<Palette>> {
    parse(css, None)
}

/// Reads and parses a CSS palette file.
pub fn load_palettes_css(path: impl AsRef<Path>) -> Result<Vec<Palette>> {
    let path = path.as_ref();
    let css = std::fs::read_to_string(path)
        .map_err(|e| SchemeError::config(Some(path.to_path_buf()), e.to_string()))?;
    parse(&css, Some(path))
}

fn parse(css: &str, path: Option<&Path>) -> Result<Vec<Palette>> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);

    let mut sheet = PaletteSheetParser {
        palettes: Vec::new(),
    };

    for result in cssparser::StyleSheetParser::new(&mut parser, &mut sheet) {
        if let Err((err, slice)) = result {
            return Err(SchemeError::config(
                path.map(Path::to_path_buf),
                format!(
                    "CSS parse error at line {}: {:?} in '{}'",
                    err.location.line + 1,
                    err.kind,
                    slice.trim()
                ),
            ));
        }
    }

    Ok(sheet.finish())
}

struct PaletteSheetParser {
    palettes: Vec<(String, Vec<(String, String)>)>,
}

impl PaletteSheetParser {
    fn merge(&mut self, name: String, attributes: &[(String, String)]) {
        match self.palettes.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) => existing.extend(attributes.iter().cloned()),
            None => self.palettes.push((name, attributes.to_vec())),
        }
    }

    fn finish(self) -> Vec<Palette> {
        self.palettes
            .into_iter()
            .map(|(name, attributes)| {
                attributes
                    .into_iter()
                    .fold(Palette::new(name), |palette, (attribute, value)| {
                        palette.with(attribute, value)
                    })
            })
            .collect()
    }
}

impl<'i> QualifiedRuleParser<'i> for PaletteSheetParser {
    type Prelude = Vec<String>;
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> std::result::Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let mut names = Vec::new();

        while let Ok(token) = input.next() {
            match token {
                Token::Delim('.') => {
                    let name = input.expect_ident()?;
                    names.push(name.as_ref().to_string());
                }
                Token::Comma => continue,
                _ => return Err(input.new_custom_error::<(), ()>(())),
            }
        }

        if names.is_empty() {
            return Err(input.new_custom_error::<(), ()>(()));
        }
        Ok(names)
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> std::result::Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        let mut declarations = PaletteDeclarationParser;
        let mut attributes = Vec::new();
        for result in RuleBodyParser::new(input, &mut declarations) {
            match result {
                Ok(declaration) => attributes.push(declaration),
                Err((err, _)) => return Err(err),
            }
        }

        for name in prelude {
            self.merge(name, &attributes);
        }
        Ok(())
    }
}

impl<'i> AtRuleParser<'i> for PaletteSheetParser {
    type Prelude = ();
    type AtRule = ();
    type Error = ();
}

struct PaletteDeclarationParser;

impl<'i> DeclarationParser<'i> for PaletteDeclarationParser {
    type Declaration = (String, String);
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> std::result::Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let attribute = match name.as_ref().strip_prefix("--") {
            Some(attribute) if !attribute.is_empty() => attribute.to_string(),
            _ => return Err(input.new_custom_error::<(), ()>(())),
        };

        let start = input.position();
        while input.next().is_ok() {}
        let value = input.slice_from(start).trim().to_string();
        if value.is_empty() {
            return Err(input.new_custom_error::<(), ()>(()));
        }
        Ok((attribute, value))
    }
}

impl<'i> AtRuleParser<'i> for PaletteDeclarationParser {
    type Prelude = ();
    type AtRule = (String, String);
    type Error = ();
}

impl<'i> QualifiedRuleParser<'i> for PaletteDeclarationParser {
    type Prelude = ();
    type QualifiedRule = (String, String);
    type Error = ();
}

impl<'i> RuleBodyItemParser<'i, (String, String), ()> for PaletteDeclarationParser {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}
