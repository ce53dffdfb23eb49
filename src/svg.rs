//! Root `<svg>` header handling.
//!
//! The header is read into an immutable [`SvgHeader`], squared by a pure
//! transform, and written back into the document only when it changed.

use std::borrow::Cow;
use std::fmt;

use anyhow::{anyhow, bail, Context, Result};
use quick_xml::{
    events::{attributes::Attribute, BytesStart, Event},
    Reader, Writer,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SvgHeader {
    pub width: f64,
    pub height: f64,
    pub view_box: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    pub fn parse(value: &str) -> Result<Self> {
        let numbers = value
            .split(|c: char| c.is_ascii_whitespace() || c == ',')
            .filter(|token| !token.is_empty())
            .map(|token| {
                token
                    .parse::<f64>()
                    .map_err(|_| anyhow!("viewBox token '{}' is not a number", token))
            })
            .collect::<Result<Vec<_>>>()?;

        match numbers[..] {
            [min_x, min_y, width, height] => Ok(Self {
                min_x,
                min_y,
                width,
                height,
            }),
            _ => bail!(
                "viewBox '{}' must have 4 numbers, found {}",
                value,
                numbers.len()
            ),
        }
    }
}

impl fmt::Display for ViewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.min_x, self.min_y, self.width, self.height
        )
    }
}

impl SvgHeader {
    /// Reads `width`, `height` and `viewBox` from the document's root element.
    ///
    /// Dimensions may carry a `px` suffix; a missing dimension reads as 0.
    pub fn parse(text: &str) -> Result<Self> {
        let mut reader = Reader::from_str(text);

        loop {
            match reader.read_event() {
                Ok(Event::Start(elem)) | Ok(Event::Empty(elem)) => {
                    if elem.local_name().as_ref() != b"svg" {
                        bail!(
                            "Root element is <{}>, expected <svg>",
                            String::from_utf8_lossy(elem.name().as_ref())
                        );
                    }
                    return Self::from_element(&elem);
                }
                Ok(Event::Eof) => bail!("Document has no <svg> root element"),
                Ok(_) => {}
                Err(e) => bail!(
                    "XML parse error at position {}: {:?}",
                    reader.error_position(),
                    e
                ),
            }
        }
    }

    fn from_element(elem: &BytesStart<'_>) -> Result<Self> {
        let mut width = None;
        let mut height = None;
        let mut view_box = None;

        for attr in elem.attributes() {
            let attr = attr.context("Malformed attribute on <svg>")?;
            match attr.key.as_ref() {
                b"width" => width = Some(attr_value(&attr)?),
                b"height" => height = Some(attr_value(&attr)?),
                b"viewBox" => view_box = Some(attr_value(&attr)?),
                _ => {}
            }
        }

        Ok(Self {
            width: parse_dimension("width", width.as_deref())?,
            height: parse_dimension("height", height.as_deref())?,
            view_box,
        })
    }

    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    /// Pads the shorter side so the header describes a square canvas.
    ///
    /// The viewBox grows symmetrically along the short axis so the artwork
    /// stays centered. Already square headers are returned unchanged.
    pub fn squared(&self) -> Result<Self> {
        if self.is_square() {
            return Ok(self.clone());
        }

        let raw = self
            .view_box
            .as_deref()
            .ok_or_else(|| anyhow!("Cannot square a non-square <svg> without a viewBox"))?;
        let mut vb = ViewBox::parse(raw)?;

        let (short, long) = if self.width > self.height {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        };
        if short <= 0.0 {
            bail!(
                "Cannot square <svg> with width={} height={}",
                self.width,
                self.height
            );
        }
        let ratio = long / short;

        if self.width > self.height {
            let grown = vb.height * ratio;
            vb.min_y -= (grown - vb.height) / 2.0;
            vb.height = grown;
        } else {
            let grown = vb.width * ratio;
            vb.min_x -= (grown - vb.width) / 2.0;
            vb.width = grown;
        }

        Ok(Self {
            width: long,
            height: long,
            view_box: Some(vb.to_string()),
        })
    }
}

fn attr_value(attr: &Attribute<'_>) -> Result<String> {
    let value = std::str::from_utf8(&attr.value).with_context(|| {
        format!(
            "Attribute '{}' is not valid UTF-8",
            String::from_utf8_lossy(attr.key.as_ref())
        )
    })?;
    Ok(value.to_string())
}

fn parse_dimension(name: &str, value: Option<&str>) -> Result<f64> {
    let raw = value.unwrap_or("0");
    let number = raw.trim().trim_end_matches("px").trim();
    number
        .parse::<f64>()
        .with_context(|| format!("<svg> {} '{}' is not a number", name, raw))
}

/// Returns `text` with a square aspect ratio.
///
/// Borrowed when the document is already square; otherwise an owned copy
/// whose root element carries the squared header.
pub fn square_svg(text: &str) -> Result<Cow<'_, str>> {
    let header = SvgHeader::parse(text)?;
    let squared = header.squared()?;
    if squared == header {
        return Ok(Cow::Borrowed(text));
    }
    Ok(Cow::Owned(write_header(text, &squared)?))
}

/// Rewrites the root element's `width`, `height` and `viewBox` from `header`.
///
/// All other attributes, and everything outside the root start tag, pass
/// through unchanged.
pub fn write_header(text: &str, header: &SvgHeader) -> Result<String> {
    let mut reader = Reader::from_str(text);
    let mut writer = Writer::new(Vec::with_capacity(text.len() + 64));
    let mut rewritten = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(elem)) if !rewritten => {
                writer.write_event(Event::Start(with_header(&elem, header)?))?;
                rewritten = true;
            }
            Ok(Event::Empty(elem)) if !rewritten => {
                writer.write_event(Event::Empty(with_header(&elem, header)?))?;
                rewritten = true;
            }
            Ok(Event::Eof) => break,
            Ok(event) => writer.write_event(event)?,
            Err(e) => bail!(
                "XML parse error at position {}: {:?}",
                reader.error_position(),
                e
            ),
        }
    }

    if !rewritten {
        bail!("Document has no <svg> root element");
    }

    String::from_utf8(writer.into_inner()).context("Rewritten SVG is not valid UTF-8")
}

fn with_header(elem: &BytesStart<'_>, header: &SvgHeader) -> Result<BytesStart<'static>> {
    let width = format!("{}px", header.width);
    let height = format!("{}px", header.height);
    let mut pending: Vec<(&str, &str)> =
        vec![("width", width.as_str()), ("height", height.as_str())];
    if let Some(view_box) = &header.view_box {
        pending.push(("viewBox", view_box.as_str()));
    }

    let mut root = elem.clone().into_owned();
    root.clear_attributes();

    for attr in elem.attributes() {
        let attr = attr.context("Malformed attribute on <svg>")?;
        let key = attr.key.as_ref();
        match pending.iter().position(|(name, _)| name.as_bytes() == key) {
            Some(index) => {
                root.push_attribute(pending.remove(index));
            }
            None => {
                root.push_attribute(attr);
            }
        }
    }

    // Attributes the source element did not have go last.
    for attr in pending {
        root.push_attribute(attr);
    }

    Ok(root)
}
