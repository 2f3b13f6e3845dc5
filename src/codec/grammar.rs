use std::borrow::Cow;

use winnow::combinator::{alt, cut_err, opt, preceded, repeat, terminated};
use winnow::error::{ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{take_till, take_until, take_while};

use super::tree::{XmlElement, XmlNode};

// -- Whitespace & skipped markup --------------------------------------------

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., is_space).void().parse_next(input)
}

fn comment(input: &mut &str) -> ModalResult<()> {
    ("<!--", cut_err((take_until(0.., "-->"), "-->")))
        .void()
        .context(StrContext::Label("comment"))
        .parse_next(input)
}

fn processing_instruction(input: &mut &str) -> ModalResult<()> {
    ("<?", cut_err((take_until(0.., "?>"), "?>")))
        .void()
        .context(StrContext::Label("processing instruction"))
        .parse_next(input)
}

// Internal subsets are not supported: the declaration ends at the first '>'.
fn doctype(input: &mut &str) -> ModalResult<()> {
    ("<!DOCTYPE", cut_err((take_till(0.., '>'), '>')))
        .void()
        .parse_next(input)
}

fn misc(input: &mut &str) -> ModalResult<()> {
    let _: () = repeat(
        0..,
        alt((
            take_while(1.., is_space).void(),
            comment,
            processing_instruction,
        )),
    )
    .parse_next(input)?;
    Ok(())
}

// -- Names & attributes -----------------------------------------------------

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == ':'
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_numeric() || c == '-' || c == '.'
}

fn xml_name<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (take_while(1, is_name_start), take_while(0.., is_name_char))
        .take()
        .parse_next(input)
}

fn quoted<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    alt((
        ('"', take_till(0.., '"'), '"').map(|(_, v, _)| v),
        ('\'', take_till(0.., '\''), '\'').map(|(_, v, _)| v),
    ))
    .parse_next(input)
}

fn attribute(input: &mut &str) -> ModalResult<(String, String)> {
    let name = xml_name.parse_next(input)?;
    cut_err((ws, '=', ws))
        .context(StrContext::Expected(StrContextValue::CharLiteral('=')))
        .parse_next(input)?;
    let value = cut_err(quoted)
        .context(StrContext::Expected(StrContextValue::Description(
            "quoted attribute value",
        )))
        .parse_next(input)?;
    Ok((name.to_owned(), unescape(value).into_owned()))
}

// -- Content ----------------------------------------------------------------

fn cdata<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    preceded(
        "<![CDATA[",
        cut_err(terminated(take_until(0.., "]]>"), "]]>")),
    )
    .parse_next(input)
}

fn char_data(input: &mut &str) -> ModalResult<String> {
    let raw = take_till(1.., '<').parse_next(input)?;
    Ok(unescape(raw).into_owned())
}

fn content(input: &mut &str) -> ModalResult<Vec<XmlNode>> {
    let nodes: Vec<Option<XmlNode>> = repeat(
        0..,
        alt((
            comment.value(None::<XmlNode>),
            cdata.map(|text: &str| Some(XmlNode::Text(text.to_owned()))),
            processing_instruction.value(None::<XmlNode>),
            element.map(|e| Some(XmlNode::Element(e))),
            char_data.map(|text| Some(XmlNode::Text(text))),
        )),
    )
    .parse_next(input)?;
    Ok(nodes.into_iter().flatten().collect())
}

fn element(input: &mut &str) -> ModalResult<XmlElement> {
    '<'.parse_next(input)?;
    let name = xml_name.parse_next(input)?;

    let attributes: Vec<(String, String)> =
        repeat(0.., preceded(take_while(1.., is_space), attribute)).parse_next(input)?;
    ws.parse_next(input)?;

    let mut element = XmlElement {
        name: name.to_owned(),
        attributes,
        children: Vec::new(),
    };

    if opt("/>").parse_next(input)?.is_some() {
        return Ok(element);
    }

    cut_err('>')
        .context(StrContext::Expected(StrContextValue::CharLiteral('>')))
        .parse_next(input)?;

    element.children = content.parse_next(input)?;

    cut_err("</")
        .context(StrContext::Expected(StrContextValue::StringLiteral("</")))
        .parse_next(input)?;
    cut_err(xml_name.verify(|closing: &str| closing == name))
        .context(StrContext::Label("closing tag"))
        .parse_next(input)?;
    (ws, cut_err('>')).parse_next(input)?;

    Ok(element)
}

// -- Entities ---------------------------------------------------------------

/// Resolve predefined entities and character references. Unknown references
/// are kept verbatim.
pub(crate) fn unescape(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let resolved = tail
            .find(';')
            .and_then(|end| resolve_entity(&tail[1..end]).map(|c| (c, end)));
        match resolved {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = match name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => name.strip_prefix('#')?.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

// -- Top-level parser -------------------------------------------------------

pub fn parse_document(input: &mut &str) -> ModalResult<XmlElement> {
    opt('\u{feff}').parse_next(input)?;
    misc.parse_next(input)?;
    opt((doctype, misc)).parse_next(input)?;

    let root = cut_err(element)
        .context(StrContext::Label("root element"))
        .parse_next(input)?;

    misc.parse_next(input)?;
    Ok(root)
}
