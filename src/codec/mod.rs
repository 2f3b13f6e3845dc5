//! Decoding of XACML policy documents.
//!
//! The default [`XacmlCodec`] parses XML with a small `winnow` grammar into an
//! [`XmlElement`] tree and maps the root `Policy` / `PolicySet` element onto a
//! [`PolicyDocument`]. Decision engines with their own native format can plug
//! in through [`DocumentCodec`].

mod error;
mod grammar;
mod tree;
mod xacml;

pub use error::DecodeError;
pub use tree::{XmlElement, XmlNode};

use crate::types::PolicyDocument;

/// Turns raw document text into a [`PolicyDocument`].
pub trait DocumentCodec: Send + Sync {
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the text is not a valid policy document.
    fn decode(&self, text: &str) -> Result<PolicyDocument, DecodeError>;
}

/// XACML 2.0 codec over the built-in XML grammar.
#[derive(Debug, Clone, Copy, Default)]
pub struct XacmlCodec;

impl DocumentCodec for XacmlCodec {
    fn decode(&self, text: &str) -> Result<PolicyDocument, DecodeError> {
        let root = parse_xml(text)?;
        xacml::decode_element(&root)
    }
}

/// Parse XML text into an element tree.
///
/// # Errors
///
/// Returns [`DecodeError`] if the input is not well-formed.
pub fn parse_xml(input: &str) -> Result<XmlElement, DecodeError> {
    use winnow::Parser;
    grammar::parse_document
        .parse(input)
        .map_err(|e| DecodeError::new(e.to_string()))
}
