/// A node in a decoded XML element tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    /// Character data with entities resolved. CDATA sections become text too.
    Text(String),
}

/// An XML element with its attributes in document order.
///
/// Names are kept as written, including any namespace prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// The element name without its namespace prefix.
    #[must_use]
    pub fn local_name(&self) -> &str {
        local(&self.name)
    }

    /// Value of the attribute whose (local) name is `name`.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name || local(n) == name)
            .map(|(_, v)| v.as_str())
    }

    /// Direct child elements.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// Concatenated direct text content, trimmed.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            if let XmlNode::Text(t) = node {
                out.push_str(t);
            }
        }
        out.trim().to_owned()
    }

    /// All elements below this one, depth-first in document order.
    #[must_use]
    pub fn descendants(&self) -> Vec<&XmlElement> {
        let mut out = Vec::new();
        collect_descendants(self, &mut out);
        out
    }
}

fn collect_descendants<'a>(element: &'a XmlElement, out: &mut Vec<&'a XmlElement>) {
    for child in element.child_elements() {
        out.push(child);
        collect_descendants(child, out);
    }
}

fn local(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, l)| l)
}
