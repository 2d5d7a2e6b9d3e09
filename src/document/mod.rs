//! A minimal element tree for ChannelML documents along with typed attribute readers
//! and an adapter from XML text.

use std::{
    collections::HashMap,
    fs::read_to_string,
    path::Path,
};
use crate::error::ConfigurationError;


/// A document element with string attributes and ordered child elements,
/// namespaces are stripped from element names
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    /// Local name of the element
    pub name: String,
    /// Attributes keyed by local name
    pub attributes: HashMap<String, String>,
    /// Child elements in document order
    pub children: Vec<Element>,
}

impl Element {
    /// Creates an element with no attributes or children
    pub fn new(name: &str) -> Self {
        Element {
            name: String::from(name),
            attributes: HashMap::new(),
            children: vec![],
        }
    }

    /// Adds an attribute, returning the element
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(String::from(name), String::from(value));

        self
    }

    /// Appends a child element, returning the element
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);

        self
    }

    /// Parses XML text, ignoring comments, text nodes and namespaces
    pub fn from_xml(text: &str) -> Result<Self, ConfigurationError> {
        let document = roxmltree::Document::parse(text)
            .map_err(|e| ConfigurationError::MalformedDocument(e.to_string()))?;

        Ok(Element::from_node(&document.root_element()))
    }

    fn from_node(node: &roxmltree::Node) -> Self {
        let attributes = node.attributes()
            .map(|attr| (String::from(attr.name()), String::from(attr.value())))
            .collect();

        let children = node.children()
            .filter(|child| child.is_element())
            .map(|child| Element::from_node(&child))
            .collect();

        Element {
            name: String::from(node.tag_name().name()),
            attributes,
            children,
        }
    }

    /// Returns the attribute value if present
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|value| value.as_str())
    }

    /// Returns whether the attribute is present
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Returns the attribute value or a [`ConfigurationError::MissingAttribute`]
    pub fn required_attribute(&self, name: &str) -> Result<&str, ConfigurationError> {
        self.attribute(name).ok_or_else(|| ConfigurationError::MissingAttribute {
            element: self.name.clone(),
            attribute: String::from(name),
        })
    }

    /// Parses a required attribute as a float
    pub fn parse_f64(&self, name: &str) -> Result<f64, ConfigurationError> {
        parse_number(name, self.required_attribute(name)?)
    }

    /// Parses an attribute as a float if it is present
    pub fn parse_optional_f64(&self, name: &str) -> Result<Option<f64>, ConfigurationError> {
        self.attribute(name)
            .map(|value| parse_number(name, value))
            .transpose()
    }

    /// Parses a required attribute as an unsigned integer
    pub fn parse_usize(&self, name: &str) -> Result<usize, ConfigurationError> {
        let value = self.required_attribute(name)?;

        value.trim()
            .parse::<usize>()
            .map_err(|_| ConfigurationError::InvalidNumber {
                attribute: String::from(name),
                value: String::from(value),
            })
    }

    /// First direct child with the given name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    /// First direct child with the given name or a [`ConfigurationError::MissingElement`]
    pub fn required_child(&self, name: &str) -> Result<&Element, ConfigurationError> {
        self.child(name).ok_or_else(|| ConfigurationError::MissingElement {
            parent: self.name.clone(),
            element: String::from(name),
        })
    }

    /// All direct children with the given name in document order
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// All descendants (excluding the element itself) with the given name in document order
    pub fn descendants_named(&self, name: &str) -> Vec<&Element> {
        let mut found = vec![];
        self.collect_descendants(name, &mut found);

        found
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        for child in &self.children {
            if child.name == name {
                found.push(child);
            }
            child.collect_descendants(name, found);
        }
    }
}

fn parse_number(name: &str, value: &str) -> Result<f64, ConfigurationError> {
    value.trim()
        .parse::<f64>()
        .map_err(|_| ConfigurationError::InvalidNumber {
            attribute: String::from(name),
            value: String::from(value),
        })
}

/// Reads and parses an XML document from disk
pub fn read_document<P: AsRef<Path>>(path: P) -> Result<Element, ConfigurationError> {
    let text = read_to_string(path.as_ref())
        .map_err(|e| ConfigurationError::MalformedDocument(
            format!("{}: {}", path.as_ref().display(), e)
        ))?;

    Element::from_xml(&text)
}
