use crate::dom::NodeId;
use indexmap::IndexMap;

/// Element payload of a tree node
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Lowercase tag name (e.g., "div", "button", "input")
    pub tag_name: String,

    /// Element attributes in source order
    pub attributes: IndexMap<String, String>,

    /// Live checkedness, seeded from the `checked` attribute
    pub checked: bool,

    /// Live value, seeded from the `value` attribute
    pub value: String,

    /// Encapsulated subtree hosted by this element
    pub shadow_root: Option<NodeId>,
}

impl ElementData {
    /// Create a new element with no attributes
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into().to_ascii_lowercase(),
            attributes: IndexMap::new(),
            checked: false,
            value: String::new(),
            shadow_root: None,
        }
    }

    /// Builder method: set attributes, seeding live properties from them
    pub fn with_attributes(mut self, attributes: IndexMap<String, String>) -> Self {
        self.checked = attributes.contains_key("checked");
        self.value = attributes.get("value").cloned().unwrap_or_default();
        self.attributes = attributes;
        self
    }

    /// Builder method: add a single attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Set an attribute; names are case-insensitive
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into().to_ascii_lowercase();
        let value = value.into();
        match key.as_str() {
            "checked" => self.checked = true,
            "value" => self.value = value.clone(),
            _ => {}
        }
        self.attributes.insert(key, value);
    }

    /// Remove an attribute, returning its old value
    pub fn remove_attribute(&mut self, key: &str) -> Option<String> {
        self.attributes.shift_remove(&key.to_ascii_lowercase())
    }

    /// Get attribute value by key
    pub fn get_attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Get element ID
    pub fn id(&self) -> Option<&str> {
        self.get_attribute("id").filter(|id| !id.is_empty())
    }

    /// Check if element is a specific tag
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }

    /// Lowercased `type` attribute, empty when absent
    pub fn input_type(&self) -> String {
        self.get_attribute("type").unwrap_or_default().to_ascii_lowercase()
    }

    /// Labelable elements per HTML: buttons, selects, textareas and non-hidden inputs
    pub fn is_labelable(&self) -> bool {
        match self.tag_name.as_str() {
            "input" => self.input_type() != "hidden",
            "button" | "select" | "textarea" | "meter" | "output" | "progress" => true,
            _ => false,
        }
    }
}
