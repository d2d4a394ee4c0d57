use std::sync::Arc;

/// Numeric code of the Internet class.
pub const DNS_CLASS_IN: u16 = 1;

/// A single DNS question as seen by the route resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteQuery {
    /// Query name without the trailing root dot, original case preserved.
    pub name: Arc<str>,
    pub class: u16,
    pub record_type: u16,
}

impl RouteQuery {
    pub fn new(name: impl Into<Arc<str>>, class: u16, record_type: u16) -> Self {
        Self {
            name: name.into(),
            class,
            record_type,
        }
    }

    /// Shorthand for an Internet-class question.
    pub fn internet(name: impl Into<Arc<str>>, record_type: u16) -> Self {
        Self::new(name, DNS_CLASS_IN, record_type)
    }
}
