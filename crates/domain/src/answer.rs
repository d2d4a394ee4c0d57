use crate::record_value::RecordValue;
use std::fmt;
use std::sync::Arc;

/// One synthesized resource record, ready for the wire layer.
#[derive(Clone)]
pub struct AnswerRecord {
    pub name: Arc<str>,
    pub record_type: u16,
    pub class: u16,
    pub ttl: u32,
    pub value: Arc<dyn RecordValue>,
}

impl AnswerRecord {
    pub fn new(
        name: Arc<str>,
        record_type: u16,
        class: u16,
        ttl: u32,
        value: Arc<dyn RecordValue>,
    ) -> Self {
        Self {
            name,
            record_type,
            class,
            ttl,
            value,
        }
    }
}

impl fmt::Debug for AnswerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnswerRecord")
            .field("name", &self.name)
            .field("record_type", &self.record_type)
            .field("class", &self.class)
            .field("ttl", &self.ttl)
            .field("value", &self.value.to_string())
            .finish()
    }
}
