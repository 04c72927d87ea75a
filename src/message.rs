//! In-memory DNS message model.
//!
//! A [`Message`] is either parsed from wire bytes (header flags copied
//! verbatim) or constructed fresh with an id and grown through the add
//! operations. Section counts are never stored; they are derived from the
//! list lengths at serialization time.

use std::fmt;

use crate::records::ResourceRecord;

/// QR bit of the flags field: 0 = query, 1 = response.
pub const FLAG_QR: u16 = 0x8000;

/// 4-bit opcode values.
pub mod opcode {
    pub const QUERY: u8 = 0;
    pub const IQUERY: u8 = 1;
    pub const STATUS: u8 = 2;
    pub const NOTIFY: u8 = 4;
    pub const UPDATE: u8 = 5;
}

/// 4-bit response code values.
pub mod rcode {
    pub const OK: u8 = 0;
    pub const FORMAT_ERROR: u8 = 1;
    pub const SERVER_FAILURE: u8 = 2;
    pub const NAME_ERROR: u8 = 3;
    pub const NOT_IMPLEMENTED: u8 = 4;
    pub const REFUSED: u8 = 5;
}

/// One entry of the question section, and the cache key.
///
/// Equality and hashing are structural over all three fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Question {
    pub name: String,
    pub qtype: u16,
    pub qclass: u16,
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Name({}) Type({}) Class({})",
            self.name, self.qtype, self.qclass
        )
    }
}

/// A DNS message: header fields plus the question and answer sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: u16,
    pub flags: u16,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
}

impl Message {
    /// Create a fresh query message with empty sections.
    pub fn new(id: u16) -> Self {
        Self {
            id,
            flags: 0,
            questions: Vec::new(),
            answers: Vec::new(),
        }
    }

    /// Append a question to the question section.
    pub fn add_question(&mut self, question: Question) {
        self.questions.push(question);
    }

    /// Append a resource record to the answer section.
    pub fn add_answer(&mut self, answer: ResourceRecord) {
        self.answers.push(answer);
    }

    /// Whether the QR bit marks this message as a response.
    pub fn is_response(&self) -> bool {
        self.flags & FLAG_QR != 0
    }

    /// The 4-bit opcode.
    pub fn opcode(&self) -> u8 {
        ((self.flags >> 11) & 0x0f) as u8
    }

    /// The 4-bit response code.
    pub fn rcode(&self) -> u8 {
        (self.flags & 0x0f) as u8
    }

    /// Mark this message as a response by setting the QR bit.
    pub fn set_response(&mut self) {
        self.flags |= FLAG_QR;
    }

    /// OR a response code into the flags field.
    pub fn set_rcode(&mut self, rcode: u8) {
        self.flags |= (rcode & 0x0f) as u16;
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id=0x{:04x} qr={} opcode={} rcode={}",
            self.id,
            if self.is_response() { 1 } else { 0 },
            self.opcode(),
            self.rcode()
        )?;
        for q in &self.questions {
            write!(f, " Query[{}]", q)?;
        }
        for a in &self.answers {
            write!(f, " Answer[{}]", a)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_subfields_are_extracted() {
        // Standard query with RD set.
        let mut msg = Message::new(0xf9c1);
        msg.flags = 0x0100;
        assert!(!msg.is_response());
        assert_eq!(msg.opcode(), opcode::QUERY);
        assert_eq!(msg.rcode(), rcode::OK);

        // Opcode update, rcode refused.
        msg.flags = ((opcode::UPDATE as u16) << 11) | rcode::REFUSED as u16;
        assert_eq!(msg.opcode(), opcode::UPDATE);
        assert_eq!(msg.rcode(), rcode::REFUSED);
    }

    #[test]
    fn setters_or_bits_in() {
        let mut msg = Message::new(1);
        msg.flags = 0x0100;
        msg.set_response();
        msg.set_rcode(rcode::NOT_IMPLEMENTED);
        assert_eq!(msg.flags, 0x8104);
        assert!(msg.is_response());
        assert_eq!(msg.rcode(), rcode::NOT_IMPLEMENTED);
    }

    #[test]
    fn fresh_message_starts_empty() {
        let msg = Message::new(0x0111);
        assert_eq!(msg.flags, 0);
        assert!(msg.questions.is_empty());
        assert!(msg.answers.is_empty());
    }
}
