//! DNS wire-format codec.
//!
//! Bounds-checked conversion between raw byte buffers and the in-memory
//! [`Message`](crate::message::Message) model, including compression-pointer
//! resolution when decoding domain names. Encoding always writes full,
//! uncompressed label sequences.

use std::str;

use crate::errors::DnsError;
use crate::message::{Message, Question};
use crate::records::{RecordData, ResourceRecord};

/// Size of the fixed DNS message header in bytes.
pub const HEADER_LEN: usize = 12;

/// Maximum length of an encoded domain name in octets.
pub const MAX_NAME_LEN: usize = 255;

/// Maximum length of a single label in octets.
pub const MAX_LABEL_LEN: usize = 63;

/// Upper bound on compression-pointer redirections within one name.
const MAX_POINTER_JUMPS: usize = 16;

/// Top-two-bits mask distinguishing a label length from a pointer.
const PTR_MASK: u8 = 0xC0;

/// A reading cursor over an immutable byte buffer.
///
/// Carries the whole buffer rather than a slice tail so that compression
/// pointers can redirect to earlier absolute offsets.
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor positioned at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current absolute offset into the buffer.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    fn underrun(&self, needed: usize) -> DnsError {
        DnsError::TruncatedBuffer {
            offset: self.pos,
            needed,
        }
    }

    /// Read a single byte, advancing the cursor.
    pub fn read_u8(&mut self) -> Result<u8, DnsError> {
        let b = *self.buf.get(self.pos).ok_or_else(|| self.underrun(1))?;
        self.pos += 1;
        Ok(b)
    }

    /// Read a big-endian u16, advancing the cursor.
    pub fn read_u16(&mut self) -> Result<u16, DnsError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Read a big-endian u32, advancing the cursor.
    pub fn read_u32(&mut self) -> Result<u32, DnsError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read `len` raw bytes, advancing the cursor.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DnsError> {
        if self.remaining() < len {
            return Err(self.underrun(len - self.remaining()));
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Move the cursor to an absolute offset within the buffer.
    fn seek(&mut self, pos: usize) -> Result<(), DnsError> {
        if pos > self.buf.len() {
            return Err(DnsError::TruncatedBuffer {
                offset: self.pos,
                needed: pos - self.buf.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Decode a domain name at the current position.
    ///
    /// Handles length-prefixed labels terminated by a zero byte, and
    /// compression pointers (a length byte with the top two bits set,
    /// followed by the low 8 bits of a 14-bit absolute offset). After the
    /// first pointer the cursor is restored to just past the 2-byte
    /// pointer once the redirected chain terminates. Redirections are
    /// bounded so a cyclic chain fails instead of looping.
    pub fn read_name(&mut self) -> Result<String, DnsError> {
        let mut name = String::new();
        let mut wire_octets = 1usize; // terminating zero byte
        let mut jumps = 0usize;
        let mut return_pos: Option<usize> = None;

        loop {
            let len = self.read_u8()?;
            match len & PTR_MASK {
                0x00 => {
                    if len == 0 {
                        break;
                    }
                    wire_octets += 1 + len as usize;
                    if wire_octets > MAX_NAME_LEN {
                        return Err(DnsError::NameTooLong);
                    }
                    let raw = self.read_bytes(len as usize)?;
                    let label = str::from_utf8(raw).map_err(|_| {
                        DnsError::MalformedName("label is not valid UTF-8".into())
                    })?;
                    if !name.is_empty() {
                        name.push('.');
                    }
                    name.push_str(label);
                }
                0xC0 => {
                    let low = self.read_u8()?;
                    let target = (((len & !PTR_MASK) as usize) << 8) | low as usize;
                    if target >= self.buf.len() {
                        return Err(DnsError::MalformedName(format!(
                            "compression pointer to offset {} past end of buffer",
                            target
                        )));
                    }
                    jumps += 1;
                    if jumps > MAX_POINTER_JUMPS {
                        return Err(DnsError::MalformedName(
                            "compression pointer chain too long".into(),
                        ));
                    }
                    if return_pos.is_none() {
                        return_pos = Some(self.pos);
                    }
                    self.pos = target;
                }
                _ => {
                    return Err(DnsError::MalformedName(format!(
                        "invalid label length tag 0x{:02x}",
                        len
                    )));
                }
            }
        }

        if let Some(pos) = return_pos {
            self.pos = pos;
        }
        Ok(name)
    }
}

/// Append a big-endian u16 to `out`.
pub fn write_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Append a big-endian u32 to `out`.
pub fn write_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Append a domain name in wire format.
///
/// Always writes the full label sequence; compression on encode is not
/// required for correctness, only on decode.
pub fn write_name(out: &mut Vec<u8>, name: &str) {
    for label in name.trim_end_matches('.').split('.') {
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            continue; // skip invalid labels
        }
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
}

/// Decode one question at the cursor.
pub fn read_question(cur: &mut Cursor) -> Result<Question, DnsError> {
    let name = cur.read_name()?;
    let qtype = cur.read_u16()?;
    let qclass = cur.read_u16()?;
    Ok(Question {
        name,
        qtype,
        qclass,
    })
}

/// Decode one resource record at the cursor.
///
/// Dispatches on the record type for the payload; an unrecognized type
/// yields an opaque record rather than failing the whole message. The
/// declared rdata length always governs where the next record begins.
pub fn read_record(cur: &mut Cursor) -> Result<ResourceRecord, DnsError> {
    let name = cur.read_name()?;
    let rtype = cur.read_u16()?;
    let rclass = cur.read_u16()?;
    let ttl = cur.read_u32()?;
    let rdlength = cur.read_u16()?;
    let rdata_start = cur.pos();
    let data = RecordData::decode(rtype, cur, rdlength)?;
    cur.seek(rdata_start + rdlength as usize)?;
    Ok(ResourceRecord {
        name,
        rtype,
        rclass,
        ttl,
        data,
    })
}

fn read_message_inner(buf: &[u8]) -> Result<Message, DnsError> {
    let mut cur = Cursor::new(buf);

    let id = cur.read_u16()?;
    let flags = cur.read_u16()?;
    let qdcount = cur.read_u16()?;
    let ancount = cur.read_u16()?;
    let nscount = cur.read_u16()?;
    let arcount = cur.read_u16()?;

    let mut msg = Message {
        id,
        flags,
        questions: Vec::with_capacity(qdcount as usize),
        answers: Vec::with_capacity(ancount as usize),
    };

    for _ in 0..qdcount {
        msg.questions.push(read_question(&mut cur)?);
    }
    for _ in 0..ancount {
        msg.answers.push(read_record(&mut cur)?);
    }
    // Authority and additional sections are read past but not modeled.
    for _ in 0..(nscount as u32 + arcount as u32) {
        read_record(&mut cur)?;
    }

    Ok(msg)
}

/// Decode a whole DNS message from `buf`.
///
/// # Arguments
/// * `buf` - The raw datagram bytes.
///
/// # Returns
/// A `Result` containing the decoded [`Message`], or `MalformedMessage`
/// when any nested read fails.
pub fn read_message(buf: &[u8]) -> Result<Message, DnsError> {
    read_message_inner(buf).map_err(|e| match e {
        DnsError::MalformedMessage(_) => e,
        other => DnsError::MalformedMessage(other.to_string()),
    })
}

/// Encode a [`Message`] into wire format.
///
/// Question and answer counts in the header are derived from the list
/// lengths; each record's rdata length is computed from the payload being
/// written, never read from the message.
pub fn encode_message(msg: &Message) -> Vec<u8> {
    let mut out = Vec::with_capacity(512);

    write_u16(&mut out, msg.id);
    write_u16(&mut out, msg.flags);
    write_u16(&mut out, msg.questions.len() as u16);
    write_u16(&mut out, msg.answers.len() as u16);
    write_u16(&mut out, 0); // authority
    write_u16(&mut out, 0); // additional

    for question in &msg.questions {
        write_name(&mut out, &question.name);
        write_u16(&mut out, question.qtype);
        write_u16(&mut out, question.qclass);
    }

    for answer in &msg.answers {
        write_name(&mut out, &answer.name);
        write_u16(&mut out, answer.rtype);
        write_u16(&mut out, answer.rclass);
        write_u32(&mut out, answer.ttl);
        answer.data.encode(&mut out);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{rtype, CLASS_IN};
    use std::net::Ipv4Addr;

    /// Standard query for www.facebook.com, type A, class IN.
    const QUERY_FACEBOOK: &[u8] = &[
        0xf9, 0xc1, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x77,
        0x77, 0x77, 0x08, 0x66, 0x61, 0x63, 0x65, 0x62, 0x6f, 0x6f, 0x6b, 0x03, 0x63, 0x6f,
        0x6d, 0x00, 0x00, 0x01, 0x00, 0x01,
    ];

    /// Response with a CNAME answer and an A answer whose name is a
    /// compression pointer into the CNAME's rdata.
    const RESPONSE_FACEBOOK: &[u8] = &[
        0xf9, 0xc1, 0x81, 0x80, 0x00, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x03, 0x77,
        0x77, 0x77, 0x08, 0x66, 0x61, 0x63, 0x65, 0x62, 0x6f, 0x6f, 0x6b, 0x03, 0x63, 0x6f,
        0x6d, 0x00, 0x00, 0x01, 0x00, 0x01, 0xc0, 0x0c, 0x00, 0x05, 0x00, 0x01, 0x00, 0x00,
        0x0c, 0xa6, 0x00, 0x11, 0x09, 0x73, 0x74, 0x61, 0x72, 0x2d, 0x6d, 0x69, 0x6e, 0x69,
        0x04, 0x63, 0x31, 0x30, 0x72, 0xc0, 0x10, 0xc0, 0x2e, 0x00, 0x01, 0x00, 0x01, 0x00,
        0x00, 0x00, 0x15, 0x00, 0x04, 0x9d, 0xf0, 0x0e, 0x23,
    ];

    #[test]
    fn decodes_plain_query() {
        let msg = read_message(QUERY_FACEBOOK).unwrap();
        assert_eq!(msg.id, 0xf9c1);
        assert_eq!(msg.questions.len(), 1);
        assert_eq!(msg.answers.len(), 0);
        let q = &msg.questions[0];
        assert_eq!(q.name, "www.facebook.com");
        assert_eq!(q.qtype, rtype::A);
        assert_eq!(q.qclass, CLASS_IN);
    }

    #[test]
    fn decodes_independently_constructed_query() {
        let mut msg = Message::new(0x0111);
        msg.add_question(Question {
            name: "www.site1.com".into(),
            qtype: rtype::A,
            qclass: CLASS_IN,
        });
        let wire = encode_message(&msg);
        let decoded = read_message(&wire).unwrap();
        assert_eq!(decoded.id, 0x0111);
        assert_eq!(decoded.questions[0].name, "www.site1.com");
    }

    #[test]
    fn decodes_compressed_answer_names() {
        let msg = read_message(RESPONSE_FACEBOOK).unwrap();
        assert_eq!(msg.id, 0xf9c1);
        assert_eq!(msg.answers.len(), 2);

        let cname = &msg.answers[0];
        assert_eq!(cname.name, "www.facebook.com");
        assert_eq!(cname.rtype, rtype::CNAME);
        assert_eq!(cname.ttl, 3238);
        assert_eq!(
            cname.data,
            RecordData::Cname("star-mini.c10r.facebook.com".into())
        );

        // The second answer's name is a pointer into the first answer's
        // rdata and must decode to the identical string.
        let a = &msg.answers[1];
        assert_eq!(a.name, "star-mini.c10r.facebook.com");
        assert_eq!(a.rtype, rtype::A);
        assert_eq!(a.ttl, 21);
        assert_eq!(a.data, RecordData::A(Ipv4Addr::new(157, 240, 14, 35)));
    }

    #[test]
    fn compressed_names_survive_reencoding() {
        let msg = read_message(RESPONSE_FACEBOOK).unwrap();
        let wire = encode_message(&msg);
        let again = read_message(&wire).unwrap();
        assert_eq!(again, msg);
        assert_eq!(again.answers[1].name, msg.answers[1].name);
    }

    #[test]
    fn round_trips_constructed_message() {
        let mut msg = Message::new(0x0222);
        msg.add_question(Question {
            name: "www.site2.com".into(),
            qtype: rtype::CNAME,
            qclass: CLASS_IN,
        });
        msg.add_answer(ResourceRecord {
            name: "www.site2.com".into(),
            rtype: rtype::CNAME,
            rclass: CLASS_IN,
            ttl: 60,
            data: RecordData::Cname("alias.s01.site2.com".into()),
        });
        msg.add_answer(ResourceRecord {
            name: "alias.s01.site2.com".into(),
            rtype: rtype::A,
            rclass: CLASS_IN,
            ttl: 60,
            data: RecordData::A(Ipv4Addr::new(192, 168, 1, 1)),
        });
        msg.set_response();

        let decoded = read_message(&encode_message(&msg)).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn unknown_record_type_decodes_as_raw() {
        let mut msg = Message::new(0x0333);
        msg.add_answer(ResourceRecord {
            name: "example.com".into(),
            rtype: rtype::TXT,
            rclass: CLASS_IN,
            ttl: 30,
            data: RecordData::Raw(vec![0x04, b't', b'e', b's', b't']),
        });
        let decoded = read_message(&encode_message(&msg)).unwrap();
        assert_eq!(decoded.answers[0].data, msg.answers[0].data);
    }

    #[test]
    fn pointer_cycle_is_rejected() {
        // Pointer at offset 12 redirecting to itself.
        let mut buf = vec![
            0x00, 0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        buf.extend_from_slice(&[0xc0, 0x0c, 0x00, 0x01, 0x00, 0x01]);
        match read_message(&buf) {
            Err(DnsError::MalformedMessage(_)) => {}
            other => panic!("expected MalformedMessage, got {:?}", other),
        }
    }

    #[test]
    fn pointer_cycle_in_name_is_rejected() {
        let buf = [0xc0, 0x00];
        let mut cur = Cursor::new(&buf);
        match cur.read_name() {
            Err(DnsError::MalformedName(_)) => {}
            other => panic!("expected MalformedName, got {:?}", other),
        }
    }

    #[test]
    fn invalid_label_tag_is_rejected() {
        // 0x40 sets a reserved top-two-bit pattern.
        let buf = [0x40, 0x00];
        let mut cur = Cursor::new(&buf);
        assert!(matches!(cur.read_name(), Err(DnsError::MalformedName(_))));
    }

    #[test]
    fn overlong_name_is_rejected() {
        let mut buf = Vec::new();
        for _ in 0..4 {
            buf.push(63);
            buf.extend_from_slice(&[b'a'; 63]);
        }
        buf.push(0);
        let mut cur = Cursor::new(&buf);
        assert!(matches!(cur.read_name(), Err(DnsError::NameTooLong)));
    }

    #[test]
    fn truncated_header_is_rejected() {
        assert!(matches!(
            read_message(&[0xf9, 0xc1, 0x01]),
            Err(DnsError::MalformedMessage(_))
        ));
    }

    #[test]
    fn truncated_question_is_rejected() {
        // Header claims one question but the name never terminates.
        let buf = [
            0x00, 0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03,
            0x77, 0x77,
        ];
        assert!(matches!(
            read_message(&buf),
            Err(DnsError::MalformedMessage(_))
        ));
    }

    #[test]
    fn cursor_reads_are_bounds_checked() {
        let mut cur = Cursor::new(&[0x01]);
        assert_eq!(cur.read_u8().unwrap(), 0x01);
        assert!(matches!(
            cur.read_u16(),
            Err(DnsError::TruncatedBuffer { .. })
        ));
    }
}
