use bytes::{Buf, BufMut};
use commonware_codec::{Error, ReadExt, Write};

/// Writes a string as length-prefixed UTF-8 bytes.
pub fn write_string(s: &str, writer: &mut impl BufMut) {
    let bytes = s.as_bytes();
    (bytes.len() as u32).write(writer);
    writer.put_slice(bytes);
}

/// Reads a length-prefixed UTF-8 string, rejecting anything longer than `max_len` bytes.
pub fn read_string(reader: &mut impl Buf, max_len: usize) -> Result<String, Error> {
    let len = u32::read(reader)? as usize;
    if len > max_len {
        return Err(Error::Invalid("String", "too long"));
    }
    if reader.remaining() < len {
        return Err(Error::EndOfBuffer);
    }
    let mut bytes = vec![0u8; len];
    reader.copy_to_slice(&mut bytes);
    String::from_utf8(bytes).map_err(|_| Error::Invalid("String", "invalid UTF-8"))
}

pub fn string_encode_size(s: &str) -> usize {
    4 + s.len()
}

/// Writes an optional string as a presence flag followed by the string.
pub fn write_opt_string(s: &Option<String>, writer: &mut impl BufMut) {
    match s {
        Some(value) => {
            true.write(writer);
            write_string(value, writer);
        }
        None => false.write(writer),
    }
}

pub fn read_opt_string(reader: &mut impl Buf, max_len: usize) -> Result<Option<String>, Error> {
    if bool::read(reader)? {
        Ok(Some(read_string(reader, max_len)?))
    } else {
        Ok(None)
    }
}

pub fn opt_string_encode_size(s: &Option<String>) -> usize {
    1 + s.as_deref().map(string_encode_size).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn read_string_rejects_too_long() {
        let mut buf = BytesMut::new();
        write_string("hello", &mut buf);

        let mut reader = buf.as_ref();
        let err = read_string(&mut reader, 4).expect_err("should reject too-long string");
        assert!(matches!(err, Error::Invalid("String", "too long")));
    }

    #[test]
    fn read_string_rejects_truncated_buffers() {
        let mut buf = BytesMut::new();
        (10u32).write(&mut buf);
        buf.extend_from_slice(b"short");

        let mut reader = buf.as_ref();
        let err = read_string(&mut reader, 64).expect_err("should reject truncated string");
        assert!(matches!(err, Error::EndOfBuffer));
    }

    #[test]
    fn read_string_rejects_invalid_utf8() {
        let mut buf = BytesMut::new();
        (2u32).write(&mut buf);
        buf.extend_from_slice(&[0xff, 0xfe]);

        let mut reader = buf.as_ref();
        let err = read_string(&mut reader, 64).expect_err("should reject invalid utf-8");
        assert!(matches!(err, Error::Invalid("String", "invalid UTF-8")));
    }

    #[test]
    fn optional_string_size_matches_encoding() {
        for value in [None, Some(String::new()), Some("night_owl".to_string())] {
            let mut buf = BytesMut::new();
            write_opt_string(&value, &mut buf);
            assert_eq!(buf.len(), opt_string_encode_size(&value));

            let mut reader = buf.as_ref();
            assert_eq!(read_opt_string(&mut reader, 64).unwrap(), value);
            assert!(reader.is_empty());
        }
    }
}
