use crate::error::{DbError, DbResult};
use crate::schema::{TableRows, Tables};

/// Leading bytes of every serialized database image.
pub const IMAGE_MAGIC: &[u8; 4] = b"HKDB";

/// Current image layout version.
pub const SCHEMA_VERSION: u16 = 1;

/// Header size: 4 bytes magic + 2 bytes version + 4 bytes CRC.
const HEADER_SIZE: usize = 10;

/// Serialize every table into a framed image.
///
/// Format:
/// ```text
/// [4 bytes: "HKDB"]
/// [2 bytes: schema version (little-endian u16)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized rows)]
/// ```
pub fn encode(tables: &Tables) -> DbResult<Vec<u8>> {
    let payload = bincode::serialize(&tables.to_rows())
        .map_err(|e| DbError::Serialization(e.to_string()))?;
    let crc = crc32fast::hash(&payload);

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(IMAGE_MAGIC);
    buf.extend_from_slice(&SCHEMA_VERSION.to_le_bytes());
    buf.extend_from_slice(&crc.to_le_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Parse a framed image, verify its checksum, and rebuild the tables with
/// every constraint re-checked.
pub fn decode(bytes: &[u8]) -> DbResult<Tables> {
    if bytes.len() < HEADER_SIZE {
        return Err(DbError::CorruptImage(format!(
            "image is {} bytes, shorter than the {HEADER_SIZE}-byte header",
            bytes.len()
        )));
    }
    if &bytes[..4] != IMAGE_MAGIC {
        return Err(DbError::CorruptImage("bad magic".into()));
    }
    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != SCHEMA_VERSION {
        return Err(DbError::CorruptImage(format!(
            "unsupported schema version {version}"
        )));
    }
    let expected = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]);
    let payload = &bytes[HEADER_SIZE..];
    let actual = crc32fast::hash(payload);
    if actual != expected {
        return Err(DbError::CorruptImage(format!(
            "checksum mismatch: expected {expected:08x}, got {actual:08x}"
        )));
    }

    let rows: TableRows =
        bincode::deserialize(payload).map_err(|e| DbError::CorruptImage(e.to_string()))?;
    Tables::from_rows(rows).map_err(|e| DbError::CorruptImage(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::UserRow;
    use hk_types::{Role, Timestamp, UserId};

    fn tables() -> Tables {
        let mut t = Tables::new();
        t.insert_user(UserRow {
            id: UserId::new(),
            username: "admin".into(),
            password: "secret".into(),
            xp: 250,
            role: Role::Admin,
            last_login: Timestamp::now(),
        })
        .unwrap();
        t
    }

    #[test]
    fn encode_then_decode_preserves_rows() {
        let t = tables();
        let bytes = encode(&t).unwrap();
        assert_eq!(&bytes[..4], IMAGE_MAGIC);
        let back = decode(&bytes).unwrap();
        assert_eq!(back.to_rows(), t.to_rows());
    }

    #[test]
    fn empty_tables_encode() {
        let bytes = encode(&Tables::new()).unwrap();
        let back = decode(&bytes).unwrap();
        assert_eq!(back.row_counts(), (0, 0, 0));
    }

    #[test]
    fn truncated_image_rejected() {
        let err = decode(b"HKDB").unwrap_err();
        assert!(matches!(err, DbError::CorruptImage(_)));
    }

    #[test]
    fn wrong_magic_rejected() {
        let mut bytes = encode(&tables()).unwrap();
        bytes[0] = b'X';
        assert!(matches!(decode(&bytes), Err(DbError::CorruptImage(_))));
    }

    #[test]
    fn flipped_payload_bit_rejected() {
        let mut bytes = encode(&tables()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let err = decode(&bytes).unwrap_err();
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn future_version_rejected() {
        let mut bytes = encode(&tables()).unwrap();
        bytes[4..6].copy_from_slice(&(SCHEMA_VERSION + 1).to_le_bytes());
        let err = decode(&bytes).unwrap_err();
        assert!(err.to_string().contains("schema version"));
    }
}
