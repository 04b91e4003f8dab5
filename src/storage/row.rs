//! Fixed-schema row codec: id + username + email, packed to a constant width.
use crate::err;
use crate::errors::Error;
use std::fmt;

pub const ID_SIZE: usize = 4;
pub const USERNAME_SIZE: usize = 32;
pub const EMAIL_SIZE: usize = 255;
pub const ROW_SIZE: usize = ID_SIZE + USERNAME_SIZE + EMAIL_SIZE;

pub const ID_OFFSET: usize = 0;
pub const USERNAME_OFFSET: usize = ID_OFFSET + ID_SIZE;
pub const EMAIL_OFFSET: usize = USERNAME_OFFSET + USERNAME_SIZE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: u32,
    pub username: String,
    pub email: String,
}

fn check_field(name: &str, value: &str, max_len: usize) -> Result<(), Error> {
    if value.len() > max_len {
        return Err(err!(
            InvalidField,
            "{} must be at most {} bytes, got {}",
            name,
            max_len,
            value.len()
        ));
    }
    if !value.bytes().all(|b| b.is_ascii()) {
        return Err(err!(InvalidField, "{} must be ASCII", name));
    }
    Ok(())
}

impl Row {
    pub fn new(id: u32, username: &str, email: &str) -> Result<Self, Error> {
        check_field("username", username, USERNAME_SIZE)?;
        check_field("email", email, EMAIL_SIZE)?;
        Ok(Row {
            id,
            username: username.to_string(),
            email: email.to_string(),
        })
    }

    pub fn serialize(&self) -> [u8; ROW_SIZE] {
        let mut buf = [0u8; ROW_SIZE];
        buf[ID_OFFSET..ID_OFFSET + ID_SIZE].copy_from_slice(&self.id.to_le_bytes());

        let username_bytes = self.username.as_bytes();
        buf[USERNAME_OFFSET..USERNAME_OFFSET + username_bytes.len()]
            .copy_from_slice(username_bytes);

        let email_bytes = self.email.as_bytes();
        buf[EMAIL_OFFSET..EMAIL_OFFSET + email_bytes.len()].copy_from_slice(email_bytes);

        buf
    }

    pub fn deserialize(buf: &[u8]) -> Self {
        let mut id_bytes = [0u8; ID_SIZE];
        id_bytes.copy_from_slice(&buf[ID_OFFSET..ID_OFFSET + ID_SIZE]);
        let id = u32::from_le_bytes(id_bytes);

        let username = trim_nul(&buf[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE]);
        let email = trim_nul(&buf[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE]);

        Row {
            id,
            username,
            email,
        }
    }
}

fn trim_nul(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username, self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_serialize_deserialize() {
        let row = Row::new(33, "test", "testtesterson@gmail.com").unwrap();
        let buf = row.serialize();
        assert_eq!(Row::deserialize(&buf), row);
    }

    #[test]
    fn accepts_fields_at_the_size_boundary() {
        let username = "a".repeat(USERNAME_SIZE);
        let email = "b".repeat(EMAIL_SIZE);
        assert!(Row::new(1, &username, &email).is_ok());
    }

    #[test]
    fn rejects_fields_one_byte_over_the_boundary() {
        let username = "a".repeat(USERNAME_SIZE + 1);
        assert!(matches!(
            Row::new(1, &username, "e"),
            Err(Error::InvalidField(_))
        ));

        let email = "b".repeat(EMAIL_SIZE + 1);
        assert!(matches!(
            Row::new(1, "u", &email),
            Err(Error::InvalidField(_))
        ));
    }

    #[test]
    fn rejects_non_ascii_bytes() {
        assert!(matches!(
            Row::new(1, "tèst", "e@x"),
            Err(Error::InvalidField(_))
        ));
    }

    #[test]
    fn display_matches_the_repl_tuple_form() {
        let row = Row::new(33, "test", "testtesterson@gmail.com").unwrap();
        assert_eq!(row.to_string(), "(33, test, testtesterson@gmail.com)");
    }
}
