//! The session token stored inside the auth cookie.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::user::UserID;

mod datetime_format {
    //! Serializes a [time::OffsetDateTime] with a fixed-width format.
    //!
    //! The default format prints midnight as "0:00:00.0", which does not parse
    //! back with a two digit hour.
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{
        OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
    };

    /// e.g. "2021-01-01 00:00:00.000000 +00:00:00".
    const DATE_TIME_FORMAT: &[BorrowedFormatItem] = format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond] [offset_hour \
             sign:mandatory]:[offset_minute]:[offset_second]"
    );

    pub fn serialize<S>(date_time: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = date_time
            .format(DATE_TIME_FORMAT)
            .map_err(serde::ser::Error::custom)?;

        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;

        OffsetDateTime::parse(&text, DATE_TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Identifies the logged in user and when their session lapses.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub user_id: UserID,

    #[serde(with = "datetime_format")]
    pub expires_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use time::{UtcOffset, macros::datetime};

    use crate::{auth::token::Token, user::UserID};

    #[test]
    fn token_survives_json_at_midnight() {
        let token = Token {
            user_id: UserID::new(7),
            expires_at: datetime!(2025-01-01 00:00:00).assume_offset(UtcOffset::UTC),
        };

        let json = serde_json::to_string(&token).unwrap();
        let parsed: Token = serde_json::from_str(&json).unwrap();

        assert_eq!(
            json,
            r#"{"user_id":7,"expires_at":"2025-01-01 00:00:00.0 +00:00:00"}"#
        );
        assert_eq!(parsed, token);
    }
}
