use crate::{ChannelId, Nonce};

macro_rules! impl_type_for_u64_newtype {
    ($type:ty) => {
        impl sqlx::Type<::sqlx::Sqlite> for $type {
            fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
                <i64 as sqlx::Type<sqlx::Sqlite>>::type_info()
            }
        }
    };
}

// SQLite integers are signed; values above i64::MAX are stored by their two's-complement bits
// and recovered unchanged on decode.
macro_rules! impl_encode_for_u64_newtype {
    ($type:ty) => {
        impl sqlx::Encode<'_, sqlx::Sqlite> for $type {
            fn encode_by_ref(
                &self,
                buf: &mut <sqlx::Sqlite as sqlx::database::HasArguments<'_>>::ArgumentBuffer,
            ) -> sqlx::encode::IsNull {
                let value = i64::from_ne_bytes(self.0.to_ne_bytes());
                <i64 as sqlx::Encode<'_, sqlx::Sqlite>>::encode_by_ref(&value, buf)
            }
        }
    };
}

macro_rules! impl_decode_for_u64_newtype {
    ($type:ty, $constructor:ident) => {
        impl sqlx::Decode<'_, sqlx::Sqlite> for $type {
            fn decode(
                value: sqlx::sqlite::SqliteValueRef<'_>,
            ) -> Result<Self, ::sqlx::error::BoxDynError> {
                if sqlx::ValueRef::is_null(&value) {
                    return Err(Box::new(sqlx::error::UnexpectedNullError));
                }

                let raw = <i64 as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
                let unsigned = u64::from_ne_bytes(raw.to_ne_bytes());
                Ok($constructor(unsigned))
            }
        }
    };
}

impl_type_for_u64_newtype!(ChannelId);
impl_encode_for_u64_newtype!(ChannelId);
impl_decode_for_u64_newtype!(ChannelId, ChannelId);

impl_type_for_u64_newtype!(Nonce);
impl_encode_for_u64_newtype!(Nonce);
impl_decode_for_u64_newtype!(Nonce, Nonce);
