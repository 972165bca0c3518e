use std::str::FromStr;

use serde::de;
use serde::{Deserialize, Serialize};

use crate::sig::{RecoverableSig, SIGNATURE_LEN};

impl Serialize for RecoverableSig {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        if s.is_human_readable() {
            s.serialize_str(&self.to_string())
        } else {
            s.serialize_bytes(self.as_bytes())
        }
    }
}

impl<'de> Deserialize<'de> for RecoverableSig {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        if d.is_human_readable() {
            struct StrVisitor;

            impl de::Visitor<'_> for StrVisitor {
                type Value = RecoverableSig;

                fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "a {}-character hex string", SIGNATURE_LEN * 2)
                }

                fn visit_str<E: de::Error>(self, v: &str) -> Result<RecoverableSig, E> {
                    RecoverableSig::from_str(v).map_err(E::custom)
                }
            }

            d.deserialize_str(StrVisitor)
        } else {
            struct BytesVisitor;

            impl<'de> de::Visitor<'de> for BytesVisitor {
                type Value = RecoverableSig;

                fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{SIGNATURE_LEN} bytes")
                }

                fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<RecoverableSig, E> {
                    let bytes: [u8; SIGNATURE_LEN] = v
                        .try_into()
                        .map_err(|_| E::invalid_length(v.len(), &self))?;
                    Ok(RecoverableSig::from_byte_array(bytes))
                }
            }

            d.deserialize_bytes(BytesVisitor)
        }
    }
}
