use std::fmt::Formatter;

use serde::de::{Error, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::TonAddress;

impl Serialize for TonAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.to_base64_url().as_str())
    }
}

struct TonAddressVisitor;

impl Visitor<'_> for TonAddressVisitor {
    type Value = TonAddress;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("a string representing TON address in Hex or Base64 format")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: Error,
    {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for TonAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(TonAddressVisitor)
    }
}

#[cfg(test)]
mod tests {
    use crate::TonAddress;

    #[test]
    fn serialization_works() -> anyhow::Result<()> {
        let expected = "\"EQDk2VTvn04SUKJrW7rXahzdF8_Qi6utb0wj43InCu9vdjrR\"";

        let res = "0:e4d954ef9f4e1250a26b5bbad76a1cdd17cfd08babad6f4c23e372270aef6f76"
            .parse::<TonAddress>()?;
        let serial = serde_json::to_string(&res)?;
        assert_eq!(serial.as_str(), expected);

        let deserial: TonAddress = serde_json::from_str(expected)?;
        assert_eq!(deserial, res);
        Ok(())
    }

    #[test]
    fn deserialization_rejects_garbage() {
        let deserial: serde_json::Result<TonAddress> = serde_json::from_str("\"124\"");
        assert!(deserial.is_err());
    }
}
