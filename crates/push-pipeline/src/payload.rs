//! Raw payload model and normalization into [`CanonicalNotification`].
//!
//! Three wire shapes are accepted: a cloud-messaging `data` block, an
//! OS-native `aps.alert` block, and a flat key/value payload.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

pub const DATA_KEY: &str = "data";
pub const APS_KEY: &str = "aps";
pub const ALERT_KEY: &str = "alert";
pub const TYPE_KEY: &str = "type";
pub const MESSAGE_ID_KEY: &str = "gcm.message_id";
pub const USER_INTERACTION_KEY: &str = "wasUserInteraction";

const ALERT_FIELDS: [&str; 2] = ["title", "body"];

/// A payload as handed over by the OS or the messaging SDK.
///
/// Keys are kept as JSON values because the SDK does not guarantee string
/// keys. Entry order is preserved; a later entry shadows an earlier one with
/// the same key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawNotification {
    entries: Vec<(Value, Value)>,
}

impl RawNotification {
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Look up a string key. The last matching entry wins.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Provider-assigned delivery identifier, if the payload carries one.
    pub fn delivery_id(&self) -> Option<&str> {
        self.get(MESSAGE_ID_KEY)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }
}

impl From<Map<String, Value>> for RawNotification {
    fn from(map: Map<String, Value>) -> Self {
        Self::from_entries(map.into_iter().map(|(k, v)| (Value::String(k), v)))
    }
}

impl Serialize for RawNotification {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(&coerce_key(key), value)?;
        }
        map.end()
    }
}

/// Non-string keys collapse onto the empty key.
fn coerce_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => {
            tracing::debug!(key = %other, "Non-string payload key coerced to empty key");
            String::new()
        }
    }
}

/// Wire shape of a [`RawNotification`], in priority order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PayloadShape<'a> {
    CloudData(&'a Map<String, Value>),
    NativeAlert(&'a Map<String, Value>),
    Flat,
}

impl<'a> PayloadShape<'a> {
    pub fn detect(raw: &'a RawNotification) -> Self {
        if let Some(Value::Object(data)) = raw.get(DATA_KEY) {
            return Self::CloudData(data);
        }
        if let Some(Value::Object(alert)) = raw.get(APS_KEY).and_then(|aps| aps.get(ALERT_KEY)) {
            return Self::NativeAlert(alert);
        }
        Self::Flat
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::CloudData(_) => "cloud_data",
            Self::NativeAlert(_) => "native_alert",
            Self::Flat => "flat",
        }
    }
}

/// The single normalized form handed to the application layer.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalNotification {
    fields: Map<String, Value>,
    was_user_interaction: bool,
}

impl CanonicalNotification {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn notification_type(&self) -> Option<&Value> {
        self.fields.get(TYPE_KEY)
    }

    pub fn was_user_interaction(&self) -> bool {
        self.was_user_interaction
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Flat JSON object including `wasUserInteraction`.
    pub fn to_value(&self) -> Value {
        let mut map = self.fields.clone();
        map.insert(
            USER_INTERACTION_KEY.to_string(),
            Value::Bool(self.was_user_interaction),
        );
        Value::Object(map)
    }
}

impl Serialize for CanonicalNotification {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry(USER_INTERACTION_KEY, &self.was_user_interaction)?;
        map.end()
    }
}

/// Convert a raw payload into its canonical form.
pub fn normalize(raw: &RawNotification, was_user_interaction: bool) -> CanonicalNotification {
    let shape = PayloadShape::detect(raw);
    let mut fields = Map::new();

    match shape {
        PayloadShape::CloudData(data) => {
            for (key, value) in data {
                fields.insert(key.clone(), value.clone());
            }
            if let Some(kind) = data.get(TYPE_KEY) {
                fields.insert(TYPE_KEY.to_string(), kind.clone());
            }
        }
        PayloadShape::NativeAlert(alert) => {
            for key in ALERT_FIELDS {
                if let Some(value) = alert.get(key) {
                    fields.insert(key.to_string(), value.clone());
                }
            }
            copy_top_level(raw, &mut fields, Some(APS_KEY));
        }
        PayloadShape::Flat => copy_top_level(raw, &mut fields, None),
    }

    // The caller's flag is authoritative.
    fields.remove(USER_INTERACTION_KEY);

    tracing::debug!(
        shape = shape.kind(),
        fields = fields.len(),
        was_user_interaction,
        "Notification normalized"
    );

    CanonicalNotification {
        fields,
        was_user_interaction,
    }
}

/// Copy every top-level entry except `skip`, then pin `type` to the
/// top-level value so that coerced-key collisions cannot displace it.
fn copy_top_level(raw: &RawNotification, fields: &mut Map<String, Value>, skip: Option<&str>) {
    for (key, value) in raw.entries() {
        if skip.is_some() && key.as_str() == skip {
            continue;
        }
        fields.insert(coerce_key(key), value.clone());
    }
    if let Some(kind) = raw.get(TYPE_KEY) {
        fields.insert(TYPE_KEY.to_string(), kind.clone());
    }
}
