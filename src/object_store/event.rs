//! Object-created notifications as delivered by S3.
//!
//! Only the fields the importer reads are modelled. Unknown fields are
//! ignored, so the full AWS payload deserializes unchanged.

use serde::Deserialize;

/// Notification listing one or more created objects.
///
/// S3's `s3:TestEvent` carries no `Records`; it deserializes to an empty
/// event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObjectCreatedEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3EventRecord {
    #[serde(rename = "eventName", default)]
    pub event_name: Option<String>,
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    pub bucket: BucketRef,
    pub object: ObjectRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BucketRef {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectRef {
    /// URL-encoded key, `+` standing in for spaces.
    pub key: String,
    #[serde(default)]
    pub size: Option<u64>,
}

impl ObjectRef {
    /// The key as stored. Falls back to the raw value when it isn't valid
    /// percent-encoding.
    pub fn decoded_key(&self) -> String {
        let spaced = self.key.replace('+', " ");
        match urlencoding::decode(&spaced) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => self.key.clone(),
        }
    }
}

impl ObjectCreatedEvent {
    /// Build an event for the given bucket and keys (keys are encoded the way
    /// S3 encodes them).
    pub fn for_objects<'a>(bucket: &str, keys: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            records: keys
                .into_iter()
                .map(|key| S3EventRecord {
                    event_name: Some("ObjectCreated:Put".to_string()),
                    s3: S3Entity {
                        bucket: BucketRef {
                            name: bucket.to_string(),
                        },
                        object: ObjectRef {
                            key: encode_key(key),
                            size: None,
                        },
                    },
                })
                .collect(),
        }
    }
}

fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| {
            segment
                .split(' ')
                .map(|part| urlencoding::encode(part).into_owned())
                .collect::<Vec<_>>()
                .join("+")
        })
        .collect::<Vec<_>>()
        .join("/")
}
