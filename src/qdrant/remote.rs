//! Qdrant server backend
//!
//! Talks to Qdrant over gRPC through `qdrant-client`. Payloads are converted
//! between `serde_json` and Qdrant's protobuf values by hand so the mapping is
//! explicit and lossless for everything JSON can express.

use async_trait::async_trait;
use qdrant_client::qdrant::{
    value::Kind, CreateCollectionBuilder, Distance, ListValue, PointStruct, SearchPointsBuilder,
    Struct, UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder, VectorsConfigBuilder,
};
use qdrant_client::{Qdrant, QdrantError};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use tonic::{Code, Status};
use tracing::debug;

use super::backend::{BackendError, PointRecord, ScoredRecord, VectorBackend};

/// Backend connected to a Qdrant server
pub struct QdrantBackend {
    client: Qdrant,
}

impl QdrantBackend {
    /// Build the client handle. No request is made until the first operation.
    pub fn connect(url: &str, api_key: Option<&SecretString>) -> Result<Self, BackendError> {
        debug!("Connecting to Qdrant at {}", url);

        let client = Qdrant::from_url(url)
            .api_key(api_key.map(|k| k.expose_secret().to_string()))
            .build()
            .map_err(|e| BackendError::Connection(format!("Failed to create Qdrant client: {}", e)))?;

        Ok(QdrantBackend { client })
    }
}

#[async_trait]
impl VectorBackend for QdrantBackend {
    async fn collection_exists(&self, name: &str) -> Result<bool, BackendError> {
        self.client.collection_exists(name).await.map_err(classify)
    }

    async fn create_collection(
        &self,
        name: &str,
        vector_name: &str,
        size: usize,
    ) -> Result<(), BackendError> {
        let mut vectors = VectorsConfigBuilder::default();
        vectors.add_named_vector_params(
            vector_name,
            VectorParamsBuilder::new(size as u64, Distance::Cosine),
        );

        self.client
            .create_collection(CreateCollectionBuilder::new(name).vectors_config(vectors))
            .await
            .map_err(classify)?;

        Ok(())
    }

    async fn upsert(&self, collection: &str, point: PointRecord) -> Result<(), BackendError> {
        let vectors: HashMap<String, Vec<f32>> =
            [(point.vector_name, point.vector)].into_iter().collect();
        let payload: HashMap<String, QdrantValue> = point
            .payload
            .into_iter()
            .map(|(k, v)| (k, json_to_qdrant(v)))
            .collect();

        let point = PointStruct::new(point.id.to_string(), vectors, payload);

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, vec![point]).wait(true))
            .await
            .map_err(classify)?;

        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector_name: &str,
        vector: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<ScoredRecord>, BackendError> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(collection, vector, limit as u64)
                    .vector_name(vector_name)
                    .with_payload(true),
            )
            .await
            .map_err(classify)?;

        Ok(response
            .result
            .into_iter()
            .map(|point| ScoredRecord {
                score: point.score,
                payload: point
                    .payload
                    .into_iter()
                    .map(|(k, v)| (k, qdrant_to_json(v)))
                    .collect(),
            })
            .collect())
    }
}

/// Sort a client error into the connector's categories by its gRPC status
fn classify(err: QdrantError) -> BackendError {
    match err {
        QdrantError::ResponseError { status }
        | QdrantError::ResourceExhaustedError { status, .. } => classify_status(&status),
        QdrantError::Io(e) => BackendError::Connection(e.to_string()),
        QdrantError::InvalidUri(e) => BackendError::Connection(format!("Invalid URI: {}", e)),
        other => BackendError::Rejected(other.to_string()),
    }
}

fn classify_status(status: &Status) -> BackendError {
    let message = format!("{}: {}", status.code().description(), status.message());

    match status.code() {
        Code::AlreadyExists => BackendError::AlreadyExists(message),
        Code::NotFound => BackendError::NotFound(message),
        Code::Unauthenticated | Code::Unavailable | Code::DeadlineExceeded | Code::Cancelled => {
            BackendError::Connection(message)
        }
        // The channel pool reports failed dials and broken transports this way
        Code::Internal | Code::Unknown if is_transport_failure(status.message()) => {
            BackendError::Connection(message)
        }
        _ => BackendError::Rejected(message),
    }
}

fn is_transport_failure(message: &str) -> bool {
    let lower = message.to_lowercase();
    ["failed to connect", "transport error", "connection refused"]
        .iter()
        .any(|needle| lower.contains(needle))
}

pub(crate) fn json_to_qdrant(value: Value) -> QdrantValue {
    let kind = match value {
        Value::Null => Kind::NullValue(0),
        Value::Bool(b) => Kind::BoolValue(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Kind::IntegerValue(i),
            None => Kind::DoubleValue(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => Kind::StringValue(s),
        Value::Array(items) => Kind::ListValue(ListValue {
            values: items.into_iter().map(json_to_qdrant).collect(),
        }),
        Value::Object(map) => Kind::StructValue(Struct {
            fields: map.into_iter().map(|(k, v)| (k, json_to_qdrant(v))).collect(),
        }),
    };
    QdrantValue { kind: Some(kind) }
}

pub(crate) fn qdrant_to_json(value: QdrantValue) -> Value {
    match value.kind {
        None | Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::Number(i.into()),
        Some(Kind::DoubleValue(d)) => Number::from_f64(d).map(Value::Number).unwrap_or(Value::Null),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::ListValue(list)) => {
            Value::Array(list.values.into_iter().map(qdrant_to_json).collect())
        }
        Some(Kind::StructValue(st)) => Value::Object(
            st.fields
                .into_iter()
                .map(|(k, v)| (k, qdrant_to_json(v)))
                .collect::<Map<String, Value>>(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_metadata_survives_conversion() {
        let original = json!({
            "language": "python",
            "stars": 42,
            "ratio": 0.25,
            "tags": ["io", "files"],
            "author": { "name": "ada", "verified": true },
            "deprecated": null
        });

        assert_eq!(qdrant_to_json(json_to_qdrant(original.clone())), original);
    }

    fn response(status: Status) -> QdrantError {
        QdrantError::from(status)
    }

    #[test]
    fn test_classify_server_statuses() {
        assert!(matches!(
            classify(response(Status::new(
                Code::AlreadyExists,
                "Wrong input: Collection `notes` already exists!"
            ))),
            BackendError::AlreadyExists(_)
        ));
        assert!(matches!(
            classify(response(Status::not_found("Collection `notes` doesn't exist!"))),
            BackendError::NotFound(_)
        ));
        assert!(matches!(
            classify(response(Status::permission_denied("read-only key"))),
            BackendError::Rejected(_)
        ));
        assert!(matches!(
            classify(response(Status::invalid_argument("Wrong input: Vector dimension error"))),
            BackendError::Rejected(_)
        ));
    }

    #[test]
    fn test_missing_api_key_is_connection_failure() {
        let err = classify(response(Status::unauthenticated(
            "Must provide an API key or an Authorization bearer token",
        )));
        match err {
            BackendError::Connection(message) => {
                assert!(message.contains("Must provide an API key"));
            }
            other => panic!("expected a connection failure, got {:?}", other),
        }
    }

    #[test]
    fn test_unreachable_server_is_connection_failure() {
        assert!(matches!(
            classify(response(Status::unavailable("tcp connect error"))),
            BackendError::Connection(_)
        ));
        assert!(matches!(
            classify(response(Status::deadline_exceeded("Timeout expired"))),
            BackendError::Connection(_)
        ));
        assert!(matches!(
            classify(response(Status::internal(
                "Failed to connect to http://localhost:6334/: tonic::transport::Error(Transport, ConnectError)"
            ))),
            BackendError::Connection(_)
        ));
        assert!(matches!(
            classify(response(Status::internal("Service internal error: disk full"))),
            BackendError::Rejected(_)
        ));
    }

    #[test]
    fn test_non_status_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        assert!(matches!(classify(QdrantError::Io(io)), BackendError::Connection(_)));
        assert!(matches!(
            classify(QdrantError::ConversionError("sparse into dense".into())),
            BackendError::Rejected(_)
        ));
    }

    #[test]
    fn test_connect_builds_lazily() {
        // No server is contacted while building the handle
        assert!(QdrantBackend::connect("http://localhost:6334", None).is_ok());
    }

    // Requires a running Qdrant instance; run with `--ignored`
    #[tokio::test]
    #[ignore]
    async fn test_store_and_search_against_server() {
        let backend = QdrantBackend::connect("http://localhost:6334", None).unwrap();
        let collection = format!("test-{}", uuid::Uuid::new_v4());

        backend.create_collection(&collection, "v", 4).await.unwrap();
        assert!(backend.collection_exists(&collection).await.unwrap());

        let mut payload = Map::new();
        payload.insert("document".into(), json!("hello"));
        backend
            .upsert(
                &collection,
                PointRecord {
                    id: uuid::Uuid::new_v4(),
                    vector_name: "v".into(),
                    vector: vec![0.1, 0.2, 0.3, 0.4],
                    payload,
                },
            )
            .await
            .unwrap();

        let hits = backend
            .search(&collection, "v", vec![0.1, 0.2, 0.3, 0.4], 5)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].payload["document"], "hello");
    }
}
