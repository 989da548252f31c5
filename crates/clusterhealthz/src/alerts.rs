//! Decoding of the Prometheus `ALERTS` query response.
//!
//! Expected shape:
//!
//! ```text
//! { "status": "success",
//!   "data": { "result": [ { "metric": { "alertname": "...", ... }, "value": [..] } ] } }
//! ```
//!
//! An empty `result` list decodes to an empty `Vec`, which is distinct from a
//! [`DecodeError`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// A currently firing alert
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FiringAlert {
    /// Alert name (the `alertname` label)
    pub name: String,
    /// Every other label, passed through unexamined
    pub labels: BTreeMap<String, serde_json::Value>,
    /// Sample value as returned by Prometheus
    pub value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    status: Option<String>,
    data: Option<QueryData>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    result: Vec<QuerySample>,
}

#[derive(Debug, Deserialize)]
struct QuerySample {
    metric: AlertLabels,
    #[serde(default)]
    value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AlertLabels {
    alertname: String,
    #[serde(flatten)]
    rest: BTreeMap<String, serde_json::Value>,
}

/// Decode a raw feed body into firing alerts, in feed order.
pub fn parse(raw: &str) -> Result<Vec<FiringAlert>, DecodeError> {
    let response: QueryResponse = serde_json::from_str(raw)?;

    if let Some(status) = response.status {
        if status != "success" {
            return Err(DecodeError::QueryFailed(status));
        }
    }

    let data = response
        .data
        .ok_or_else(|| <serde_json::Error as serde::de::Error>::missing_field("data"))?;

    Ok(data
        .result
        .into_iter()
        .map(|sample| FiringAlert {
            name: sample.metric.alertname,
            labels: sample.metric.rest,
            value: sample.value,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_ALERTS: &str = r#"{"status":"success","data":{"resultType":"vector","result":[]}}"#;

    const NON_IMPACTING: &str = r#"{"status":"success","data":{"resultType":"vector","result":[
        {"metric":{"__name__":"ALERTS","alertname":"ExampleAlertAlwaysFiring","alertstate":"firing","job":"alertmanager"},"value":[1506422656.757,"1"]},
        {"metric":{"__name__":"ALERTS","alertname":"ExampleAlertAlwaysFiring","alertstate":"firing","job":"node"},"value":[1506422656.757,"1"]}
    ]}}"#;

    #[test]
    fn test_parse_firing_alerts() {
        let alerts = parse(NON_IMPACTING).unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].name, "ExampleAlertAlwaysFiring");
        assert_eq!(alerts[0].labels["job"], "alertmanager");
        assert_eq!(alerts[1].labels["job"], "node");
        assert!(!alerts[0].labels.contains_key("alertname"));
        assert_eq!(alerts[0].value[1], "1");
    }

    #[test]
    fn test_parse_empty_result_is_not_an_error() {
        let alerts = parse(NO_ALERTS).unwrap();
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_parse_non_json() {
        let err = parse("narp").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn test_parse_missing_data() {
        let err = parse(r#"{"status":"success"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn test_parse_missing_alertname() {
        let raw = r#"{"data":{"result":[{"metric":{"job":"node"},"value":[1,"1"]}]}}"#;
        let err = parse(raw).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn test_parse_result_not_a_list() {
        let raw = r#"{"status":"success","data":{"result":{"metric":{}}}}"#;
        assert!(parse(raw).is_err());
    }

    #[test]
    fn test_parse_failed_query() {
        let raw = r#"{"status":"error","errorType":"bad_data","error":"parse error"}"#;
        let err = parse(raw).unwrap_err();
        assert!(matches!(err, DecodeError::QueryFailed(ref s) if s == "error"));
    }
}
