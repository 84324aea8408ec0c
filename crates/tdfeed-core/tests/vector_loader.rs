//! JSON test vector loader shared by batch/decode tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::fs;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TestVector {
    pub description: String,
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
    #[serde(default)]
    pub payload_raw: Option<String>,
    #[serde(default)]
    pub expect_lines: Option<Vec<String>>,
    #[serde(default)]
    pub expect_failures: Vec<ExpectFailure>,
    #[serde(default)]
    pub expect_error: Option<ExpectError>,
}

#[derive(Debug, Deserialize)]
pub struct ExpectError {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct ExpectFailure {
    pub index: usize,
    pub code: String,
}

impl TestVector {
    /// Payload bytes as the transport would hand them over.
    pub fn payload_bytes(&self) -> Vec<u8> {
        match (&self.payload, &self.payload_raw) {
            (Some(v), None) => serde_json::to_vec(v).unwrap(),
            (None, Some(raw)) => raw.as_bytes().to_vec(),
            _ => panic!("vector needs exactly one of payload / payload_raw: {}", self.description),
        }
    }
}

pub fn load(name: &str) -> TestVector {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}
