use serde::Serialize;

/// Envelope every list/detail payload ships in.
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}
