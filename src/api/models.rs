use serde::Serialize;

/// Response for POST /info
#[derive(Serialize)]
pub struct InfoAck {
    pub status: &'static str,
}
