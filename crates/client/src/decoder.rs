//! Decoders applied to the body of a successful response

use serde::de::DeserializeOwned;
use std::marker::PhantomData;

use crate::error::DecodeFailure;

/// Turns a 2xx response body into a value
pub trait ResponseDecoder {
    type Output;

    fn decode(self, body: &[u8]) -> Result<Self::Output, DecodeFailure>;
}

/// Deserializes the body as JSON into `T`
pub struct JsonDecoder<T>(PhantomData<fn() -> T>);

impl<T> JsonDecoder<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for JsonDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> ResponseDecoder for JsonDecoder<T> {
    type Output = T;

    fn decode(self, body: &[u8]) -> Result<T, DecodeFailure> {
        Ok(serde_json::from_slice(body)?)
    }
}

/// Skips decoding but still requires a non-empty body
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreResponse;

impl ResponseDecoder for IgnoreResponse {
    type Output = ();

    fn decode(self, body: &[u8]) -> Result<(), DecodeFailure> {
        if body.is_empty() {
            return Err(DecodeFailure::Empty);
        }
        Ok(())
    }
}

/// Accepts any body, including none; for `HEAD` requests
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardBody;

impl ResponseDecoder for DiscardBody {
    type Output = ();

    fn decode(self, _body: &[u8]) -> Result<(), DecodeFailure> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_json_decoder() {
        let value: Vec<u32> = JsonDecoder::new().decode(b"[1,2]").unwrap();
        assert_eq!(value, vec![1, 2]);
        assert!(JsonDecoder::<Vec<u32>>::new().decode(b"{").is_err());
    }

    #[test]
    fn test_ignore_response_rejects_empty_body() {
        assert!(IgnoreResponse.decode(b"{}").is_ok());
        assert!(matches!(
            IgnoreResponse.decode(b""),
            Err(DecodeFailure::Empty)
        ));
    }

    #[test]
    fn test_discard_body_accepts_empty() {
        assert!(DiscardBody.decode(b"").is_ok());
    }
}
