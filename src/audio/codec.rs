use crate::error::SessionError;
use base64::Engine;

/// Encode f32 samples in [-1.0, 1.0] as little-endian 16-bit PCM.
///
/// Out-of-range input is clamped, not rejected.
pub fn encode(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16;
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decode little-endian 16-bit PCM bytes back to f32 samples.
pub fn decode(bytes: &[u8]) -> Result<Vec<f32>, SessionError> {
    if bytes.len() % 2 != 0 {
        return Err(SessionError::MalformedPayload(format!(
            "PCM byte length {} is not a multiple of 2",
            bytes.len()
        )));
    }

    let samples = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect();

    Ok(samples)
}

/// Encode samples to the base64 PCM form used on the wire.
pub fn encode_base64(samples: &[f32]) -> String {
    base64::engine::general_purpose::STANDARD.encode(encode(samples))
}

/// Decode a base64 PCM wire payload to samples.
pub fn decode_base64(data: &str) -> Result<Vec<f32>, SessionError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| SessionError::MalformedPayload(format!("invalid base64 payload: {}", e)))?;

    decode(&bytes)
}
