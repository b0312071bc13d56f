// Unit tests for the PCM framing codec and its base64 wire transform.

use aetheris_voice::audio::codec;
use aetheris_voice::SessionError;

#[test]
fn test_round_trip_within_quantization_error() {
    let samples = vec![0.0, 0.25, -0.25, 0.5, -0.5, 0.99, -0.99, 1.0, -1.0];

    let decoded = codec::decode(&codec::encode(&samples)).unwrap();

    assert_eq!(decoded.len(), samples.len());
    for (original, restored) in samples.iter().zip(decoded.iter()) {
        assert!(
            (original - restored).abs() <= 1.0 / 32768.0,
            "Sample {} decoded as {} (error > 1/32768)",
            original,
            restored
        );
    }
}

#[test]
fn test_encode_clamps_out_of_range_input() {
    let bytes = codec::encode(&[2.0, -2.0]);

    assert_eq!(bytes.len(), 4);
    assert_eq!(i16::from_le_bytes([bytes[0], bytes[1]]), 32767);
    assert_eq!(i16::from_le_bytes([bytes[2], bytes[3]]), -32767);
}

#[test]
fn test_encode_is_little_endian() {
    // 0.5 * 32767 rounds to 16384 (0x4000)
    let bytes = codec::encode(&[0.5]);
    assert_eq!(bytes, vec![0x00, 0x40]);
}

#[test]
fn test_decode_rejects_odd_byte_length() {
    let result = codec::decode(&[0x00, 0x01, 0x02]);

    assert!(matches!(result, Err(SessionError::MalformedPayload(_))));
}

#[test]
fn test_decode_empty_is_empty() {
    assert!(codec::decode(&[]).unwrap().is_empty());
}

#[test]
fn test_decode_range() {
    // i16::MIN maps to exactly -1.0, i16::MAX to just under 1.0
    let bytes = [
        i16::MIN.to_le_bytes(),
        i16::MAX.to_le_bytes(),
        0i16.to_le_bytes(),
    ]
    .concat();

    let samples = codec::decode(&bytes).unwrap();

    assert_eq!(samples[0], -1.0);
    assert!((samples[1] - 32767.0 / 32768.0).abs() < f32::EPSILON);
    assert_eq!(samples[2], 0.0);
}

#[test]
fn test_base64_wire_round_trip() {
    let samples = vec![0.1, -0.2, 0.3, -0.4];

    let wire = codec::encode_base64(&samples);
    let decoded = codec::decode_base64(&wire).unwrap();

    assert_eq!(decoded.len(), samples.len());
    for (original, restored) in samples.iter().zip(decoded.iter()) {
        assert!((original - restored).abs() <= 1.0 / 32768.0);
    }
}

#[test]
fn test_base64_invalid_payload_is_malformed() {
    let result = codec::decode_base64("!!! not base64 !!!");

    assert!(matches!(result, Err(SessionError::MalformedPayload(_))));
}

#[test]
fn test_base64_odd_pcm_length_is_malformed() {
    use base64::Engine;
    let wire = base64::engine::general_purpose::STANDARD.encode([0u8, 1, 2]);

    let result = codec::decode_base64(&wire);

    assert!(matches!(result, Err(SessionError::MalformedPayload(_))));
}
