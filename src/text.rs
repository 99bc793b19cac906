//! Normalisation of text received from the device.

/// Degree sign as sent by the firmware (Latin-1).
const DEGREE_SIGN: u8 = 0xB0;

/// Turn raw device bytes into plain ASCII text.
///
/// The degree sign becomes `&deg`; every other non-ASCII byte is dropped, so
/// the result can always be embedded in JSON.
pub fn sanitize_device_text(raw: &[u8]) -> String {
    let mut out = String::with_capacity(raw.len());
    for &byte in raw {
        match byte {
            DEGREE_SIGN => out.push_str("&deg"),
            b if b.is_ascii() => out.push(char::from(b)),
            _ => {}
        }
    }
    out
}
