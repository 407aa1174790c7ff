use uuid::Uuid;

const MEET_BASE_URL: &str = "https://meet.google.com";

/// Google-Meet style room link: `https://meet.google.com/abc-defg-hij`.
///
/// Only the shape matches a real Meet room; nothing is created on Google's side.
pub fn generate_meet_link() -> String {
    let bytes = Uuid::new_v4().into_bytes();
    let letters: String = bytes
        .iter()
        .take(10)
        .map(|b| char::from(b'a' + b % 26))
        .collect();

    format!(
        "{}/{}-{}-{}",
        MEET_BASE_URL,
        &letters[0..3],
        &letters[3..7],
        &letters[7..10]
    )
}
