use rand::{distributions::Alphanumeric, Rng};
use uuid::Uuid;

/// Human-readable booking code, e.g. `PKY-3F0A1B2C3D-X7QZ`. The UUID stem
/// carries the uniqueness; the random suffix keeps codes hard to guess from
/// a known id.
pub fn generate() -> String {
    let stem = Uuid::new_v4().simple().to_string();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(char::from)
        .collect();
    format!(
        "PKY-{}-{}",
        stem[..10].to_uppercase(),
        suffix.to_uppercase()
    )
}
