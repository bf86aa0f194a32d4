use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of the token naming each job directory.
pub const JOB_ID_LENGTH: usize = 10;

/// Random alphanumeric token of exactly `length` characters.
///
/// Characters are drawn uniformly, with replacement, from `[0-9a-zA-Z]`.
/// Nothing here guarantees uniqueness; the job workspace retries on an
/// existing directory instead.
pub fn generate(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

pub fn job_id() -> String {
    generate(JOB_ID_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_length_and_alphabet() {
        for length in [0, 1, 10, 64] {
            let id = generate(length);
            assert_eq!(id.len(), length);
            assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn test_job_ids_differ() {
        assert_ne!(job_id(), job_id());
    }
}
