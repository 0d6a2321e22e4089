//! Username and temporary password generation for imported students.

use learnhub_models::schools::username_prefix;
use rand::Rng;

/// Letters and digits minus `0 O 1 I l`, which are easily confused when
/// copied from a printed sheet.
pub const PASSWORD_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789";

pub const PASSWORD_LENGTH: usize = 8;

const NAME_SLUG_LEN: usize = 8;

/// A freshly generated login for one student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub temp_password: String,
}

fn slug(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Normalized class label, also used as the key of the ordinal counter.
pub fn class_key(class_name: &str) -> String {
    slug(class_name)
}

/// Builds `{school}_{class}_{name}_{ordinal:03}`.
///
/// ```
/// use learnhub::modules::imports::credentials::generate_username;
///
/// assert_eq!(
///     generate_username("SCH-DPS-01", "Class 5", "Aarav Patel", 7),
///     "dps01_class5_aaravpat_007"
/// );
/// ```
pub fn generate_username(
    school_code: &str,
    class_name: &str,
    student_name: &str,
    ordinal: u32,
) -> String {
    let name: String = slug(student_name).chars().take(NAME_SLUG_LEN).collect();
    format!(
        "{}_{}_{}_{:03}",
        username_prefix(school_code),
        class_key(class_name),
        name,
        ordinal
    )
}

pub fn generate_temp_password_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..PASSWORD_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..PASSWORD_ALPHABET.len());
            PASSWORD_ALPHABET[idx] as char
        })
        .collect()
}

pub fn generate_temp_password() -> String {
    generate_temp_password_with(&mut rand::thread_rng())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_username_shape() {
        assert_eq!(
            generate_username("SCH-GPS", "5", "Aarav Patel", 1),
            "gps_5_aaravpat_001"
        );
        assert_eq!(
            generate_username("SCHGPS", "5", "Aarav Patel", 1),
            "gps_5_aaravpat_001"
        );
        assert_eq!(
            generate_username("dps-north-2", "VII-B", "Ma Li", 12),
            "dpsnorth2_viib_mali_012"
        );
    }

    #[test]
    fn test_username_ordinal_beyond_padding() {
        assert_eq!(generate_username("SCH-A", "5", "Zoya", 1234), "a_5_zoya_1234");
    }

    #[test]
    fn test_username_drops_non_ascii() {
        assert_eq!(generate_username("SCH-A", "5", "José Núñez", 3), "a_5_josnez_003");
    }

    #[test]
    fn test_username_is_deterministic() {
        let a = generate_username("SCH-GPS", "5", "Aarav Patel", 4);
        let b = generate_username("SCH-GPS", "5", "Aarav Patel", 4);
        assert_eq!(a, b);
    }

    #[test]
    fn test_username_changes_with_each_argument() {
        let base = generate_username("SCH-GPS", "5", "Aarav Patel", 4);
        assert_ne!(base, generate_username("SCH-DPS", "5", "Aarav Patel", 4));
        assert_ne!(base, generate_username("SCH-GPS", "6", "Aarav Patel", 4));
        assert_ne!(base, generate_username("SCH-GPS", "5", "Diya Shah", 4));
        assert_ne!(base, generate_username("SCH-GPS", "5", "Aarav Patel", 5));
    }

    #[test]
    fn test_class_key() {
        assert_eq!(class_key(" Grade 5-A "), "grade5a");
    }

    #[test]
    fn test_alphabet_excludes_ambiguous_characters() {
        for ambiguous in [b'0', b'O', b'1', b'I', b'l'] {
            assert!(!PASSWORD_ALPHABET.contains(&ambiguous));
        }
        assert_eq!(PASSWORD_ALPHABET.len(), 57);
    }

    #[test]
    fn test_password_length_and_alphabet() {
        for _ in 0..200 {
            let password = generate_temp_password();
            assert_eq!(password.len(), PASSWORD_LENGTH);
            assert!(password.bytes().all(|b| PASSWORD_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_seeded_password_is_reproducible() {
        let a = generate_temp_password_with(&mut StdRng::seed_from_u64(42));
        let b = generate_temp_password_with(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
