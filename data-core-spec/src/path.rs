/*!
Storage path construction (invariant 4): a globally unique path for
every successful write, carrying a 24-bit random suffix so that two
concurrent writers racing on the same prior version land on distinct
physical files.
*/

use rand::RngCore;
use uuid::Uuid;

/// Draw a fresh 6-hex-digit, lower-case suffix from a uniform 24-bit space.
pub fn random_suffix() -> String {
    let mut bytes = [0u8; 3];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{:02x}{:02x}{:02x}", bytes[0], bytes[1], bytes[2])
}

/// `<type>/<object_id>/version-<v>-x<6-hex-random>/<name>`
pub fn file_storage_path(object_type: &str, object_id: &Uuid, version: u64, name: &str) -> String {
    format!(
        "{object_type}/{object_id}/version-{version}-x{}/{name}",
        random_suffix()
    )
}

/// `data/<type>/<object_id>/<part_key>/snap-<s>/delta-<d>-x<6-hex-random>[.<ext>]`
pub fn data_storage_path(
    object_type: &str,
    object_id: &Uuid,
    part_key: &str,
    snap_index: u64,
    delta_index: u64,
    extension: Option<&str>,
) -> String {
    let suffix = random_suffix();
    match extension {
        Some(ext) => format!(
            "data/{object_type}/{object_id}/{part_key}/snap-{snap_index}/delta-{delta_index}-x{suffix}.{ext}"
        ),
        None => format!(
            "data/{object_type}/{object_id}/{part_key}/snap-{snap_index}/delta-{delta_index}-x{suffix}"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_path_matches_template() {
        let id = Uuid::nil();
        let path = file_storage_path("FILE", &id, 1, "a.txt");
        let re_prefix = format!("FILE/{id}/version-1-x");
        assert!(path.starts_with(&re_prefix), "{path}");
        assert!(path.ends_with("/a.txt"));
        let suffix = &path[re_prefix.len()..path.len() - "/a.txt".len()];
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn data_path_matches_template_with_extension() {
        let id = Uuid::nil();
        let path = data_storage_path("DATA", &id, "p0", 1, 0, Some("json"));
        assert!(path.starts_with(&format!("data/DATA/{id}/p0/snap-1/delta-0-x")));
        assert!(path.ends_with(".json"));
    }

    #[test]
    fn data_path_matches_template_without_extension() {
        let id = Uuid::nil();
        let path = data_storage_path("DATA", &id, "p0", 1, 0, None);
        assert!(!path.contains('.'));
    }

    #[test]
    fn suffix_is_well_formed_hex() {
        for _ in 0..100 {
            let suffix = random_suffix();
            assert_eq!(suffix.len(), 6);
            assert!(u32::from_str_radix(&suffix, 16).is_ok());
        }
    }
}
