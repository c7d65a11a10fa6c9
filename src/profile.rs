//! Identity card profiles.
//!
//! Identity cards broadcast no sensor data; their address is looked up in an
//! allow-list to pick the label shown for the card holder.

use crate::mac_address::MacAddress;
use std::collections::BTreeMap;

/// Label used for identity cards whose address is not on the allow-list.
pub const DEFAULT_PROFILE_LABEL: &str = "MiroCard";

/// Address-to-label lookup table.
pub type ProfileMap = BTreeMap<MacAddress, String>;

const BUILTIN_PROFILES: &[(&str, [[u8; 6]; 3])] = &[
    (
        "Andres' MiroCard",
        [
            [0x18, 0x04, 0xED, 0x61, 0x66, 0x3D],
            [0x18, 0x04, 0xED, 0x61, 0x66, 0x51],
            [0x18, 0x04, 0xED, 0x61, 0x67, 0x6C],
        ],
    ),
    (
        "Kevin's MiroCard",
        [
            [0x18, 0x04, 0xED, 0x61, 0x67, 0x2B],
            [0x18, 0x04, 0xED, 0x61, 0x67, 0x0C],
            [0x18, 0x04, 0xED, 0x61, 0x66, 0x71],
        ],
    ),
];

/// A parsed `--profile` argument mapping an address to a label.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub address: MacAddress,
    pub label: String,
}

/// Parse a profile from a string in the format `MAC=LABEL`.
///
/// # Example
/// ```
/// use beacon_logger::profile::parse_profile;
///
/// let profile = parse_profile("18:04:ED:61:66:3D=Front desk").unwrap();
/// assert_eq!(profile.address.to_string(), "18:04:ED:61:66:3D");
/// assert_eq!(profile.label, "Front desk");
/// ```
pub fn parse_profile(src: &str) -> Result<Profile, String> {
    let (address, label) = src
        .split_once('=')
        .ok_or_else(|| "invalid profile: expected format MAC=LABEL".to_string())?;
    let address = address.parse::<MacAddress>().map_err(|e| e.to_string())?;
    if label.is_empty() {
        return Err("invalid profile: label must not be empty".into());
    }
    Ok(Profile {
        address,
        label: label.into(),
    })
}

/// The built-in allow-list of known identity cards.
pub fn builtin_profiles() -> ProfileMap {
    BUILTIN_PROFILES
        .iter()
        .flat_map(|(label, addresses)| {
            addresses
                .iter()
                .map(move |bytes| (MacAddress::from(*bytes), label.to_string()))
        })
        .collect()
}

/// Built-in profiles extended (and overridden) by user-supplied ones.
pub fn to_map(profiles: &[Profile]) -> ProfileMap {
    let mut map = builtin_profiles();
    map.extend(profiles.iter().map(|p| (p.address, p.label.clone())));
    map
}

/// Label for an identity card, falling back to [`DEFAULT_PROFILE_LABEL`].
pub fn resolve_label<'a>(address: &MacAddress, profiles: &'a ProfileMap) -> &'a str {
    profiles
        .get(address)
        .map_or(DEFAULT_PROFILE_LABEL, String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_profile_valid() {
        let profile = parse_profile("aa:bb:cc:dd:ee:ff=Living Room").unwrap();
        assert_eq!(
            profile.address,
            MacAddress([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF])
        );
        assert_eq!(profile.label, "Living Room");
    }

    #[test]
    fn test_parse_profile_invalid() {
        assert!(parse_profile("no-equals-sign").is_err());
        assert!(parse_profile("not-a-mac=Label").is_err());
        assert!(parse_profile("AA:BB:CC:DD:EE:FF=").is_err());
    }

    #[test]
    fn test_builtin_profiles_cover_known_cards() {
        let map = builtin_profiles();
        assert_eq!(map.len(), 6);
        let andres: MacAddress = "18:04:ed:61:66:3d".parse().unwrap();
        let kevin: MacAddress = "18:04:ED:61:67:0C".parse().unwrap();
        assert_eq!(resolve_label(&andres, &map), "Andres' MiroCard");
        assert_eq!(resolve_label(&kevin, &map), "Kevin's MiroCard");
    }

    #[test]
    fn test_resolve_label_falls_back_to_default() {
        let map = builtin_profiles();
        let unknown = MacAddress([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        assert_eq!(resolve_label(&unknown, &map), DEFAULT_PROFILE_LABEL);
    }

    #[test]
    fn test_to_map_user_profiles_override_builtins() {
        let andres: MacAddress = "18:04:ED:61:66:3D".parse().unwrap();
        let extra = MacAddress([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
        let map = to_map(&[
            Profile {
                address: andres,
                label: "Reception".into(),
            },
            Profile {
                address: extra,
                label: "Visitor".into(),
            },
        ]);
        assert_eq!(resolve_label(&andres, &map), "Reception");
        assert_eq!(resolve_label(&extra, &map), "Visitor");
        assert_eq!(map.len(), 7);
    }
}
